//! Human-readable label and speech reports.
//!
//! Both functions are pure; the caller decides where the lines go.

use std::cmp::Ordering;

use tracing::warn;
use vidsight_models::{LabelAnnotation, VideoAnnotationResults};

const REPORT_WIDTH: usize = 80;

/// Ranked label report.
///
/// Labels are ordered by the confidence of their *first* segment, highest
/// first; ties keep service order. Each segment gets its own line.
pub fn format_labels(results: &VideoAnnotationResults) -> Vec<String> {
    let labels = sorted_by_first_segment_confidence(&results.segment_label_annotations);

    let mut lines = Vec::with_capacity(labels.len() + 1);
    lines.push(center(
        &format!(" Video labels: {} ", labels.len()),
        REPORT_WIDTH,
        '-',
    ));

    for label in labels {
        let categories = categories_suffix(label);
        for segment in &label.segments {
            lines.push(format!(
                "{} | {:7.3} | {:7.3} | {}{}",
                percent(segment.confidence),
                segment.segment.start_time_offset,
                segment.segment.end_time_offset,
                label.entity.description,
                categories
            ));
        }
    }

    lines
}

/// Speech report: transcriptions whose top alternative reaches
/// `min_confidence` (inclusive).
pub fn format_speech(results: &VideoAnnotationResults, min_confidence: f64) -> Vec<String> {
    let kept: Vec<_> = results
        .speech_transcriptions
        .iter()
        .filter_map(|t| match t.top_alternative() {
            Some(alt) => Some(alt),
            None => {
                warn!("Skipping transcription without alternatives");
                None
            }
        })
        .filter(|alt| min_confidence <= alt.confidence)
        .collect();

    let mut lines = Vec::with_capacity(kept.len() + 1);
    lines.push(center(
        &format!(" Speech transcriptions: {} ", kept.len()),
        REPORT_WIDTH,
        '-',
    ));

    for alt in kept {
        lines.push(format!(" {} | {}", percent(alt.confidence), alt.transcript.trim()));
    }

    lines
}

/// Stable sort, labels without segments last.
fn sorted_by_first_segment_confidence(labels: &[LabelAnnotation]) -> Vec<&LabelAnnotation> {
    let mut sorted: Vec<&LabelAnnotation> = labels.iter().collect();
    sorted.sort_by(|a, b| {
        match (a.first_segment_confidence(), b.first_segment_confidence()) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    sorted
}

/// ` (A, B)` or empty.
fn categories_suffix(label: &LabelAnnotation) -> String {
    if label.category_entities.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = label
        .category_entities
        .iter()
        .map(|e| e.description.as_str())
        .collect();
    format!(" ({})", names.join(", "))
}

/// Confidence as a whole percentage, right-aligned to 4 columns.
fn percent(confidence: f64) -> String {
    format!("{:>4}", format!("{:.0}%", confidence * 100.0))
}

/// Center `text` in `width` columns; odd padding goes left when `width` is odd.
fn center(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    let right = margin - left;

    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(text);
    out.extend(std::iter::repeat(fill).take(right));
    out
}
