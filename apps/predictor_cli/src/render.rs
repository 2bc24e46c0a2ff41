//! Plain-text rendering of the session for the terminal.

use std::fmt::Write as _;

use client_core::{
    chart::{selected_segment, total_percent},
    ChartSegment, SessionState,
};

const BAR_WIDTH: usize = 40;

pub fn render_state(state: &SessionState) -> String {
    match state {
        SessionState::Idle => "Enter song lyrics to predict their genre.".to_string(),
        SessionState::Submitting => "Analyzing...".to_string(),
        SessionState::Succeeded { genre, segments } => render_prediction(genre, segments),
        SessionState::Failed { message } => format!("Prediction failed: {message}"),
    }
}

fn render_prediction(genre: &str, segments: &[ChartSegment]) -> String {
    let mut out = format!("Predicted genre: {genre}\n");
    if segments.is_empty() {
        out.push_str("(the service returned no probabilities)");
        return out;
    }

    let total = total_percent(segments);
    let selected = selected_segment(segments, genre).map(|segment| segment.label.as_str());
    let label_width = segments
        .iter()
        .map(|segment| segment.label.chars().count())
        .max()
        .unwrap_or(0);

    for segment in segments {
        let marker = if Some(segment.label.as_str()) == selected {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {label:<label_width$}  {color}  {tooltip:>7}  {bar:<BAR_WIDTH$}  {slice}",
            label = segment.label,
            color = segment.color,
            tooltip = segment.tooltip(),
            bar = bar(segment.percent),
            slice = segment.slice_label(total),
        );
    }

    if total < 99.995 {
        let _ = write!(out, "(probabilities cover {total:.2}% of the chart)");
    }
    out.trim_end().to_string()
}

fn bar(percent: f64) -> String {
    let filled = (percent.clamp(0.0, 100.0) / 100.0 * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}
