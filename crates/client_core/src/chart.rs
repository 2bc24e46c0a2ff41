//! Probability list to chart segment transform.

use serde::Serialize;
use shared::protocol::GenreProbability;

/// Slice colors, assigned by position and reused once exhausted.
pub const PALETTE: [&str; 8] = [
    "#FF5733", "#33FF57", "#3357FF", "#FFD700", "#FF33A1", "#33FFF3", "#9933FF", "#FF8C00",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSegment {
    pub label: String,
    pub percent: f64,
    pub color: &'static str,
}

impl ChartSegment {
    /// Hover text: the percent with two decimals, e.g. `60.00%`.
    pub fn tooltip(&self) -> String {
        format!("{:.2}%", self.percent)
    }

    /// Pie label: the segment's share of the drawn total, rounded to a
    /// whole percent. A zero total yields a share of zero.
    pub fn slice_label(&self, total_percent: f64) -> String {
        let share = if total_percent > 0.0 {
            self.percent / total_percent * 100.0
        } else {
            0.0
        };
        format!("{} {:.0}%", self.label, share)
    }
}

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Scales each probability to a percent and colors it by position. Input
/// order is kept and nothing is normalized.
pub fn to_segments(probabilities: &[GenreProbability]) -> Vec<ChartSegment> {
    probabilities
        .iter()
        .enumerate()
        .map(|(index, entry)| ChartSegment {
            label: entry.genre.clone(),
            percent: entry.value * 100.0,
            color: palette_color(index),
        })
        .collect()
}

pub fn total_percent(segments: &[ChartSegment]) -> f64 {
    segments.iter().map(|segment| segment.percent).sum()
}

/// Segment matching the predicted genre, if the service listed it.
pub fn selected_segment<'a>(segments: &'a [ChartSegment], genre: &str) -> Option<&'a ChartSegment> {
    segments.iter().find(|segment| segment.label == genre)
}

#[cfg(test)]
#[path = "tests/chart_tests.rs"]
mod tests;
