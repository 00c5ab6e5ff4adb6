//! Trend classification via ordinary-least-squares slope (spec §4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Degrading,
    Stable,
    InsufficientData,
}

const IMPROVING_SLOPE: f64 = 0.01;
const DEGRADING_SLOPE: f64 = -0.01;
const MAX_HISTORY_POINTS: usize = 10;
const MIN_POINTS_FOR_TREND: usize = 3;

/// Slope of the best-fit line through `(index, score)` pairs.
fn ols_slope(scores: &[f64]) -> f64 {
    let n = scores.len() as f64;
    let xs: Vec<f64> = (0..scores.len()).map(|i| i as f64).collect();

    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = scores.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in xs.iter().zip(scores.iter()) {
        numerator += (x - mean_x) * (y - mean_y);
        denominator += (x - mean_x).powi(2);
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `history` is the ordered sequence of prior overall scores (oldest
/// first); `current` is the score of the report being classified.
/// Requires at least 3 points total (history + current) or returns
/// `InsufficientData`.
pub fn classify(history: &[f64], current: f64) -> Trend {
    let mut points: Vec<f64> = history.iter().copied().collect();
    points.push(current);

    if points.len() < MIN_POINTS_FOR_TREND {
        return Trend::InsufficientData;
    }

    let window_start = points.len().saturating_sub(MAX_HISTORY_POINTS);
    let slope = ols_slope(&points[window_start..]);

    if slope > IMPROVING_SLOPE {
        Trend::Improving
    } else if slope < DEGRADING_SLOPE {
        Trend::Degrading
    } else {
        Trend::Stable
    }
}
