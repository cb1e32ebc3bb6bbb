//! Simple moving average of bar volume.
//!
//! First valid value at index period-1. A zero period never becomes ready.

use super::Indicator;
use crate::domain::Bar;

/// Rolling mean over `period` values. NaN until the window is full, and NaN
/// for every window that contains a NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    // Recompute the window whenever a NaN enters or leaves it, so a single
    // void bar only poisons the windows that contain it.
    let mut sum: f64 = values[..period].iter().sum();
    let mut nan_in_window = values[..period].iter().any(|v| v.is_nan());
    if !nan_in_window {
        result[period - 1] = sum / period as f64;
    }

    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];

        if entering.is_nan() || leaving.is_nan() || nan_in_window {
            let window = &values[(i + 1 - period)..=i];
            nan_in_window = window.iter().any(|v| v.is_nan());
            if nan_in_window {
                continue;
            }
            sum = window.iter().sum();
        } else {
            sum = sum - leaving + entering;
        }

        result[i] = sum / period as f64;
    }

    result
}

/// Volume moving average used by the volume-spike reversal.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSma {
    period: usize,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for VolumeSma {
    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        rolling_mean(&volumes, self.period)
    }
}
