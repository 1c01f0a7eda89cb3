use crate::palette::{Palette, Rgb};
use serde::{Deserialize, Serialize};

/// Map `value` onto `[0, 1]` relative to a clamp range.
///
/// `t = clamp((value - min) / max(1, max - min), 0, 1)`. A zero-width range
/// maps every value to 0, as does a NaN value.
pub fn normalize(value: f64, clamp_min: f64, clamp_max: f64) -> f64 {
    let width = clamp_max - clamp_min;
    if width == 0.0 {
        return 0.0;
    }

    let t = (value - clamp_min) / width.max(1.0);
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// `count` evenly spaced values from `start` to `end`, both included
pub fn legend_samples(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Colour clamp bounds, always `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampRange {
    pub min: u64,
    pub max: u64,
}

impl ClampRange {
    pub fn new(min: u64, max: u64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Effective clamp for a pass.
    ///
    /// Without a request the observed `(min, max)` is used. A request is
    /// bounded to `0..=observed_max`; an inverted request is swapped.
    pub fn resolve(requested: Option<ClampRange>, observed: (u64, u64)) -> Self {
        let (observed_min, observed_max) = observed;
        let Some(requested) = requested else {
            return Self::new(observed_min, observed_max);
        };

        let min = requested.min.min(observed_max);
        let max = requested.max.min(observed_max);
        if min > max {
            log::warn!(
                "Colour clamp min {} exceeds max {}; swapping bounds",
                min,
                max
            );
        }
        Self::new(min, max)
    }

    pub fn normalize(&self, value: u64) -> f64 {
        normalize(value as f64, self.min as f64, self.max as f64)
    }

    pub fn legend(&self, samples: usize) -> Legend {
        Legend {
            samples: legend_samples(self.min as f64, self.max as f64, samples),
            tick_values: [self.min, self.max],
            tick_text: [self.min.to_string(), self.max.to_string()],
        }
    }
}

/// Synthetic samples for a continuous colour bar; only the two ends are ticked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub samples: Vec<f64>,
    pub tick_values: [u64; 2],
    pub tick_text: [String; 2],
}

/// Everything a renderer needs to colour values of one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub palette: Palette,
    pub clamp: ClampRange,

    /// Data range the clamp inputs are bounded by
    pub observed: ClampRange,

    pub legend: Legend,
}

impl ColorScale {
    pub fn new(
        palette: Palette,
        requested: Option<ClampRange>,
        observed: (u64, u64),
        samples: usize,
    ) -> Self {
        let clamp = ClampRange::resolve(requested, observed);
        Self {
            palette,
            clamp,
            observed: ClampRange::new(observed.0, observed.1),
            legend: clamp.legend(samples),
        }
    }

    /// Normalised position and sampled colour of a value
    pub fn color_for(&self, value: u64) -> (f64, Rgb) {
        let t = self.clamp.normalize(value);
        (t, self.palette.sample(t))
    }
}
