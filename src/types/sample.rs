use serde::{Deserialize, Serialize};

// ============================================================================
// Sample Trait
// ============================================================================

/// Common shape of every feed sample: epoch-millisecond timestamp plus its
/// pre-formatted `HH:MM:SS` chart label.
pub trait Timestamped {
    fn ts(&self) -> i64;
    fn label(&self) -> &str;
}

macro_rules! impl_timestamped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Timestamped for $ty {
                fn ts(&self) -> i64 {
                    self.ts
                }

                fn label(&self) -> &str {
                    &self.t
                }
            }
        )*
    };
}

// ============================================================================
// Feed Samples
// ============================================================================

/// Three-axis vibration reading (m/s²).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationSample {
    pub ts: i64,
    pub t: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VibrationSample {
    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn to_magnitude(&self) -> MagnitudeSample {
        MagnitudeSample {
            ts: self.ts,
            t: self.t.clone(),
            v: self.magnitude(),
        }
    }
}

/// Sound pressure level reading (dB).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSample {
    pub ts: i64,
    pub t: String,
    pub n: f64,
}

/// Engine RPM paired with particulate concentration, sampled together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpmPmSample {
    pub ts: i64,
    pub t: String,
    pub rpm: f64,
    pub pm: f64,
}

/// Vibration magnitude `|a|`, derived from a [`VibrationSample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeSample {
    pub ts: i64,
    pub t: String,
    pub v: f64,
}

impl_timestamped!(VibrationSample, NoiseSample, RpmPmSample, MagnitudeSample);

/// Map a vibration series onto its magnitude series, preserving order.
pub fn vibration_magnitudes(samples: &[VibrationSample]) -> Vec<MagnitudeSample> {
    samples.iter().map(VibrationSample::to_magnitude).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_is_euclidean_norm() {
        let s = VibrationSample {
            ts: 0,
            t: "00:00:00".to_string(),
            x: 1.5,
            y: 1.2,
            z: 1.7,
        };
        let expected = (1.5f64.powi(2) + 1.2f64.powi(2) + 1.7f64.powi(2)).sqrt();
        assert!((s.magnitude() - expected).abs() < 1e-12);
        // sqrt(6.58)
        assert!((s.magnitude() - 2.5652).abs() < 1e-3);
    }

    #[test]
    fn magnitudes_keep_timestamps_and_labels() {
        let samples = vec![
            VibrationSample { ts: 1, t: "a".into(), x: 3.0, y: 4.0, z: 0.0 },
            VibrationSample { ts: 2, t: "b".into(), x: 0.0, y: 0.0, z: 2.0 },
        ];
        let mags = vibration_magnitudes(&samples);
        assert_eq!(mags.len(), 2);
        assert_eq!(mags[0].ts, 1);
        assert_eq!(mags[0].label(), "a");
        assert!((mags[0].v - 5.0).abs() < 1e-12);
        assert!((mags[1].v - 2.0).abs() < 1e-12);
    }
}
