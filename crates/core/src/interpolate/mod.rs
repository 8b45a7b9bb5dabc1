//! Interpolation helpers:
//! - blend fractions strictly inside (0, 1)
//! - pluggable easing of the blend fraction
//! - in-between snapshots for a transition

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{FuelMixError, Result, Snapshot};

/// Remaps a blend fraction before it is applied.
///
/// Implementations should map [0, 1] into [0, 1]. Monotonic curves keep the
/// in-between frames monotonic per cell.
pub trait Easing {
    fn ease(&self, t: f64) -> f64;
}

impl<F> Easing for F
where
    F: Fn(f64) -> f64,
{
    fn ease(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Built-in easing curves that can be named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingCurve {
    #[default]
    Linear,
    /// `t^2 (3 - 2t)`
    Smoothstep,
    /// `1 - (1 - t)^3`
    EaseOutCubic,
    EaseInOutCubic,
}

impl Easing for EasingCurve {
    fn ease(&self, t: f64) -> f64 {
        match self {
            EasingCurve::Linear => t,
            EasingCurve::Smoothstep => t * t * (3.0 - 2.0 * t),
            EasingCurve::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingCurve::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

impl EasingCurve {
    pub fn name(self) -> &'static str {
        match self {
            EasingCurve::Linear => "linear",
            EasingCurve::Smoothstep => "smoothstep",
            EasingCurve::EaseOutCubic => "ease_out_cubic",
            EasingCurve::EaseInOutCubic => "ease_in_out_cubic",
        }
    }
}

impl fmt::Display for EasingCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingCurve {
    type Err = FuelMixError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(EasingCurve::Linear),
            "smoothstep" => Ok(EasingCurve::Smoothstep),
            "ease_out_cubic" => Ok(EasingCurve::EaseOutCubic),
            "ease_in_out_cubic" => Ok(EasingCurve::EaseInOutCubic),
            other => Err(FuelMixError::msg(format!(
                "unknown easing curve `{other}` (expected linear, smoothstep, ease_out_cubic or ease_in_out_cubic)"
            ))),
        }
    }
}

/// Fraction of the way from the source to the target at `step` of `steps`.
///
/// `step` runs from 1 to `steps`, so the result never reaches 0 or 1.
#[inline]
pub fn blend_fraction(step: usize, steps: usize) -> f64 {
    step as f64 / (steps + 1) as f64
}

/// Produces `steps` snapshots strictly between `from` and `to`.
///
/// `to` is realigned to `from`'s column order first; a missing or extra column
/// fails the whole call. The endpoints themselves are never emitted.
pub fn interpolate<E>(from: &Snapshot, to: &Snapshot, steps: usize, easing: &E) -> Result<Vec<Snapshot>>
where
    E: Easing + ?Sized,
{
    let to = to.realign_to(from.columns(), "interpolation target")?;
    if from.rows() != to.rows() {
        return Err(FuelMixError::ShapeMismatch {
            left: format!("{} rows", from.rows()),
            right: format!("{} rows", to.rows()),
            detail: "snapshots must share an index length to be interpolated".to_string(),
        });
    }

    if steps == 0 {
        return Ok(Vec::new());
    }

    (1..=steps)
        .map(|step| {
            let alpha = easing.ease(blend_fraction(step, steps));
            from.blend(&to, alpha)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(solar: [f64; 3], gas: [f64; 3]) -> Snapshot {
        Snapshot::from_columns(
            vec!["06:00".into(), "12:00".into(), "18:00".into()],
            [("Solar", solar.to_vec()), ("Gas", gas.to_vec())],
        )
        .unwrap()
    }

    #[test]
    fn fractions_stay_inside_the_open_interval() {
        for steps in 1..20 {
            for step in 1..=steps {
                let alpha = blend_fraction(step, steps);
                assert!(alpha > 0.0 && alpha < 1.0);
            }
        }
        assert_eq!(blend_fraction(3, 5), 0.5);
    }

    #[test]
    fn zero_steps_yields_nothing() {
        let a = snap([0.0; 3], [1.0; 3]);
        let b = snap([2.0; 3], [3.0; 3]);
        assert!(interpolate(&a, &b, 0, &EasingCurve::Linear)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn values_stay_within_endpoint_bounds() {
        let a = snap([0.0, 5.0, -3.0], [10.0, 10.0, 2.0]);
        let b = snap([8.0, 1.0, 7.0], [10.0, 0.0, -2.0]);
        let frames = interpolate(&a, &b, 7, &EasingCurve::Linear).unwrap();
        assert_eq!(frames.len(), 7);

        for frame in &frames {
            for col in 0..2 {
                for row in 0..3 {
                    let (va, vb) = (a.value(row, col).unwrap(), b.value(row, col).unwrap());
                    let v = frame.value(row, col).unwrap();
                    assert!(v >= va.min(vb) && v <= va.max(vb));
                }
            }
        }
    }

    #[test]
    fn unchanged_cells_hold_their_value() {
        let a = snap([1585.1, 0.1, 2200.3], [0.7, 13.37, 9000.01]);
        for steps in 1..=60 {
            for frame in interpolate(&a, &a, steps, &EasingCurve::Linear).unwrap() {
                assert_eq!(frame, a, "steps {steps}");
            }
        }
    }

    #[test]
    fn endpoints_are_never_emitted() {
        let a = snap([0.0, 1.0, 2.0], [3.0, 4.0, 5.0]);
        let b = snap([10.0, 11.0, 12.0], [13.0, 14.0, 15.0]);
        for steps in 1..6 {
            for frame in interpolate(&a, &b, steps, &EasingCurve::Linear).unwrap() {
                assert_ne!(frame, a);
                assert_ne!(frame, b);
            }
        }
    }

    #[test]
    fn cells_move_monotonically() {
        let a = snap([0.0, 9.0, 4.0], [1.0, 1.0, 1.0]);
        let b = snap([6.0, 3.0, 4.0], [0.0, 2.0, 1.0]);
        for curve in [
            EasingCurve::Linear,
            EasingCurve::Smoothstep,
            EasingCurve::EaseOutCubic,
            EasingCurve::EaseInOutCubic,
        ] {
            let frames = interpolate(&a, &b, 9, &curve).unwrap();
            for col in 0..2 {
                for row in 0..3 {
                    if a.value(row, col) == b.value(row, col) {
                        continue;
                    }
                    let rising = b.value(row, col) > a.value(row, col);
                    for pair in frames.windows(2) {
                        let (prev, next) = (
                            pair[0].value(row, col).unwrap(),
                            pair[1].value(row, col).unwrap(),
                        );
                        if rising {
                            assert!(next >= prev, "{curve} not rising");
                        } else {
                            assert!(next <= prev, "{curve} not falling");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn realigns_permuted_target() {
        let a = snap([0.0; 3], [10.0; 3]);
        let b = Snapshot::from_columns(
            a.index().to_vec(),
            [("Gas", vec![20.0; 3]), ("Solar", vec![4.0; 3])],
        )
        .unwrap();

        let frames = interpolate(&a, &b, 1, &EasingCurve::Linear).unwrap();
        assert_eq!(frames[0].columns(), a.columns());
        assert_eq!(frames[0].series("Solar"), Some(&[2.0, 2.0, 2.0][..]));
        assert_eq!(frames[0].series("Gas"), Some(&[15.0, 15.0, 15.0][..]));
    }

    #[test]
    fn missing_column_fails_even_without_steps() {
        let a = snap([0.0; 3], [1.0; 3]);
        let b = Snapshot::from_columns(a.index().to_vec(), [("Solar", vec![1.0; 3])]).unwrap();

        let err = interpolate(&a, &b, 0, &EasingCurve::Linear).unwrap_err();
        assert!(err.to_string().contains("Gas"));
    }

    #[test]
    fn closures_plug_in_as_easing() {
        let a = snap([0.0; 3], [0.0; 3]);
        let b = snap([1.0; 3], [1.0; 3]);
        let frames = interpolate(&a, &b, 1, &|t: f64| t * t).unwrap();
        assert_eq!(frames[0].value(0, 0), Some(0.25));
    }

    #[test]
    fn curves_parse_from_names() {
        assert_eq!(
            "ease-out-cubic".parse::<EasingCurve>().unwrap(),
            EasingCurve::EaseOutCubic
        );
        assert!("bounce".parse::<EasingCurve>().is_err());
    }
}
