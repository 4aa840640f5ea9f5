//! Summary statistics over a property's values.
//!
//! Standard deviation is always the sample estimator (`n - 1` denominator).
//! Skewness is the adjusted Fisher-Pearson coefficient, the same estimator
//! spreadsheet and dataframe tools report as "skew".

use serde::{Deserialize, Serialize};

/// Central moments below this are floating-point residue, not spread.
const MOMENT_RESIDUE: f64 = 1e-14;

/// Whether zero values take part in a mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPolicy {
    /// Zero is a real measurement.
    Include,
    /// Zero means "not applicable" and is dropped before averaging.
    Skip,
}

/// What a zero-skipping mean returns when nothing survives the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    #[default]
    Fail,
    Zero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// Fewer values than the statistic requires.
    InsufficientSample { needed: usize, got: usize },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::InsufficientSample { needed, got } => write!(
                f,
                "insufficient sample: need at least {needed} value{}, have {got}",
                if *needed == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::error::Error for StatsError {}

fn require(values: &[f64], needed: usize) -> Result<(), StatsError> {
    if values.len() < needed {
        return Err(StatsError::InsufficientSample {
            needed,
            got: values.len(),
        });
    }
    Ok(())
}

/// Arithmetic mean of all values.
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    require(values, 1)?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Arithmetic mean of the non-zero values.
pub fn mean_nonzero(values: &[f64], empty: EmptyPolicy) -> Result<f64, StatsError> {
    let nonzero: Vec<f64> = values.iter().copied().filter(|&v| v != 0.0).collect();
    if nonzero.is_empty() && empty == EmptyPolicy::Zero {
        return Ok(0.0);
    }
    mean(&nonzero)
}

/// Mean under an explicit zero policy.
pub fn mean_with(values: &[f64], zeros: ZeroPolicy, empty: EmptyPolicy) -> Result<f64, StatsError> {
    match zeros {
        ZeroPolicy::Include => mean(values),
        ZeroPolicy::Skip => mean_nonzero(values, empty),
    }
}

/// Sample standard deviation.
pub fn stddev(values: &[f64]) -> Result<f64, StatsError> {
    require(values, 2)?;
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Middle value, or the mean of the two middle values.
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    require(values, 1)?;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        Ok((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Ok(sorted[n / 2])
    }
}

/// True when a central moment is rounding noise around `mean`.
fn is_residue(moment: f64, mean: f64) -> bool {
    moment.abs() < MOMENT_RESIDUE || moment.abs() <= (4.0 * f64::EPSILON * mean.abs()).powi(2)
}

/// Adjusted Fisher-Pearson skewness, `sqrt(n(n-1))/(n-2) * m3/m2^1.5`.
///
/// Constant input has zero skew, including decimal columns whose
/// deviations from the mean are only rounding error.
pub fn skew(values: &[f64]) -> Result<f64, StatsError> {
    require(values, 3)?;
    let n = values.len() as f64;
    let m = mean(values)?;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    if is_residue(m2, m) || m3.abs() < MOMENT_RESIDUE {
        return Ok(0.0);
    }
    let g1 = m3 / m2.powf(1.5);
    Ok((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// Descriptive statistics for one column of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// `None` with fewer than two values.
    pub std: Option<f64>,
    pub median: f64,
    /// `None` with fewer than three values.
    pub skew: Option<f64>,
}

impl Summary {
    /// NaN entries are treated as missing and left out of every statistic.
    pub fn compute(values: &[f64]) -> Result<Self, StatsError> {
        let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let values = present.as_slice();
        require(values, 1)?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self {
            count: values.len(),
            min,
            max,
            mean: mean(values)?,
            std: stddev(values).ok(),
            median: median(values)?,
            skew: skew(values).ok(),
        })
    }

    /// Rows in display order, label and value.
    pub fn rows(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("count", Some(self.count as f64)),
            ("min", Some(self.min)),
            ("max", Some(self.max)),
            ("mean", Some(self.mean)),
            ("std", self.std),
            ("median", Some(self.median)),
            ("skew", self.skew),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]).unwrap(), 4.0);
    }

    #[test]
    fn mean_of_nothing_fails() {
        assert_eq!(
            mean(&[]),
            Err(StatsError::InsufficientSample { needed: 1, got: 0 })
        );
    }

    #[test]
    fn mean_nonzero_skips_zeros() {
        assert_eq!(
            mean_nonzero(&[0.0, 0.0, 4.0, 6.0], EmptyPolicy::Fail).unwrap(),
            5.0
        );
    }

    #[test]
    fn mean_nonzero_all_zero_follows_policy() {
        assert_eq!(mean_nonzero(&[0.0, 0.0], EmptyPolicy::Zero).unwrap(), 0.0);
        assert_eq!(
            mean_nonzero(&[0.0, 0.0], EmptyPolicy::Fail),
            Err(StatsError::InsufficientSample { needed: 1, got: 0 })
        );
    }

    #[test]
    fn mean_with_dispatches_on_zero_policy() {
        let values = [0.0, 2.0, 4.0];
        assert_eq!(
            mean_with(&values, ZeroPolicy::Include, EmptyPolicy::Fail).unwrap(),
            2.0
        );
        assert_eq!(
            mean_with(&values, ZeroPolicy::Skip, EmptyPolicy::Fail).unwrap(),
            3.0
        );
    }

    #[test]
    fn sample_stddev() {
        let s = stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(s, 2.138_089_935_299_395));
        assert_eq!(format!("{s:.2}"), "2.14");
    }

    #[test]
    fn stddev_of_one_value_fails() {
        assert_eq!(
            stddev(&[5.0]),
            Err(StatsError::InsufficientSample { needed: 2, got: 1 })
        );
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
    }

    #[test]
    fn skew_symmetric_is_zero() {
        assert!(approx(skew(&[1.0, 2.0, 3.0]).unwrap(), 0.0));
        assert_eq!(skew(&[7.0, 7.0, 7.0]).unwrap(), 0.0);
    }

    #[test]
    fn skew_right_tailed() {
        // Reference value from pandas: Series([1, 1, 1, 5]).skew() == 2.0
        assert!(approx(skew(&[1.0, 1.0, 1.0, 5.0]).unwrap(), 2.0));
        assert!(approx(skew(&[5.0, 5.0, 5.0, 1.0]).unwrap(), -2.0));
    }

    #[test]
    fn skew_of_constant_decimals_is_zero() {
        assert_eq!(skew(&[0.1, 0.1, 0.1]).unwrap(), 0.0);
        assert_eq!(skew(&[0.3, 0.3, 0.3, 0.3, 0.3]).unwrap(), 0.0);
        assert_eq!(skew(&[1.0e10 + 0.7, 1.0e10 + 0.7, 1.0e10 + 0.7]).unwrap(), 0.0);
    }

    #[test]
    fn summary_ignores_nan_values() {
        let s = Summary::compute(&[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.median, 2.0);
        assert!(approx(s.std.unwrap(), 2f64.sqrt()));
        assert_eq!(s.skew, None);
    }

    #[test]
    fn summary_of_only_nan_fails() {
        assert_eq!(
            Summary::compute(&[f64::NAN, f64::NAN]),
            Err(StatsError::InsufficientSample { needed: 1, got: 0 })
        );
    }

    #[test]
    fn skew_needs_three_values() {
        assert!(skew(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn summary_of_three() {
        let s = Summary::compute(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.median, 2.0);
        assert!(approx(s.std.unwrap(), 1.0));
        assert!(approx(s.skew.unwrap(), 0.0));
    }

    #[test]
    fn summary_of_single_value_has_no_spread() {
        let s = Summary::compute(&[4.5]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_eq!(s.skew, None);
        assert_eq!(s.rows()[4], ("std", None));
    }

    #[test]
    fn summary_of_nothing_fails() {
        assert!(Summary::compute(&[]).is_err());
    }
}
