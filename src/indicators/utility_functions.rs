//! Series helpers shared by the volume indicators: validation, parameter
//! normalization, signed differencing, windowed sums, shifting and filling.

use crate::utilities::enums::FillMethod;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("series: Empty data provided.")]
    EmptyData,
    #[error("series: All values are NaN.")]
    AllValuesNaN,
}

/// Checks that `series` holds at least one valid number.
#[inline]
pub fn verify_series(series: &[f64]) -> Result<&[f64], SeriesError> {
    if series.is_empty() {
        return Err(SeriesError::EmptyData);
    }
    if series.iter().all(|x| x.is_nan()) {
        return Err(SeriesError::AllValuesNaN);
    }
    Ok(series)
}

pub const DEFAULT_DRIFT: usize = 1;

#[inline]
pub fn get_drift(drift: Option<usize>) -> usize {
    match drift {
        Some(d) if d > 0 => d,
        Some(d) => {
            log::debug!("drift {} is not positive, using {}", d, DEFAULT_DRIFT);
            DEFAULT_DRIFT
        }
        None => DEFAULT_DRIFT,
    }
}

#[inline]
pub fn get_offset(offset: Option<isize>) -> isize {
    offset.unwrap_or(0)
}

/// Sign of the `lag`-period change: `1.0`, `-1.0` or `0.0`.
///
/// The first `lag` positions have no predecessor and take `initial`; a `NaN`
/// difference stays `NaN`.
pub fn signed_series(series: &[f64], initial: f64, lag: usize) -> Vec<f64> {
    let lag = lag.max(1);
    series
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            if i < lag {
                return initial;
            }
            let d = x - series[i - lag];
            if d > 0.0 {
                1.0
            } else if d < 0.0 {
                -1.0
            } else if d == 0.0 {
                0.0
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Snaps values within machine epsilon of zero to exactly `0.0`.
#[inline(always)]
pub fn zero(x: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        0.0
    } else {
        x
    }
}

/// `series[i] - series[i - lag]`, `NaN` for `i < lag`.
pub fn diff(series: &[f64], lag: usize) -> Vec<f64> {
    series
        .iter()
        .enumerate()
        .map(|(i, &x)| if i < lag { f64::NAN } else { x - series[i - lag] })
        .collect()
}

/// Trailing `window`-sized sum written into `out`.
///
/// Positions before `window - 1` are `NaN`. Inside a full window `NaN` entries
/// are skipped; a window with no valid entry yields `NaN`.
pub fn rolling_sum_into(data: &[f64], window: usize, out: &mut [f64]) {
    debug_assert_eq!(data.len(), out.len());
    let window = window.max(1);
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 0..data.len() {
        let x = data[i];
        if !x.is_nan() {
            sum += x;
            count += 1;
        }
        if i >= window {
            let old = data[i - window];
            if !old.is_nan() {
                sum -= old;
                count -= 1;
            }
        }
        if count == 0 {
            sum = 0.0;
        }
        out[i] = if i + 1 >= window && count > 0 {
            sum
        } else {
            f64::NAN
        };
    }
}

pub fn rolling_sum(data: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    rolling_sum_into(data, window, &mut out);
    out
}

/// Shifts values by `offset` positions in place. Positive offsets move values
/// later; vacated slots become `NaN`.
pub fn shift_in_place(data: &mut [f64], offset: isize) {
    let len = data.len();
    if offset == 0 || len == 0 {
        return;
    }
    let k = offset.unsigned_abs();
    if k >= len {
        data.fill(f64::NAN);
        return;
    }
    if offset > 0 {
        data.copy_within(0..len - k, k);
        data[..k].fill(f64::NAN);
    } else {
        data.copy_within(k..len, 0);
        data[len - k..].fill(f64::NAN);
    }
}

pub fn shift(data: &[f64], offset: isize) -> Vec<f64> {
    let mut out = data.to_vec();
    shift_in_place(&mut out, offset);
    out
}

#[inline]
pub fn fill_value(data: &mut [f64], value: f64) {
    for v in data.iter_mut().filter(|v| v.is_nan()) {
        *v = value;
    }
}

/// Propagates valid values into `NaN` slots. Leading (forward) or trailing
/// (backward) `NaN`s with nothing to propagate are left untouched.
pub fn fill_with_method(data: &mut [f64], method: FillMethod) {
    match method {
        FillMethod::Ffill => {
            let mut last = f64::NAN;
            for v in data.iter_mut() {
                if v.is_nan() {
                    *v = last;
                } else {
                    last = *v;
                }
            }
        }
        FillMethod::Bfill => {
            let mut next = f64::NAN;
            for v in data.iter_mut().rev() {
                if v.is_nan() {
                    *v = next;
                } else {
                    next = *v;
                }
            }
        }
    }
}
