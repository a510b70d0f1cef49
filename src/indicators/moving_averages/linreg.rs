//! # Linear Regression (LINREG)
//!
//! Fits a least-squares line to each trailing window of `period` values and
//! reports the fitted value at the window's last point.
//!
//! ## Parameters
//! - **period**: Window size (must be ≥ 2). Defaults to 14.
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum LinRegData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct LinRegParams {
    pub period: Option<usize>,
}

impl Default for LinRegParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

#[derive(Debug, Clone)]
pub struct LinRegInput<'a> {
    pub data: LinRegData<'a>,
    pub params: LinRegParams,
}

impl<'a> LinRegInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: LinRegParams) -> Self {
        Self {
            data: LinRegData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: LinRegParams) -> Self {
        Self {
            data: LinRegData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", LinRegParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(14)
    }
}

#[derive(Debug, Clone)]
pub struct LinRegOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum LinRegError {
    #[error("linreg: Empty data provided.")]
    EmptyData,
    #[error("linreg: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("linreg: All values are NaN.")]
    AllValuesNaN,
    #[error("linreg: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

pub fn linreg(input: &LinRegInput) -> Result<LinRegOutput, LinRegError> {
    let data: &[f64] = match &input.data {
        LinRegData::Candles { candles, source } => source_type(candles, source),
        LinRegData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(LinRegError::EmptyData);
    }
    let period = input.get_period();
    if period < 2 {
        return Err(LinRegError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(LinRegError::AllValuesNaN)?;
    let valid = longest_valid_run(data);
    if valid < period {
        return Err(LinRegError::NotEnoughValidData {
            needed: period,
            valid,
        });
    }

    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, period, &mut out, |seg, dst| {
        linreg_scalar(seg, period, 0, dst)
    });
    Ok(LinRegOutput { values: out })
}

/// Window x-coordinates run `0..period`; sums over `y` and `x * y` slide in O(1).
#[inline]
pub fn linreg_scalar(data: &[f64], period: usize, first: usize, out: &mut [f64]) {
    let n = period as f64;
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_x2 = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let denom = n * sum_x2 - sum_x * sum_x;
    let last_x = n - 1.0;

    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    for (k, &y) in data[first..first + period].iter().enumerate() {
        sum_y += y;
        sum_xy += k as f64 * y;
    }

    let fitted = |sum_y: f64, sum_xy: f64| {
        let slope = (n * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / n;
        intercept + slope * last_x
    };

    out[first + period - 1] = fitted(sum_y, sum_xy);
    for i in (first + period)..data.len() {
        let leaving = data[i - period];
        sum_xy = sum_xy - (sum_y - leaving) + last_x * data[i];
        sum_y += data[i] - leaving;
        out[i] = fitted(sum_y, sum_xy);
    }
}
