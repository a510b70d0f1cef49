//! # Simple Moving Average (SMA)
//!
//! Arithmetic mean over a trailing window of `period` values.
//!
//! ## Parameters
//! - **period**: Window size. Defaults to 9.
//!
//! ## Errors
//! - **EmptyData**: sma: Input data slice is empty.
//! - **InvalidPeriod**: sma: `period` is zero.
//! - **AllValuesNaN**: sma: All input values are `NaN`.
//! - **NotEnoughValidData**: sma: No gap-free stretch of `period` values.
//!
//! ## Returns
//! - **`Ok(SmaOutput)`**: `Vec<f64>` matching the input length. A value is
//!   `NaN` while its window holds a `NaN`, so the output warms up again after
//!   every interior gap.
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum SmaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct SmaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct SmaParams {
    pub period: Option<usize>,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: Some(9) }
    }
}

#[derive(Debug, Clone)]
pub struct SmaInput<'a> {
    pub data: SmaData<'a>,
    pub params: SmaParams,
}

impl<'a> SmaInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: SmaParams) -> Self {
        Self {
            data: SmaData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: SmaParams) -> Self {
        Self {
            data: SmaData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", SmaParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(9)
    }
}

#[derive(Debug, Error)]
pub enum SmaError {
    #[error("sma: Empty data provided.")]
    EmptyData,
    #[error("sma: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("sma: All values are NaN.")]
    AllValuesNaN,
    #[error("sma: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

#[inline]
pub fn sma(input: &SmaInput) -> Result<SmaOutput, SmaError> {
    let data: &[f64] = match &input.data {
        SmaData::Candles { candles, source } => source_type(candles, source),
        SmaData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(SmaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(SmaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(SmaError::AllValuesNaN)?;
    let valid = longest_valid_run(data);
    if valid < period {
        return Err(SmaError::NotEnoughValidData {
            needed: period,
            valid,
        });
    }

    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, period, &mut out, |seg, dst| {
        sma_scalar(seg, period, 0, dst)
    });
    Ok(SmaOutput { values: out })
}

/// Writes from `first + period - 1` onward; the prefix is left to the caller.
/// `data[first..]` must not contain `NaN`.
#[inline]
pub fn sma_scalar(data: &[f64], period: usize, first: usize, out: &mut [f64]) {
    let mut sum = 0.0;
    for &v in &data[first..first + period] {
        sum += v;
    }
    let inv = 1.0 / period as f64;
    out[first + period - 1] = sum * inv;
    for i in (first + period)..data.len() {
        sum += data[i] - data[i - period];
        out[i] = sum * inv;
    }
}
