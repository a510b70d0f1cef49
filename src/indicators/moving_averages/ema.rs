//! # Exponential Moving Average (EMA)
//!
//! `ema[i] = alpha * x[i] + (1 - alpha) * ema[i - 1]` with `alpha = 2 / (period + 1)`.
//! The recursion is seeded with the SMA of the first `period` valid values, so the
//! first output lands at `first_valid + period - 1`. A `NaN` breaks the
//! recursion; it is seeded again from the next `period` values after the gap.
//!
//! ## Parameters
//! - **period**: Smoothing window. Defaults to 9.
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum EmaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct EmaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct EmaParams {
    pub period: Option<usize>,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: Some(9) }
    }
}

#[derive(Debug, Clone)]
pub struct EmaInput<'a> {
    pub data: EmaData<'a>,
    pub params: EmaParams,
}

impl<'a> EmaInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: EmaParams) -> Self {
        Self {
            data: EmaData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: EmaParams) -> Self {
        Self {
            data: EmaData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", EmaParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(9)
    }
}

#[derive(Debug, Error)]
pub enum EmaError {
    #[error("ema: Empty data provided.")]
    EmptyData,
    #[error("ema: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("ema: All values are NaN.")]
    AllValuesNaN,
    #[error("ema: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

#[inline]
pub fn ema(input: &EmaInput) -> Result<EmaOutput, EmaError> {
    let data: &[f64] = match &input.data {
        EmaData::Candles { candles, source } => source_type(candles, source),
        EmaData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(EmaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(EmaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(EmaError::AllValuesNaN)?;
    let valid = longest_valid_run(data);
    if valid < period {
        return Err(EmaError::NotEnoughValidData {
            needed: period,
            valid,
        });
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, period, &mut out, |seg, dst| {
        ema_seeded_scalar(seg, period, alpha, 0, dst)
    });
    Ok(EmaOutput { values: out })
}

/// Exponential smoothing with an SMA seed, shared with the Wilders average.
#[inline]
pub fn ema_seeded_scalar(data: &[f64], period: usize, alpha: f64, first: usize, out: &mut [f64]) {
    let mut sum = 0.0;
    for &v in &data[first..first + period] {
        sum += v;
    }
    let mut prev = sum / period as f64;
    out[first + period - 1] = prev;
    let beta = 1.0 - alpha;
    for i in (first + period)..data.len() {
        prev = alpha * data[i] + beta * prev;
        out[i] = prev;
    }
}
