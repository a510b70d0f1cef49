//! # Hull Moving Average (HMA)
//!
//! `hma = wma(2 * wma(x, period / 2) - wma(x, period), floor(sqrt(period)))`.
//!
//! ## Parameters
//! - **period**: Window size (must be ≥ 2). Defaults to 5.
//!
//! ## Errors
//! - **EmptyData**: hma: Input data slice is empty.
//! - **InvalidPeriod**: hma: `period` is below 2.
//! - **AllValuesNaN**: hma: All input data values are `NaN`.
//! - **NotEnoughValidData**: hma: Fewer than `period + sqrt(period) - 1` valid values.
use crate::indicators::moving_averages::wma::wma_scalar;
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use std::convert::AsRef;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum HmaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

impl<'a> AsRef<[f64]> for HmaInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            HmaData::Slice(slice) => slice,
            HmaData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HmaParams {
    pub period: Option<usize>,
}

impl Default for HmaParams {
    fn default() -> Self {
        Self { period: Some(5) }
    }
}

#[derive(Debug, Clone)]
pub struct HmaInput<'a> {
    pub data: HmaData<'a>,
    pub params: HmaParams,
}

impl<'a> HmaInput<'a> {
    #[inline]
    pub fn from_candles(c: &'a Candles, s: &'a str, p: HmaParams) -> Self {
        Self {
            data: HmaData::Candles {
                candles: c,
                source: s,
            },
            params: p,
        }
    }
    #[inline]
    pub fn from_slice(sl: &'a [f64], p: HmaParams) -> Self {
        Self {
            data: HmaData::Slice(sl),
            params: p,
        }
    }
    #[inline]
    pub fn with_default_candles(c: &'a Candles) -> Self {
        Self::from_candles(c, "close", HmaParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(5)
    }
}

#[derive(Debug, Clone)]
pub struct HmaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum HmaError {
    #[error("hma: Empty data provided.")]
    EmptyData,
    #[error("hma: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("hma: All values are NaN.")]
    AllValuesNaN,
    #[error("hma: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

pub fn hma(input: &HmaInput) -> Result<HmaOutput, HmaError> {
    let data = input.as_ref();
    let len = data.len();
    if len == 0 {
        return Err(HmaError::EmptyData);
    }
    let period = input.get_period();
    if period < 2 {
        return Err(HmaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(HmaError::AllValuesNaN)?;
    let sq = ((period as f64).sqrt().floor() as usize).max(1);
    let needed = period + sq - 1;
    let valid = longest_valid_run(data);
    if valid < needed {
        return Err(HmaError::NotEnoughValidData { needed, valid });
    }

    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, needed, &mut out, |seg, dst| {
        hma_segment(seg, period, sq, dst)
    });
    Ok(HmaOutput { values: out })
}

/// WMA of `2 * wma(half) - wma(period)` over one gap-free segment.
fn hma_segment(data: &[f64], period: usize, sq: usize, out: &mut [f64]) {
    let len = data.len();
    let half = period / 2;

    let mut w_half = alloc_with_nan_prefix(len, half - 1);
    wma_scalar(data, half, 0, &mut w_half);
    let diff_start = period - 1;
    let mut w_full = alloc_with_nan_prefix(len, diff_start);
    wma_scalar(data, period, 0, &mut w_full);

    let mut diff = alloc_with_nan_prefix(len, diff_start);
    for i in diff_start..len {
        diff[i] = 2.0 * w_half[i] - w_full[i];
    }
    wma_scalar(&diff, sq, diff_start, out);
}
