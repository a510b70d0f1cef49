//! # Double Exponential Moving Average (DEMA)
//!
//! Reduces EMA lag by combining an EMA with an EMA of itself:
//! `dema = 2 * ema(x) - ema(ema(x))`.
//!
//! ## Parameters
//! - **period**: Lookback for both EMA passes (must be ≥ 1). Defaults to 30.
//!
//! ## Errors
//! - **EmptyData**: dema: Input data slice is empty.
//! - **InvalidPeriod**: dema: `period` is zero.
//! - **AllValuesNaN**: dema: All input data values are `NaN`.
//! - **NotEnoughValidData**: dema: Fewer than `2 * (period - 1) + 1` valid values.
//!
//! ## Returns
//! - **`Ok(DemaOutput)`**: first value at `first_valid + 2 * (period - 1)`; both
//!   EMA passes restart after an interior gap.
use crate::indicators::moving_averages::ema::ema_seeded_scalar;
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use std::convert::AsRef;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum DemaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

impl<'a> AsRef<[f64]> for DemaInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            DemaData::Slice(slice) => slice,
            DemaData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemaParams {
    pub period: Option<usize>,
}

impl Default for DemaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

#[derive(Debug, Clone)]
pub struct DemaInput<'a> {
    pub data: DemaData<'a>,
    pub params: DemaParams,
}

impl<'a> DemaInput<'a> {
    #[inline]
    pub fn from_candles(c: &'a Candles, s: &'a str, p: DemaParams) -> Self {
        Self {
            data: DemaData::Candles {
                candles: c,
                source: s,
            },
            params: p,
        }
    }
    #[inline]
    pub fn from_slice(sl: &'a [f64], p: DemaParams) -> Self {
        Self {
            data: DemaData::Slice(sl),
            params: p,
        }
    }
    #[inline]
    pub fn with_default_candles(c: &'a Candles) -> Self {
        Self::from_candles(c, "close", DemaParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(30)
    }
}

#[derive(Debug, Clone)]
pub struct DemaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum DemaError {
    #[error("dema: Empty data provided.")]
    EmptyData,
    #[error("dema: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("dema: All values are NaN.")]
    AllValuesNaN,
    #[error("dema: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

#[inline(always)]
fn dema_prepare<'a>(input: &'a DemaInput) -> Result<(&'a [f64], usize, usize), DemaError> {
    let data = input.as_ref();
    let len = data.len();
    if len == 0 {
        return Err(DemaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(DemaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(DemaError::AllValuesNaN)?;
    let needed = 2 * (period - 1) + 1;
    let valid = longest_valid_run(data);
    if valid < needed {
        return Err(DemaError::NotEnoughValidData { needed, valid });
    }
    Ok((data, period, needed))
}

pub fn dema(input: &DemaInput) -> Result<DemaOutput, DemaError> {
    let (data, period, needed) = dema_prepare(input)?;
    let mut out = alloc_with_nan_prefix(data.len(), data.len());
    for_each_valid_run(data, needed, &mut out, |seg, dst| {
        dema_segment(seg, period, dst)
    });
    Ok(DemaOutput { values: out })
}

/// `data` is gap-free; `out` keeps its contents before the warm-up index.
fn dema_segment(data: &[f64], period: usize, out: &mut [f64]) {
    let len = data.len();
    let alpha = 2.0 / (period as f64 + 1.0);

    let first2 = period - 1;
    let mut e1 = alloc_with_nan_prefix(len, first2);
    ema_seeded_scalar(data, period, alpha, 0, &mut e1);

    let warm = first2 + period - 1;
    let mut e2 = alloc_with_nan_prefix(len, warm);
    ema_seeded_scalar(&e1, period, alpha, first2, &mut e2);

    for i in warm..len {
        out[i] = 2.0 * e1[i] - e2[i];
    }
}
