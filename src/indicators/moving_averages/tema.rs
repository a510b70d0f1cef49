//! # Triple Exponential Moving Average (TEMA)
//!
//! `tema = 3 * e1 - 3 * e2 + e3` where `e1 = ema(x)`, `e2 = ema(e1)`, `e3 = ema(e2)`.
//! The first value lands at `first_valid + 3 * (period - 1)`, and again that far
//! past the end of any interior gap.
use crate::indicators::moving_averages::ema::ema_seeded_scalar;
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use std::convert::AsRef;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum TemaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

impl<'a> AsRef<[f64]> for TemaInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            TemaData::Slice(slice) => slice,
            TemaData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemaParams {
    pub period: Option<usize>,
}

impl Default for TemaParams {
    fn default() -> Self {
        Self { period: Some(9) }
    }
}

#[derive(Debug, Clone)]
pub struct TemaInput<'a> {
    pub data: TemaData<'a>,
    pub params: TemaParams,
}

impl<'a> TemaInput<'a> {
    #[inline]
    pub fn from_candles(c: &'a Candles, s: &'a str, p: TemaParams) -> Self {
        Self {
            data: TemaData::Candles {
                candles: c,
                source: s,
            },
            params: p,
        }
    }
    #[inline]
    pub fn from_slice(sl: &'a [f64], p: TemaParams) -> Self {
        Self {
            data: TemaData::Slice(sl),
            params: p,
        }
    }
    #[inline]
    pub fn with_default_candles(c: &'a Candles) -> Self {
        Self::from_candles(c, "close", TemaParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(9)
    }
}

#[derive(Debug, Clone)]
pub struct TemaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum TemaError {
    #[error("tema: Empty data provided.")]
    EmptyData,
    #[error("tema: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("tema: All values are NaN.")]
    AllValuesNaN,
    #[error("tema: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

pub fn tema(input: &TemaInput) -> Result<TemaOutput, TemaError> {
    let data = input.as_ref();
    let len = data.len();
    if len == 0 {
        return Err(TemaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(TemaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(TemaError::AllValuesNaN)?;
    let needed = 3 * (period - 1) + 1;
    let valid = longest_valid_run(data);
    if valid < needed {
        return Err(TemaError::NotEnoughValidData { needed, valid });
    }

    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, needed, &mut out, |seg, dst| {
        tema_segment(seg, period, dst)
    });
    Ok(TemaOutput { values: out })
}

fn tema_segment(data: &[f64], period: usize, out: &mut [f64]) {
    let len = data.len();
    let alpha = 2.0 / (period as f64 + 1.0);
    let lag = period - 1;

    let mut e1 = alloc_with_nan_prefix(len, lag);
    ema_seeded_scalar(data, period, alpha, 0, &mut e1);
    let mut e2 = alloc_with_nan_prefix(len, 2 * lag);
    ema_seeded_scalar(&e1, period, alpha, lag, &mut e2);
    let warm = 3 * lag;
    let mut e3 = alloc_with_nan_prefix(len, warm);
    ema_seeded_scalar(&e2, period, alpha, 2 * lag, &mut e3);

    for i in warm..len {
        out[i] = 3.0 * e1[i] - 3.0 * e2[i] + e3[i];
    }
}
