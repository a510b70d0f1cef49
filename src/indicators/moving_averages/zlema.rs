//! # Zero-Lag Exponential Moving Average (ZLEMA)
//!
//! An EMA over the de-lagged series `2 * x[i] - x[i - lag]`, `lag = (period - 1) / 2`.
use crate::indicators::moving_averages::ema::ema_seeded_scalar;
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum ZlemaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct ZlemaParams {
    pub period: Option<usize>,
}

impl Default for ZlemaParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

#[derive(Debug, Clone)]
pub struct ZlemaInput<'a> {
    pub data: ZlemaData<'a>,
    pub params: ZlemaParams,
}

impl<'a> ZlemaInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: ZlemaParams) -> Self {
        Self {
            data: ZlemaData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: ZlemaParams) -> Self {
        Self {
            data: ZlemaData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", ZlemaParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(14)
    }
}

#[derive(Debug, Clone)]
pub struct ZlemaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum ZlemaError {
    #[error("zlema: Empty data provided.")]
    EmptyData,
    #[error("zlema: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("zlema: All values are NaN.")]
    AllValuesNaN,
    #[error("zlema: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

pub fn zlema(input: &ZlemaInput) -> Result<ZlemaOutput, ZlemaError> {
    let data: &[f64] = match &input.data {
        ZlemaData::Candles { candles, source } => source_type(candles, source),
        ZlemaData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(ZlemaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(ZlemaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(ZlemaError::AllValuesNaN)?;
    let lag = (period - 1) / 2;
    let needed = lag + period;
    let valid = longest_valid_run(data);
    if valid < needed {
        return Err(ZlemaError::NotEnoughValidData { needed, valid });
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, needed, &mut out, |seg, dst| {
        let mut delagged = alloc_with_nan_prefix(seg.len(), lag);
        for i in lag..seg.len() {
            delagged[i] = 2.0 * seg[i] - seg[i - lag];
        }
        ema_seeded_scalar(&delagged, period, alpha, lag, dst);
    });
    Ok(ZlemaOutput { values: out })
}
