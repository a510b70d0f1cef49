//! # Triangular Moving Average (TRIMA)
//!
//! Two nested simple averages: with `m1 = (period + 1) / 2` and
//! `m2 = period - m1 + 1`, `trima = sma(sma(x, m1), m2)`. The weights form a
//! triangle peaking in the middle of the window.
use crate::indicators::moving_averages::sma::sma_scalar;
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum TrimaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct TrimaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TrimaParams {
    pub period: Option<usize>,
}

impl Default for TrimaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

#[derive(Debug, Clone)]
pub struct TrimaInput<'a> {
    pub data: TrimaData<'a>,
    pub params: TrimaParams,
}

impl<'a> TrimaInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: TrimaParams) -> Self {
        Self {
            data: TrimaData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: TrimaParams) -> Self {
        Self {
            data: TrimaData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", TrimaParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(30)
    }
}

#[derive(Debug, Error)]
pub enum TrimaError {
    #[error("trima: Empty data provided.")]
    EmptyData,
    #[error("trima: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("trima: All values are NaN.")]
    AllValuesNaN,
    #[error("trima: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

pub fn trima(input: &TrimaInput) -> Result<TrimaOutput, TrimaError> {
    let data: &[f64] = match &input.data {
        TrimaData::Candles { candles, source } => source_type(candles, source),
        TrimaData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(TrimaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(TrimaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(TrimaError::AllValuesNaN)?;
    let valid = longest_valid_run(data);
    if valid < period {
        return Err(TrimaError::NotEnoughValidData {
            needed: period,
            valid,
        });
    }

    let m1 = (period + 1) / 2;
    let m2 = period - m1 + 1;
    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, period, &mut out, |seg, dst| {
        let first2 = m1 - 1;
        let mut pass1 = alloc_with_nan_prefix(seg.len(), first2);
        sma_scalar(seg, m1, 0, &mut pass1);
        sma_scalar(&pass1, m2, first2, dst);
    });
    Ok(TrimaOutput { values: out })
}
