use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum WmaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct WmaOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct WmaParams {
    pub period: Option<usize>,
}

impl Default for WmaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

#[derive(Debug, Clone)]
pub struct WmaInput<'a> {
    pub data: WmaData<'a>,
    pub params: WmaParams,
}

impl<'a> WmaInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: WmaParams) -> Self {
        Self {
            data: WmaData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: WmaParams) -> Self {
        Self {
            data: WmaData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", WmaParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(30)
    }
}

#[derive(Debug, Error)]
pub enum WmaError {
    #[error("wma: Empty data provided.")]
    EmptyData,
    #[error("wma: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("wma: All values are NaN.")]
    AllValuesNaN,
    #[error("wma: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

/// Linearly weighted average, newest value weighted `period`.
pub fn wma(input: &WmaInput) -> Result<WmaOutput, WmaError> {
    let data: &[f64] = match &input.data {
        WmaData::Candles { candles, source } => source_type(candles, source),
        WmaData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(WmaError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(WmaError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(WmaError::AllValuesNaN)?;
    let valid = longest_valid_run(data);
    if valid < period {
        return Err(WmaError::NotEnoughValidData {
            needed: period,
            valid,
        });
    }

    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, period, &mut out, |seg, dst| {
        wma_scalar(seg, period, 0, dst)
    });
    Ok(WmaOutput { values: out })
}

#[inline]
pub fn wma_scalar(data: &[f64], period: usize, first: usize, out: &mut [f64]) {
    let lookback = period - 1;
    let divider = ((period * (period + 1)) >> 1) as f64;
    let p = period as f64;

    let mut weighted_sum = 0.0;
    let mut plain_sum = 0.0;
    for (k, &val) in data[first..first + lookback].iter().enumerate() {
        weighted_sum += (k as f64 + 1.0) * val;
        plain_sum += val;
    }

    for i in (first + lookback)..data.len() {
        let val = data[i];
        weighted_sum += p * val;
        plain_sum += val;
        out[i] = weighted_sum / divider;
        weighted_sum -= plain_sum;
        plain_sum -= data[i - lookback];
    }
}
