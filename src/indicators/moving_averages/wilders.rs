//! # Wilder's Moving Average (RMA)
//!
//! Exponential smoothing with `alpha = 1 / period`, seeded with the simple
//! average of the first `period` valid values.
use crate::indicators::moving_averages::ema::ema_seeded_scalar;
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::helpers::{
    alloc_with_nan_prefix, first_valid_index, for_each_valid_run, longest_valid_run,
};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum WildersData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct WildersOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct WildersParams {
    pub period: Option<usize>,
}

impl Default for WildersParams {
    fn default() -> Self {
        Self { period: Some(5) }
    }
}

#[derive(Debug, Clone)]
pub struct WildersInput<'a> {
    pub data: WildersData<'a>,
    pub params: WildersParams,
}

impl<'a> WildersInput<'a> {
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: WildersParams) -> Self {
        Self {
            data: WildersData::Candles { candles, source },
            params,
        }
    }

    pub fn from_slice(slice: &'a [f64], params: WildersParams) -> Self {
        Self {
            data: WildersData::Slice(slice),
            params,
        }
    }

    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", WildersParams::default())
    }

    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(5)
    }
}

#[derive(Debug, Error)]
pub enum WildersError {
    #[error("wilders: Empty data provided.")]
    EmptyData,
    #[error("wilders: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("wilders: All values are NaN.")]
    AllValuesNaN,
    #[error("wilders: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
}

pub fn wilders(input: &WildersInput) -> Result<WildersOutput, WildersError> {
    let data: &[f64] = match &input.data {
        WildersData::Candles { candles, source } => source_type(candles, source),
        WildersData::Slice(slice) => slice,
    };
    let len = data.len();
    if len == 0 {
        return Err(WildersError::EmptyData);
    }
    let period = input.get_period();
    if period == 0 {
        return Err(WildersError::InvalidPeriod {
            period,
            data_len: len,
        });
    }
    first_valid_index(data).ok_or(WildersError::AllValuesNaN)?;
    let valid = longest_valid_run(data);
    if valid < period {
        return Err(WildersError::NotEnoughValidData {
            needed: period,
            valid,
        });
    }

    let alpha = 1.0 / period as f64;
    let mut out = alloc_with_nan_prefix(len, len);
    for_each_valid_run(data, period, &mut out, |seg, dst| {
        ema_seeded_scalar(seg, period, alpha, 0, dst)
    });
    Ok(WildersOutput { values: out })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wilders_known_values() {
        let data = [1.0, 2.0, 3.0, 6.0, 9.0];
        let out = wilders(&WildersInput::from_slice(
            &data,
            WildersParams { period: Some(3) },
        ))
        .expect("wilders failed")
        .values;
        assert!(out[0].is_nan() && out[1].is_nan());
        assert_eq!(out[2], 2.0);
        let w3 = 2.0 + (6.0 - 2.0) / 3.0;
        assert!((out[3] - w3).abs() < 1e-12);
        assert!((out[4] - (w3 + (9.0 - w3) / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_wilders_zero_period() {
        let data = [1.0, 2.0];
        let res = wilders(&WildersInput::from_slice(
            &data,
            WildersParams { period: Some(0) },
        ));
        assert!(matches!(res, Err(WildersError::InvalidPeriod { .. })));
    }
}
