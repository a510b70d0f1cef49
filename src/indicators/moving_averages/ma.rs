//! Moving-average selection by tag.
//!
//! `MaType` names every smoothing the crate implements; `ma` dispatches to the
//! matching module and flattens its error into `MaError`.
use crate::indicators::moving_averages::{
    dema::{dema, DemaError, DemaInput, DemaParams},
    ema::{ema, EmaError, EmaInput, EmaParams},
    hma::{hma, HmaError, HmaInput, HmaParams},
    linreg::{linreg, LinRegError, LinRegInput, LinRegParams},
    sma::{sma, SmaError, SmaInput, SmaParams},
    tema::{tema, TemaError, TemaInput, TemaParams},
    trima::{trima, TrimaError, TrimaInput, TrimaParams},
    wilders::{wilders, WildersError, WildersInput, WildersParams},
    wma::{wma, WmaError, WmaInput, WmaParams},
    zlema::{zlema, ZlemaError, ZlemaInput, ZlemaParams},
};
use crate::utilities::data_loader::{source_type, Candles};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
    #[strum(to_string = "rma", serialize = "wilders")]
    #[serde(rename = "rma", alias = "wilders")]
    Rma,
    Wma,
    Dema,
    Tema,
    Trima,
    Hma,
    #[strum(to_string = "zlma", serialize = "zlema")]
    #[serde(rename = "zlma", alias = "zlema")]
    Zlma,
    Linreg,
}

impl MaType {
    /// Parses a tag, falling back to `Sma` when it is absent or unrecognized.
    pub fn resolve(name: Option<&str>) -> MaType {
        match name {
            None => MaType::default(),
            Some(s) => MaType::from_str(s.trim()).unwrap_or_else(|_| {
                log::debug!("unknown moving average '{}', falling back to sma", s);
                MaType::default()
            }),
        }
    }

    /// Smallest period the average accepts.
    pub const fn min_period(self) -> usize {
        match self {
            MaType::Hma | MaType::Linreg => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MaData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MaError {
    #[error("ma({ma_type}): Empty data provided.")]
    EmptyData { ma_type: MaType },
    #[error("ma({ma_type}): Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod {
        ma_type: MaType,
        period: usize,
        data_len: usize,
    },
    #[error("ma({ma_type}): All values are NaN.")]
    AllValuesNaN { ma_type: MaType },
    #[error("ma({ma_type}): Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData {
        ma_type: MaType,
        needed: usize,
        valid: usize,
    },
}

impl MaError {
    /// True when the input was simply too short (or blank) to produce a value.
    pub fn is_insufficient(&self) -> bool {
        matches!(
            self,
            MaError::AllValuesNaN { .. } | MaError::NotEnoughValidData { .. }
        )
    }
}

macro_rules! flatten_ma_error {
    ($($err:ident => $tag:expr),* $(,)?) => {
        $(
            impl From<$err> for MaError {
                fn from(e: $err) -> Self {
                    let ma_type = $tag;
                    match e {
                        $err::EmptyData => MaError::EmptyData { ma_type },
                        $err::InvalidPeriod { period, data_len } => {
                            MaError::InvalidPeriod { ma_type, period, data_len }
                        }
                        $err::AllValuesNaN => MaError::AllValuesNaN { ma_type },
                        $err::NotEnoughValidData { needed, valid } => {
                            MaError::NotEnoughValidData { ma_type, needed, valid }
                        }
                    }
                }
            }
        )*
    };
}

flatten_ma_error!(
    SmaError => MaType::Sma,
    EmaError => MaType::Ema,
    WildersError => MaType::Rma,
    WmaError => MaType::Wma,
    DemaError => MaType::Dema,
    TemaError => MaType::Tema,
    TrimaError => MaType::Trima,
    HmaError => MaType::Hma,
    ZlemaError => MaType::Zlma,
    LinRegError => MaType::Linreg,
);

pub fn ma(ma_type: MaType, data: MaData, period: usize) -> Result<Vec<f64>, MaError> {
    let slice: &[f64] = match data {
        MaData::Candles { candles, source } => source_type(candles, source),
        MaData::Slice(s) => s,
    };
    let period = Some(period);

    let values = match ma_type {
        MaType::Sma => sma(&SmaInput::from_slice(slice, SmaParams { period }))?.values,
        MaType::Ema => ema(&EmaInput::from_slice(slice, EmaParams { period }))?.values,
        MaType::Rma => {
            wilders(&WildersInput::from_slice(slice, WildersParams { period }))?.values
        }
        MaType::Wma => wma(&WmaInput::from_slice(slice, WmaParams { period }))?.values,
        MaType::Dema => dema(&DemaInput::from_slice(slice, DemaParams { period }))?.values,
        MaType::Tema => tema(&TemaInput::from_slice(slice, TemaParams { period }))?.values,
        MaType::Trima => trima(&TrimaInput::from_slice(slice, TrimaParams { period }))?.values,
        MaType::Hma => hma(&HmaInput::from_slice(slice, HmaParams { period }))?.values,
        MaType::Zlma => zlema(&ZlemaInput::from_slice(slice, ZlemaParams { period }))?.values,
        MaType::Linreg => {
            linreg(&LinRegInput::from_slice(slice, LinRegParams { period }))?.values
        }
    };
    Ok(values)
}

/// Like [`ma`], but a too-short or blank input yields an all-`NaN` series.
pub fn ma_or_nan(ma_type: MaType, data: &[f64], period: usize) -> Result<Vec<f64>, MaError> {
    match ma(ma_type, MaData::Slice(data), period) {
        Ok(v) => Ok(v),
        Err(e) if e.is_insufficient() => {
            log::debug!("{}; returning an all-NaN series", e);
            Ok(vec![f64::NAN; data.len()])
        }
        Err(e) => Err(e),
    }
}
