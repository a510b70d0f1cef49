//! # Time Segmented Value (TSV)
//!
//! Accumulates volume weighted by price change over a rolling window, then
//! smooths the result into a signal line and reports their ratio.
//!
//! ## Parameters
//! - **length**: Accumulation window. Defaults to 18.
//! - **signal**: Smoothing period of the signal line. Defaults to 10.
//! - **mamode**: Moving average used for the signal line. Defaults to `sma`.
//! - **drift**: Lag of the price difference. Defaults to 1.
//! - **offset**: Post-hoc shift of every output. Defaults to 0.
//! - **fillna** / **fill_method**: Optional `NaN` replacement, value first.
//! - **volume_sign**: `Absolute` (default) drops the sign of the signed volume
//!   before weighting; `Signed` keeps it.
//! - **signal_offset**: With a non-zero offset, `Period` (default) shifts a
//!   series holding the smoothing period itself into the signal column;
//!   `Smoothed` shifts the smoothed line.
//!
//! ## Errors
//! - **EmptyData**: tsv: Input series are empty.
//! - **MismatchedLength**: tsv: `close` and `volume` differ in length.
//! - **InvalidClose** / **InvalidVolume**: tsv: A series is entirely `NaN`.
//! - **OutputLengthMismatch**: tsv: A destination buffer has the wrong size.
//! - **MovingAverage**: tsv: The signal moving average rejected its input.
//! - **EmptyParameterGrid**: tsv: A batch sweep expanded to no combinations.
//!
//! Parameters are never rejected; invalid values fall back to their defaults.
//! A window too short for the signal line yields an all-`NaN` signal.
use crate::indicators::moving_averages::ma::{ma_or_nan, MaError, MaType};
use crate::indicators::utility_functions::{
    diff, fill_value, fill_with_method, get_drift, get_offset, rolling_sum_into, shift_in_place,
    signed_series, verify_series, zero, SeriesError,
};
use crate::utilities::data_loader::{source_type, Candles};
use crate::utilities::enums::FillMethod;
use crate::utilities::helpers::{alloc_with_nan_prefix, expand_axis};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub const DEFAULT_LENGTH: usize = 18;
pub const DEFAULT_SIGNAL: usize = 10;
pub const CATEGORY: &str = "volume";

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VolumeSign {
    #[default]
    Absolute,
    Signed,
}

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignalOffsetSource {
    #[default]
    Period,
    Smoothed,
}

#[derive(Debug, Clone)]
pub enum TsvData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slices {
        close: &'a [f64],
        volume: &'a [f64],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsvParams {
    pub length: Option<usize>,
    pub signal: Option<usize>,
    #[serde(deserialize_with = "lenient_ma_type")]
    pub mamode: Option<MaType>,
    pub drift: Option<usize>,
    pub offset: Option<isize>,
    pub fillna: Option<f64>,
    pub fill_method: Option<FillMethod>,
    pub volume_sign: Option<VolumeSign>,
    pub signal_offset: Option<SignalOffsetSource>,
}

impl Default for TsvParams {
    fn default() -> Self {
        Self {
            length: Some(DEFAULT_LENGTH),
            signal: Some(DEFAULT_SIGNAL),
            mamode: Some(MaType::Sma),
            drift: Some(1),
            offset: Some(0),
            fillna: None,
            fill_method: None,
            volume_sign: Some(VolumeSign::Absolute),
            signal_offset: Some(SignalOffsetSource::Period),
        }
    }
}

/// Unknown moving-average names in configuration resolve to `sma`.
fn lenient_ma_type<'de, D>(deserializer: D) -> Result<Option<MaType>, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name.map(|n| MaType::resolve(Some(&n))))
}

#[derive(Debug, Clone)]
pub struct TsvInput<'a> {
    pub data: TsvData<'a>,
    pub params: TsvParams,
}

impl<'a> TsvInput<'a> {
    #[inline]
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: TsvParams) -> Self {
        Self {
            data: TsvData::Candles { candles, source },
            params,
        }
    }

    #[inline]
    pub fn from_slices(close: &'a [f64], volume: &'a [f64], params: TsvParams) -> Self {
        Self {
            data: TsvData::Slices { close, volume },
            params,
        }
    }

    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", TsvParams::default())
    }

    #[inline]
    pub fn get_length(&self) -> usize {
        positive_or(self.params.length, DEFAULT_LENGTH, "length")
    }

    #[inline]
    pub fn get_signal(&self) -> usize {
        positive_or(self.params.signal, DEFAULT_SIGNAL, "signal")
    }

    #[inline]
    pub fn get_mamode(&self) -> MaType {
        self.params.mamode.unwrap_or_default()
    }

    #[inline]
    pub fn get_drift(&self) -> usize {
        get_drift(self.params.drift)
    }

    #[inline]
    pub fn get_offset(&self) -> isize {
        get_offset(self.params.offset)
    }

    #[inline]
    pub fn get_volume_sign(&self) -> VolumeSign {
        self.params.volume_sign.unwrap_or_default()
    }

    #[inline]
    pub fn get_signal_offset(&self) -> SignalOffsetSource {
        self.params.signal_offset.unwrap_or_default()
    }

    fn series(&self) -> (&'a [f64], &'a [f64]) {
        match &self.data {
            TsvData::Candles { candles, source } => {
                (source_type(candles, source), candles.volume.as_slice())
            }
            TsvData::Slices { close, volume } => (*close, *volume),
        }
    }
}

#[inline]
fn positive_or(value: Option<usize>, default: usize, what: &str) -> usize {
    match value {
        Some(v) if v > 0 => v,
        Some(v) => {
            log::debug!("tsv: {} = {} is not positive, using {}", what, v, default);
            default
        }
        None => default,
    }
}

/// Parameters after normalization. `signal` names the outputs; `ma_period` is
/// the same value raised to the smoothing mode's minimum.
#[derive(Debug, Clone, Copy)]
struct TsvResolved {
    length: usize,
    signal: usize,
    ma_period: usize,
    mamode: MaType,
    drift: usize,
    offset: isize,
    fillna: Option<f64>,
    fill_method: Option<FillMethod>,
    volume_sign: VolumeSign,
    signal_offset: SignalOffsetSource,
}

impl TsvResolved {
    fn from_params(params: &TsvParams) -> Self {
        let mamode = params.mamode.unwrap_or_default();
        let signal = positive_or(params.signal, DEFAULT_SIGNAL, "signal");
        let ma_period = signal.max(mamode.min_period());
        if ma_period != signal {
            log::debug!(
                "tsv: signal = {} is below the {} minimum, smoothing over {}",
                signal,
                mamode,
                ma_period
            );
        }
        Self {
            length: positive_or(params.length, DEFAULT_LENGTH, "length"),
            signal,
            ma_period,
            mamode,
            drift: get_drift(params.drift),
            offset: get_offset(params.offset),
            fillna: params.fillna,
            fill_method: params.fill_method,
            volume_sign: params.volume_sign.unwrap_or_default(),
            signal_offset: params.signal_offset.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TsvOutput {
    pub tsv: Vec<f64>,
    pub signal: Vec<f64>,
    pub ratio: Vec<f64>,
    pub length: usize,
    pub signal_period: usize,
}

impl TsvOutput {
    pub fn name(&self) -> String {
        self.tsv_name()
    }

    pub fn tsv_name(&self) -> String {
        format!("TSV_{}_{}", self.length, self.signal_period)
    }

    pub fn signal_name(&self) -> String {
        format!("TSVs_{}_{}", self.length, self.signal_period)
    }

    pub fn ratio_name(&self) -> String {
        format!("TSVr_{}_{}", self.length, self.signal_period)
    }

    pub fn category(&self) -> &'static str {
        CATEGORY
    }

    pub fn columns(&self) -> [(String, &[f64]); 3] {
        [
            (self.tsv_name(), self.tsv.as_slice()),
            (self.signal_name(), self.signal.as_slice()),
            (self.ratio_name(), self.ratio.as_slice()),
        ]
    }

    /// Packages the three series into a named table, optionally indexed by
    /// timestamps of the same length.
    pub fn to_table(&self, index: Option<&[i64]>) -> Result<TsvTable, TsvError> {
        if let Some(ix) = index {
            if ix.len() != self.tsv.len() {
                return Err(TsvError::OutputLengthMismatch {
                    expected: self.tsv.len(),
                    got: ix.len(),
                });
            }
        }
        Ok(TsvTable {
            name: self.name(),
            category: CATEGORY,
            index: index.map(<[i64]>::to_vec),
            columns: self
                .columns()
                .into_iter()
                .map(|(name, values)| TsvColumn {
                    name,
                    values: values.to_vec(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TsvColumn {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TsvTable {
    pub name: String,
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<i64>>,
    pub columns: Vec<TsvColumn>,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct TsvBuilder {
    length: Option<usize>,
    signal: Option<usize>,
    mamode: Option<MaType>,
    drift: Option<usize>,
    offset: Option<isize>,
    fillna: Option<f64>,
    fill_method: Option<FillMethod>,
    volume_sign: Option<VolumeSign>,
    signal_offset: Option<SignalOffsetSource>,
}

impl TsvBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline(always)]
    pub fn length(mut self, n: usize) -> Self {
        self.length = Some(n);
        self
    }
    #[inline(always)]
    pub fn signal(mut self, n: usize) -> Self {
        self.signal = Some(n);
        self
    }
    #[inline(always)]
    pub fn mamode(mut self, m: MaType) -> Self {
        self.mamode = Some(m);
        self
    }
    /// Sets the moving average by name; unknown names resolve to `sma`.
    #[inline(always)]
    pub fn mamode_name(mut self, name: &str) -> Self {
        self.mamode = Some(MaType::resolve(Some(name)));
        self
    }
    #[inline(always)]
    pub fn drift(mut self, n: usize) -> Self {
        self.drift = Some(n);
        self
    }
    #[inline(always)]
    pub fn offset(mut self, k: isize) -> Self {
        self.offset = Some(k);
        self
    }
    #[inline(always)]
    pub fn fillna(mut self, v: f64) -> Self {
        self.fillna = Some(v);
        self
    }
    #[inline(always)]
    pub fn fill_method(mut self, m: FillMethod) -> Self {
        self.fill_method = Some(m);
        self
    }
    #[inline(always)]
    pub fn volume_sign(mut self, s: VolumeSign) -> Self {
        self.volume_sign = Some(s);
        self
    }
    #[inline(always)]
    pub fn signal_offset(mut self, s: SignalOffsetSource) -> Self {
        self.signal_offset = Some(s);
        self
    }

    fn params(&self) -> TsvParams {
        TsvParams {
            length: self.length,
            signal: self.signal,
            mamode: self.mamode,
            drift: self.drift,
            offset: self.offset,
            fillna: self.fillna,
            fill_method: self.fill_method,
            volume_sign: self.volume_sign,
            signal_offset: self.signal_offset,
        }
    }

    #[inline(always)]
    pub fn apply(self, c: &Candles) -> Result<TsvOutput, TsvError> {
        let i = TsvInput::from_candles(c, "close", self.params());
        tsv(&i)
    }

    #[inline(always)]
    pub fn apply_slices(self, close: &[f64], volume: &[f64]) -> Result<TsvOutput, TsvError> {
        let i = TsvInput::from_slices(close, volume, self.params());
        tsv(&i)
    }
}

#[derive(Debug, Error)]
pub enum TsvError {
    #[error("tsv: Empty data provided.")]
    EmptyData,
    #[error("tsv: Mismatched input lengths: close = {close}, volume = {volume}")]
    MismatchedLength { close: usize, volume: usize },
    #[error("tsv: Invalid close series: {0}")]
    InvalidClose(SeriesError),
    #[error("tsv: Invalid volume series: {0}")]
    InvalidVolume(SeriesError),
    #[error("tsv: Output length mismatch: expected = {expected}, got = {got}")]
    OutputLengthMismatch { expected: usize, got: usize },
    #[error("tsv: Signal moving average failed: {0}")]
    MovingAverage(#[from] MaError),
    #[error("tsv: Parameter grid is empty.")]
    EmptyParameterGrid,
}

#[inline]
fn validate_series(close: &[f64], volume: &[f64]) -> Result<(), TsvError> {
    if close.len() != volume.len() {
        return Err(TsvError::MismatchedLength {
            close: close.len(),
            volume: volume.len(),
        });
    }
    if close.is_empty() {
        return Err(TsvError::EmptyData);
    }
    verify_series(close).map_err(TsvError::InvalidClose)?;
    verify_series(volume).map_err(TsvError::InvalidVolume)?;
    Ok(())
}

#[inline]
fn tsv_prepare<'a>(
    input: &'a TsvInput,
) -> Result<(&'a [f64], &'a [f64], TsvResolved), TsvError> {
    let (close, volume) = input.series();
    validate_series(close, volume)?;
    Ok((close, volume, TsvResolved::from_params(&input.params)))
}

/// Volume signed by the direction of each close-to-close move, snapped to
/// zero. `Absolute` flips negative entries positive.
pub fn tsv_signed_volume(close: &[f64], volume: &[f64], mode: VolumeSign) -> Vec<f64> {
    signed_series(close, 1.0, 1)
        .into_iter()
        .zip(volume)
        .map(|(sign, &v)| {
            let sv = v * sign;
            let sv = match mode {
                VolumeSign::Absolute if sv < 0.0 => -sv,
                _ => sv,
            };
            zero(sv)
        })
        .collect()
}

/// Signed volume times the `drift`-period price change; `NaN` for `i < drift`.
pub fn tsv_cvd(close: &[f64], volume: &[f64], drift: usize, mode: VolumeSign) -> Vec<f64> {
    tsv_signed_volume(close, volume, mode)
        .into_iter()
        .zip(diff(close, drift))
        .map(|(sv, change)| sv * change)
        .collect()
}

/// Everything downstream of the price-volume product: accumulation, signal,
/// ratio, offset and fills, written into the three destinations.
fn tsv_row_into(
    cvd: &[f64],
    cfg: &TsvResolved,
    tsv_out: &mut [f64],
    signal_out: &mut [f64],
    ratio_out: &mut [f64],
) -> Result<(), TsvError> {
    rolling_sum_into(cvd, cfg.length, tsv_out);

    let smoothed = ma_or_nan(cfg.mamode, tsv_out, cfg.ma_period)?;
    signal_out.copy_from_slice(&smoothed);

    for ((r, &t), &s) in ratio_out.iter_mut().zip(tsv_out.iter()).zip(signal_out.iter()) {
        *r = t / s;
    }

    if cfg.offset != 0 {
        if cfg.signal_offset == SignalOffsetSource::Period {
            signal_out.fill(cfg.signal as f64);
        }
        shift_in_place(tsv_out, cfg.offset);
        shift_in_place(signal_out, cfg.offset);
        shift_in_place(ratio_out, cfg.offset);
    }

    for out in [tsv_out, signal_out, ratio_out] {
        if let Some(v) = cfg.fillna {
            fill_value(out, v);
        }
        if let Some(m) = cfg.fill_method {
            fill_with_method(out, m);
        }
    }
    Ok(())
}

#[inline]
fn tsv_compute_into(
    close: &[f64],
    volume: &[f64],
    cfg: &TsvResolved,
    tsv_out: &mut [f64],
    signal_out: &mut [f64],
    ratio_out: &mut [f64],
) -> Result<(), TsvError> {
    let cvd = tsv_cvd(close, volume, cfg.drift, cfg.volume_sign);
    tsv_row_into(&cvd, cfg, tsv_out, signal_out, ratio_out)
}

pub fn tsv(input: &TsvInput) -> Result<TsvOutput, TsvError> {
    let (close, volume, cfg) = tsv_prepare(input)?;
    let len = close.len();
    let warmup = cfg.length - 1;
    let mut tsv = alloc_with_nan_prefix(len, warmup);
    let mut signal = alloc_with_nan_prefix(len, warmup);
    let mut ratio = alloc_with_nan_prefix(len, warmup);

    tsv_compute_into(close, volume, &cfg, &mut tsv, &mut signal, &mut ratio)?;

    Ok(TsvOutput {
        tsv,
        signal,
        ratio,
        length: cfg.length,
        signal_period: cfg.signal,
    })
}

/// Writes the three outputs into caller-provided buffers of the input length.
#[inline]
pub fn tsv_into_slices(
    tsv_dst: &mut [f64],
    signal_dst: &mut [f64],
    ratio_dst: &mut [f64],
    input: &TsvInput,
) -> Result<(), TsvError> {
    let (close, volume, cfg) = tsv_prepare(input)?;
    let expected = close.len();
    for got in [tsv_dst.len(), signal_dst.len(), ratio_dst.len()] {
        if got != expected {
            return Err(TsvError::OutputLengthMismatch { expected, got });
        }
    }
    tsv_compute_into(close, volume, &cfg, tsv_dst, signal_dst, ratio_dst)
}

#[derive(Clone, Debug)]
pub struct TsvBatchRange {
    pub length: (usize, usize, usize),
    pub signal: (usize, usize, usize),
}

impl Default for TsvBatchRange {
    fn default() -> Self {
        Self {
            length: (DEFAULT_LENGTH, DEFAULT_LENGTH, 0),
            signal: (DEFAULT_SIGNAL, DEFAULT_SIGNAL, 0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TsvBatchBuilder {
    range: TsvBatchRange,
    shared: TsvParams,
    parallel: bool,
}

impl Default for TsvBatchBuilder {
    fn default() -> Self {
        Self {
            range: TsvBatchRange::default(),
            shared: TsvParams::default(),
            parallel: true,
        }
    }
}

impl TsvBatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn length_range(mut self, start: usize, end: usize, step: usize) -> Self {
        self.range.length = (start, end, step);
        self
    }
    pub fn signal_range(mut self, start: usize, end: usize, step: usize) -> Self {
        self.range.signal = (start, end, step);
        self
    }
    pub fn mamode(mut self, m: MaType) -> Self {
        self.shared.mamode = Some(m);
        self
    }
    pub fn drift(mut self, n: usize) -> Self {
        self.shared.drift = Some(n);
        self
    }
    pub fn offset(mut self, k: isize) -> Self {
        self.shared.offset = Some(k);
        self
    }
    pub fn fillna(mut self, v: f64) -> Self {
        self.shared.fillna = Some(v);
        self
    }
    pub fn fill_method(mut self, m: FillMethod) -> Self {
        self.shared.fill_method = Some(m);
        self
    }
    pub fn volume_sign(mut self, s: VolumeSign) -> Self {
        self.shared.volume_sign = Some(s);
        self
    }
    pub fn signal_offset(mut self, s: SignalOffsetSource) -> Self {
        self.shared.signal_offset = Some(s);
        self
    }
    pub fn parallel(mut self, on: bool) -> Self {
        self.parallel = on;
        self
    }

    pub fn apply_slices(self, close: &[f64], volume: &[f64]) -> Result<TsvBatchOutput, TsvError> {
        tsv_batch_inner(close, volume, &self.range, &self.shared, self.parallel)
    }

    pub fn apply_candles(self, c: &Candles, source: &str) -> Result<TsvBatchOutput, TsvError> {
        let close = source_type(c, source);
        self.apply_slices(close, &c.volume)
    }
}

#[derive(Clone, Debug)]
pub struct TsvBatchOutput {
    pub tsv: Vec<f64>,
    pub signal: Vec<f64>,
    pub ratio: Vec<f64>,
    pub combos: Vec<TsvParams>,
    pub rows: usize,
    pub cols: usize,
}

impl TsvBatchOutput {
    pub fn row_for_params(&self, p: &TsvParams) -> Option<usize> {
        let length = positive_or(p.length, DEFAULT_LENGTH, "length");
        let signal = positive_or(p.signal, DEFAULT_SIGNAL, "signal");
        self.combos.iter().position(|c| {
            c.length.unwrap_or(DEFAULT_LENGTH) == length
                && c.signal.unwrap_or(DEFAULT_SIGNAL) == signal
        })
    }

    /// `(tsv, signal, ratio)` rows for the given length and signal period.
    pub fn values_for(&self, p: &TsvParams) -> Option<(&[f64], &[f64], &[f64])> {
        self.row_for_params(p).map(|row| {
            let start = row * self.cols;
            let end = start + self.cols;
            (
                &self.tsv[start..end],
                &self.signal[start..end],
                &self.ratio[start..end],
            )
        })
    }
}

/// Length and signal vary; every other field comes from `shared`. Zero
/// values are normalized here so combos carry the periods actually used.
fn expand_grid(r: &TsvBatchRange, shared: &TsvParams) -> Vec<TsvParams> {
    let lengths = expand_axis(r.length);
    let signals = expand_axis(r.signal);

    let mut out = Vec::with_capacity(lengths.len() * signals.len());
    for &length in &lengths {
        for &signal in &signals {
            let mut p = shared.clone();
            p.length = Some(length);
            p.signal = Some(signal);
            let resolved = TsvResolved::from_params(&p);
            p.length = Some(resolved.length);
            p.signal = Some(resolved.signal);
            out.push(p);
        }
    }
    out
}

#[inline(always)]
pub fn tsv_batch_slice(
    close: &[f64],
    volume: &[f64],
    sweep: &TsvBatchRange,
    shared: &TsvParams,
) -> Result<TsvBatchOutput, TsvError> {
    tsv_batch_inner(close, volume, sweep, shared, false)
}

#[inline(always)]
pub fn tsv_batch_par_slice(
    close: &[f64],
    volume: &[f64],
    sweep: &TsvBatchRange,
    shared: &TsvParams,
) -> Result<TsvBatchOutput, TsvError> {
    tsv_batch_inner(close, volume, sweep, shared, true)
}

fn tsv_batch_inner(
    close: &[f64],
    volume: &[f64],
    sweep: &TsvBatchRange,
    shared: &TsvParams,
    parallel: bool,
) -> Result<TsvBatchOutput, TsvError> {
    validate_series(close, volume)?;
    let combos = expand_grid(sweep, shared);
    if combos.is_empty() {
        return Err(TsvError::EmptyParameterGrid);
    }
    let rows = combos.len();
    let cols = close.len();

    // drift and sign handling are shared, so the price-volume product is too
    let base = TsvResolved::from_params(shared);
    let cvd = tsv_cvd(close, volume, base.drift, base.volume_sign);
    let configs: Vec<TsvResolved> = combos.iter().map(TsvResolved::from_params).collect();

    let mut tsv = vec![f64::NAN; rows * cols];
    let mut signal = vec![f64::NAN; rows * cols];
    let mut ratio = vec![f64::NAN; rows * cols];

    let do_row = |row: usize, t: &mut [f64], s: &mut [f64], r: &mut [f64]| {
        let cfg = &configs[row];
        log::trace!(
            "tsv batch row {}: length = {}, signal = {}",
            row,
            cfg.length,
            cfg.signal
        );
        tsv_row_into(&cvd, cfg, t, s, r)
    };

    if parallel {
        tsv.par_chunks_mut(cols)
            .zip(signal.par_chunks_mut(cols))
            .zip(ratio.par_chunks_mut(cols))
            .enumerate()
            .try_for_each(|(row, ((t, s), r))| do_row(row, t, s, r))?;
    } else {
        for (row, ((t, s), r)) in tsv
            .chunks_mut(cols)
            .zip(signal.chunks_mut(cols))
            .zip(ratio.chunks_mut(cols))
            .enumerate()
        {
            do_row(row, t, s, r)?;
        }
    }

    Ok(TsvBatchOutput {
        tsv,
        signal,
        ratio,
        combos,
        rows,
        cols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::moving_averages::ma::{ma, MaData};
    use crate::indicators::utility_functions::shift;
    use crate::utilities::data_loader::read_candles_from_csv;
    use proptest::prelude::*;
    use std::error::Error;

    type TestResult = Result<(), Box<dyn Error>>;

    const FIXTURE: &str = "src/data/sample_4h.csv";

    fn same_bits(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
    }

    fn close_or_both_nan(a: f64, b: f64, tol: f64) -> bool {
        (a.is_nan() && b.is_nan()) || (a - b).abs() <= tol
    }

    fn reference_close() -> Vec<f64> {
        [
            10, 11, 9, 12, 13, 11, 14, 15, 13, 16, 18, 17, 19, 20, 18, 21, 22, 20, 23, 24,
        ]
        .iter()
        .map(|&x| x as f64)
        .collect()
    }

    /// 80 bars with volume missing on bars 30..33.
    fn gapped_series() -> (Vec<f64>, Vec<f64>) {
        let close = (0..80)
            .map(|i| 100.0 + 5.0 * (i as f64 * 0.7).sin() + i as f64 * 0.1)
            .collect();
        let volume = (0..80)
            .map(|i| {
                if (30..33).contains(&i) {
                    f64::NAN
                } else {
                    1000.0 + ((i * 37) % 500) as f64
                }
            })
            .collect();
        (close, volume)
    }

    fn params_for(ma_type: MaType) -> TsvParams {
        TsvParams {
            mamode: Some(ma_type),
            ..TsvParams::default()
        }
    }

    fn check_tsv_partial_params(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let params = TsvParams {
            length: None,
            signal: None,
            mamode: Some(ma_type),
            drift: None,
            offset: None,
            fillna: None,
            fill_method: None,
            volume_sign: None,
            signal_offset: None,
        };
        let out = tsv(&TsvInput::from_candles(&candles, "close", params))?;
        assert_eq!(out.tsv.len(), candles.close.len(), "[{}]", test_name);
        assert_eq!(out.signal.len(), candles.close.len(), "[{}]", test_name);
        assert_eq!(out.ratio.len(), candles.close.len(), "[{}]", test_name);
        assert_eq!(out.name(), "TSV_18_10", "[{}]", test_name);
        Ok(())
    }

    fn check_tsv_signal_matches_ma(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let out = tsv(&TsvInput::from_candles(&candles, "close", params_for(ma_type)))?;
        let expected = ma(ma_type, MaData::Slice(&out.tsv), 10)?;
        for (i, (&a, &b)) in out.signal.iter().zip(&expected).enumerate() {
            assert!(same_bits(a, b), "[{}] signal mismatch at {}: {} vs {}", test_name, i, a, b);
        }
        let last = out.signal.last().copied().unwrap_or(f64::NAN);
        assert!(last.is_finite(), "[{}] signal tail is {}", test_name, last);
        Ok(())
    }

    fn check_tsv_ratio_law(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let out = tsv(&TsvInput::from_candles(&candles, "close", params_for(ma_type)))?;
        for i in 0..out.tsv.len() {
            let (t, s, r) = (out.tsv[i], out.signal[i], out.ratio[i]);
            if t.is_nan() || s.is_nan() {
                assert!(r.is_nan(), "[{}] ratio should be NaN at {}", test_name, i);
            } else if s != 0.0 {
                assert!(same_bits(r, t / s), "[{}] ratio mismatch at {}", test_name, i);
            }
        }
        Ok(())
    }

    fn check_tsv_into_slices_matches(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let input = TsvInput::from_candles(&candles, "close", params_for(ma_type));
        let base = tsv(&input)?;

        let n = candles.close.len();
        let (mut t, mut s, mut r) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        tsv_into_slices(&mut t, &mut s, &mut r, &input)?;
        for i in 0..n {
            assert!(same_bits(base.tsv[i], t[i]), "[{}] tsv at {}", test_name, i);
            assert!(same_bits(base.signal[i], s[i]), "[{}] signal at {}", test_name, i);
            assert!(same_bits(base.ratio[i], r[i]), "[{}] ratio at {}", test_name, i);
        }
        Ok(())
    }

    fn check_tsv_offset_law(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let base = tsv(&TsvInput::from_candles(&candles, "close", params_for(ma_type)))?;
        for k in [3isize, -2] {
            let params = TsvParams {
                offset: Some(k),
                signal_offset: Some(SignalOffsetSource::Smoothed),
                ..params_for(ma_type)
            };
            let moved = tsv(&TsvInput::from_candles(&candles, "close", params))?;
            let pairs = [
                (&moved.tsv, shift(&base.tsv, k)),
                (&moved.signal, shift(&base.signal, k)),
                (&moved.ratio, shift(&base.ratio, k)),
            ];
            for (got, want) in pairs {
                for (i, (&a, &b)) in got.iter().zip(&want).enumerate() {
                    assert!(same_bits(a, b), "[{}] offset {} at {}", test_name, k, i);
                }
            }
        }
        Ok(())
    }

    fn check_tsv_fill_law(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let base = tsv(&TsvInput::from_candles(&candles, "close", params_for(ma_type)))?;
        let params = TsvParams {
            fillna: Some(0.0),
            ..params_for(ma_type)
        };
        let filled = tsv(&TsvInput::from_candles(&candles, "close", params))?;
        let pairs = [
            (&base.tsv, &filled.tsv),
            (&base.signal, &filled.signal),
            (&base.ratio, &filled.ratio),
        ];
        for (before, after) in pairs {
            for (i, (&b, &a)) in before.iter().zip(after.iter()).enumerate() {
                if b.is_nan() {
                    assert_eq!(a, 0.0, "[{}] fill at {}", test_name, i);
                } else {
                    assert!(same_bits(a, b), "[{}] untouched value at {}", test_name, i);
                }
            }
        }
        Ok(())
    }

    fn check_tsv_batch_row_matches_single(test_name: &str, ma_type: MaType) -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let batch = TsvBatchBuilder::new()
            .length_range(10, 20, 5)
            .signal_range(5, 9, 4)
            .mamode(ma_type)
            .apply_candles(&candles, "close")?;
        assert_eq!(batch.rows, 6, "[{}]", test_name);
        assert_eq!(batch.cols, candles.close.len(), "[{}]", test_name);

        for combo in &batch.combos {
            let single = tsv(&TsvInput::from_candles(&candles, "close", combo.clone()))?;
            let (t, s, r) = batch
                .values_for(combo)
                .ok_or_else(|| format!("[{}] missing row for {:?}", test_name, combo))?;
            for i in 0..batch.cols {
                assert!(same_bits(t[i], single.tsv[i]), "[{}] tsv at {}", test_name, i);
                assert!(same_bits(s[i], single.signal[i]), "[{}] signal at {}", test_name, i);
                assert!(same_bits(r[i], single.ratio[i]), "[{}] ratio at {}", test_name, i);
            }
        }
        Ok(())
    }

    fn check_tsv_property(test_name: &str, ma_type: MaType) -> TestResult {
        let strat = (20usize..120).prop_flat_map(|len| {
            (
                prop::collection::vec(1.0f64..1000.0, len),
                prop::collection::vec(0.0f64..1.0e6, len),
                1usize..25,
                2usize..12,
                1usize..4,
            )
        });

        proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(48))
            .run(&strat, |(close, volume, length, signal, drift)| {
                let params = TsvParams {
                    length: Some(length),
                    signal: Some(signal),
                    mamode: Some(ma_type),
                    drift: Some(drift),
                    ..TsvParams::default()
                };
                let input = TsvInput::from_slices(&close, &volume, params);
                let out = tsv(&input).unwrap();
                let again = tsv(&input).unwrap();

                prop_assert_eq!(out.tsv.len(), close.len());
                prop_assert_eq!(out.signal.len(), close.len());
                prop_assert_eq!(out.ratio.len(), close.len());

                let valid_from = (length - 1).max(drift);
                for i in 0..close.len() {
                    if i < length - 1 {
                        prop_assert!(out.tsv[i].is_nan(), "warmup at {}", i);
                    }
                    if i >= valid_from {
                        prop_assert!(out.tsv[i].is_finite(), "tsv at {} is {}", i, out.tsv[i]);
                    }
                    let (t, s) = (out.tsv[i], out.signal[i]);
                    if !t.is_nan() && !s.is_nan() && s != 0.0 {
                        prop_assert!(same_bits(out.ratio[i], t / s), "ratio at {}", i);
                    }
                    prop_assert!(same_bits(out.tsv[i], again.tsv[i]));
                    prop_assert!(same_bits(out.signal[i], again.signal[i]));
                    prop_assert!(same_bits(out.ratio[i], again.ratio[i]));
                }

                let sv = tsv_signed_volume(&close, &volume, VolumeSign::Absolute);
                prop_assert!(sv.iter().all(|&v| v >= 0.0));
                Ok(())
            })
            .map_err(|e| format!("[{}] {}", test_name, e))?;
        Ok(())
    }

    fn check_tsv_gap_recovery(test_name: &str, ma_type: MaType) -> TestResult {
        let (close, volume) = gapped_series();
        let out = TsvBuilder::new()
            .length(3)
            .signal(4)
            .mamode(ma_type)
            .apply_slices(&close, &volume)?;

        let gaps: Vec<usize> = (0..out.tsv.len()).filter(|&i| out.tsv[i].is_nan()).collect();
        assert_eq!(gaps, vec![0, 1, 32], "[{}] tsv gaps", test_name);

        assert!(out.signal[29].is_finite(), "[{}] signal before gap", test_name);
        assert!(out.signal[32].is_nan(), "[{}] signal inside gap", test_name);
        // every mode settles within 3 * signal values of a clean run
        for i in 45..out.signal.len() {
            let (t, s, r) = (out.tsv[i], out.signal[i], out.ratio[i]);
            assert!(s.is_finite(), "[{}] signal at {} is {}", test_name, i, s);
            if s != 0.0 {
                assert!(same_bits(r, t / s), "[{}] ratio at {}", test_name, i);
                assert!(r.is_finite(), "[{}] ratio at {} is {}", test_name, i, r);
            }
        }
        Ok(())
    }

    fn check_tsv_gap_property(test_name: &str, ma_type: MaType) -> TestResult {
        let strat = (60usize..160).prop_flat_map(|len| {
            (
                prop::collection::vec(1.0f64..1000.0, len),
                prop::collection::vec(0.0f64..1.0e6, len),
                1usize..20,
                2usize..10,
                1usize..4,
                0..len,
                1usize..8,
                any::<bool>(),
            )
        });

        proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32))
            .run(
                &strat,
                |(mut close, mut volume, length, signal, drift, gap_start, gap_len, in_close)| {
                    let gap_end = (gap_start + gap_len).min(close.len());
                    let target = if in_close { &mut close } else { &mut volume };
                    for v in &mut target[gap_start..gap_end] {
                        *v = f64::NAN;
                    }

                    let out = TsvBuilder::new()
                        .length(length)
                        .signal(signal)
                        .drift(drift)
                        .mamode(ma_type)
                        .apply_slices(&close, &volume)
                        .unwrap();

                    let tsv_from = (length - 1).max(gap_end + drift);
                    let settled = tsv_from + 3 * signal;
                    for i in tsv_from..close.len() {
                        prop_assert!(out.tsv[i].is_finite(), "tsv at {} is {}", i, out.tsv[i]);
                    }
                    for i in settled..close.len() {
                        let (t, s, r) = (out.tsv[i], out.signal[i], out.ratio[i]);
                        prop_assert!(s.is_finite(), "signal at {} is {}", i, s);
                        if s != 0.0 {
                            prop_assert!(same_bits(r, t / s), "ratio at {}", i);
                        }
                    }
                    Ok(())
                },
            )
            .map_err(|e| format!("[{}] {}", test_name, e))?;
        Ok(())
    }

    macro_rules! generate_all_tsv_tests {
        ($($test_fn:ident),* $(,)?) => {
            paste::paste! {
                $(
                    #[test] fn [<$test_fn _sma>]() -> TestResult { $test_fn(stringify!([<$test_fn _sma>]), MaType::Sma) }
                    #[test] fn [<$test_fn _ema>]() -> TestResult { $test_fn(stringify!([<$test_fn _ema>]), MaType::Ema) }
                    #[test] fn [<$test_fn _rma>]() -> TestResult { $test_fn(stringify!([<$test_fn _rma>]), MaType::Rma) }
                    #[test] fn [<$test_fn _wma>]() -> TestResult { $test_fn(stringify!([<$test_fn _wma>]), MaType::Wma) }
                    #[test] fn [<$test_fn _dema>]() -> TestResult { $test_fn(stringify!([<$test_fn _dema>]), MaType::Dema) }
                    #[test] fn [<$test_fn _tema>]() -> TestResult { $test_fn(stringify!([<$test_fn _tema>]), MaType::Tema) }
                    #[test] fn [<$test_fn _trima>]() -> TestResult { $test_fn(stringify!([<$test_fn _trima>]), MaType::Trima) }
                    #[test] fn [<$test_fn _hma>]() -> TestResult { $test_fn(stringify!([<$test_fn _hma>]), MaType::Hma) }
                    #[test] fn [<$test_fn _zlma>]() -> TestResult { $test_fn(stringify!([<$test_fn _zlma>]), MaType::Zlma) }
                    #[test] fn [<$test_fn _linreg>]() -> TestResult { $test_fn(stringify!([<$test_fn _linreg>]), MaType::Linreg) }
                )*
            }
        };
    }

    generate_all_tsv_tests!(
        check_tsv_partial_params,
        check_tsv_signal_matches_ma,
        check_tsv_ratio_law,
        check_tsv_into_slices_matches,
        check_tsv_offset_law,
        check_tsv_fill_law,
        check_tsv_batch_row_matches_single,
        check_tsv_property,
        check_tsv_gap_recovery,
        check_tsv_gap_property,
    );

    #[test]
    fn test_tsv_default_scenario() -> TestResult {
        let close = reference_close();
        let volume = vec![1000.0; close.len()];
        let out = tsv(&TsvInput::from_slices(&close, &volume, TsvParams::default()))?;

        assert!(out.tsv[..17].iter().all(|x| x.is_nan()));
        let expected = [10000.0, 13000.0, 13000.0];
        for (got, want) in out.tsv[17..].iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{} vs {}", got, want);
        }
        // three valid values cannot feed a 10-period signal
        assert!(out.signal.iter().all(|x| x.is_nan()));
        assert!(out.ratio.iter().all(|x| x.is_nan()));
        Ok(())
    }

    #[test]
    fn test_tsv_interior_volume_gap() -> TestResult {
        let (close, volume) = gapped_series();
        let out = TsvBuilder::new()
            .length(3)
            .signal(4)
            .apply_slices(&close, &volume)?;

        let signal_gaps: Vec<usize> = (0..out.signal.len())
            .filter(|&i| out.signal[i].is_nan())
            .collect();
        let expected: Vec<usize> = (0..5).chain(32..36).collect();
        assert_eq!(signal_gaps, expected);

        // after the gap the signal is a plain 4-bar mean again
        for i in 36..out.signal.len() {
            let mean = out.tsv[i - 3..=i].iter().sum::<f64>() / 4.0;
            assert!((out.signal[i] - mean).abs() < 1e-6, "signal at {}", i);
        }
        Ok(())
    }

    #[test]
    fn test_tsv_signed_volume_variant() -> TestResult {
        let close = reference_close();
        let volume = vec![1000.0; close.len()];
        let out = TsvBuilder::new()
            .volume_sign(VolumeSign::Signed)
            .apply_slices(&close, &volume)?;
        let expected = [32000.0, 35000.0, 35000.0];
        for (got, want) in out.tsv[17..].iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{} vs {}", got, want);
        }

        let sv = tsv_signed_volume(&close, &volume, VolumeSign::Signed);
        assert_eq!(&sv[..4], &[1000.0, 1000.0, -1000.0, 1000.0]);
        Ok(())
    }

    #[test]
    fn test_tsv_signed_volume_snaps_flat_bars() {
        let close = [1.0, 1.0, 2.0, 2.0];
        let volume = [5.0, 5.0, 5.0, 5.0];
        let sv = tsv_signed_volume(&close, &volume, VolumeSign::Absolute);
        assert_eq!(sv, vec![5.0, 0.0, 5.0, 0.0]);
        assert!(sv[1].is_sign_positive());
    }

    #[test]
    fn test_tsv_cvd_drift() {
        let close = [1.0, 2.0, 4.0, 3.0];
        let volume = [10.0; 4];
        let cvd = tsv_cvd(&close, &volume, 2, VolumeSign::Absolute);
        assert!(cvd[0].is_nan() && cvd[1].is_nan());
        assert_eq!(&cvd[2..], &[30.0, 10.0]);
    }

    #[test]
    fn test_tsv_period_offset_shifts_signal_period() -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let out = TsvBuilder::new().offset(2).apply(&candles)?;
        assert!(out.signal[..2].iter().all(|x| x.is_nan()));
        assert!(out.signal[2..].iter().all(|&x| x == 10.0));

        let base = TsvBuilder::new().apply(&candles)?;
        let moved = shift(&base.tsv, 2);
        for i in 0..moved.len() {
            assert!(same_bits(out.tsv[i], moved[i]));
        }
        Ok(())
    }

    #[test]
    fn test_tsv_fill_method_after_value() -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let out = TsvBuilder::new()
            .offset(-4)
            .signal_offset(SignalOffsetSource::Smoothed)
            .fill_method(FillMethod::Ffill)
            .apply(&candles)?;
        let n = out.tsv.len();
        assert!(out.tsv[..13].iter().all(|x| x.is_nan()));
        assert!(out.tsv[n - 4..].iter().all(|&x| x == out.tsv[n - 5]));

        let out = TsvBuilder::new()
            .fillna(-1.0)
            .fill_method(FillMethod::Bfill)
            .apply(&candles)?;
        assert!(out.tsv[..17].iter().all(|&x| x == -1.0));
        Ok(())
    }

    #[test]
    fn test_tsv_parameter_normalization() -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let out = TsvBuilder::new()
            .length(0)
            .signal(0)
            .drift(0)
            .apply(&candles)?;
        let base = TsvBuilder::new().apply(&candles)?;
        assert_eq!(out.name(), "TSV_18_10");
        for i in 0..base.tsv.len() {
            assert!(same_bits(out.tsv[i], base.tsv[i]));
            assert!(same_bits(out.signal[i], base.signal[i]));
        }

        let hma = TsvBuilder::new()
            .signal(1)
            .mamode_name("HMA")
            .apply(&candles)?;
        assert_eq!(hma.signal_name(), "TSVs_18_1");
        assert_eq!(hma.signal_period, 1);
        let smoothed = ma(MaType::Hma, MaData::Slice(&hma.tsv), 2)?;
        for i in 0..smoothed.len() {
            assert!(same_bits(hma.signal[i], smoothed[i]), "hma signal at {}", i);
        }
        let input = TsvInput::from_candles(
            &candles,
            "close",
            TsvParams {
                signal: Some(1),
                mamode: Some(MaType::Hma),
                ..TsvParams::default()
            },
        );
        assert_eq!(input.get_signal(), 1);

        let unknown = TsvBuilder::new().mamode_name("kama").apply(&candles)?;
        for i in 0..base.signal.len() {
            assert!(same_bits(unknown.signal[i], base.signal[i]));
        }
        Ok(())
    }

    #[test]
    fn test_tsv_input_errors() {
        let close = [1.0, 2.0, 3.0];
        let short = [1.0, 2.0];
        assert!(matches!(
            tsv(&TsvInput::from_slices(&close, &short, TsvParams::default())),
            Err(TsvError::MismatchedLength { close: 3, volume: 2 })
        ));

        let empty: [f64; 0] = [];
        assert!(matches!(
            tsv(&TsvInput::from_slices(&empty, &empty, TsvParams::default())),
            Err(TsvError::EmptyData)
        ));

        let nan = [f64::NAN; 3];
        assert!(matches!(
            tsv(&TsvInput::from_slices(&nan, &close, TsvParams::default())),
            Err(TsvError::InvalidClose(SeriesError::AllValuesNaN))
        ));
        assert!(matches!(
            tsv(&TsvInput::from_slices(&close, &nan, TsvParams::default())),
            Err(TsvError::InvalidVolume(SeriesError::AllValuesNaN))
        ));

        let input = TsvInput::from_slices(&close, &close, TsvParams::default());
        let (mut a, mut b, mut c) = (vec![0.0; 3], vec![0.0; 2], vec![0.0; 3]);
        assert!(matches!(
            tsv_into_slices(&mut a, &mut b, &mut c, &input),
            Err(TsvError::OutputLengthMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_tsv_short_input_is_all_nan() -> TestResult {
        let close = [1.0, 2.0, 3.0, 2.0];
        let volume = [1.0; 4];
        let out = tsv(&TsvInput::from_slices(&close, &volume, TsvParams::default()))?;
        assert!(out.tsv.iter().all(|x| x.is_nan()));
        assert!(out.signal.iter().all(|x| x.is_nan()));
        assert!(out.ratio.iter().all(|x| x.is_nan()));
        Ok(())
    }

    #[test]
    fn test_tsv_candle_source() -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let by_close = tsv(&TsvInput::with_default_candles(&candles))?;
        let by_hl2 = tsv(&TsvInput::from_candles(&candles, "hl2", TsvParams::default()))?;
        let from_slices = tsv(&TsvInput::from_slices(
            &candles.hl2,
            &candles.volume,
            TsvParams::default(),
        ))?;
        assert!(by_close
            .tsv
            .iter()
            .zip(&by_hl2.tsv)
            .any(|(a, b)| !close_or_both_nan(*a, *b, 1e-9)));
        for i in 0..by_hl2.tsv.len() {
            assert!(same_bits(by_hl2.tsv[i], from_slices.tsv[i]));
        }
        Ok(())
    }

    #[test]
    fn test_tsv_params_from_json() -> TestResult {
        let p: TsvParams = serde_json::from_str(
            r#"{"length": 14, "mamode": "EMA", "fill_method": "pad", "volume_sign": "signed"}"#,
        )?;
        assert_eq!(p.length, Some(14));
        assert_eq!(p.signal, Some(DEFAULT_SIGNAL));
        assert_eq!(p.mamode, Some(MaType::Ema));
        assert_eq!(p.fill_method, Some(FillMethod::Ffill));
        assert_eq!(p.volume_sign, Some(VolumeSign::Signed));
        assert_eq!(p.signal_offset, Some(SignalOffsetSource::Period));

        let p: TsvParams = serde_json::from_str(r#"{"mamode": "no-such-ma"}"#)?;
        assert_eq!(p.mamode, Some(MaType::Sma));

        let p: TsvParams = serde_json::from_str(r#"{"mamode": null}"#)?;
        assert_eq!(p.mamode, None);

        let round: TsvParams = serde_json::from_str(&serde_json::to_string(&TsvParams::default())?)?;
        assert_eq!(round, TsvParams::default());
        Ok(())
    }

    #[test]
    fn test_tsv_table() -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let out = TsvBuilder::new().length(12).signal(6).apply(&candles)?;
        assert_eq!(out.category(), "volume");

        let names: Vec<String> = out.columns().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["TSV_12_6", "TSVs_12_6", "TSVr_12_6"]);

        let table = out.to_table(Some(candles.timestamp.as_slice()))?;
        assert_eq!(table.name, "TSV_12_6");
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.index.as_ref().map(Vec::len), Some(candles.close.len()));

        let json = serde_json::to_value(&table)?;
        assert_eq!(json["category"], "volume");
        assert_eq!(json["columns"][1]["name"], "TSVs_12_6");
        assert!(json["columns"][0]["values"][0].is_null());

        assert!(out.to_table(None)?.index.is_none());
        assert!(matches!(
            out.to_table(Some(&candles.timestamp[1..])),
            Err(TsvError::OutputLengthMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_tsv_batch_grid() -> TestResult {
        let candles = read_candles_from_csv(FIXTURE)?;
        let sweep = TsvBatchRange {
            length: (14, 18, 2),
            signal: (10, 10, 0),
        };
        let serial = tsv_batch_slice(&candles.close, &candles.volume, &sweep, &TsvParams::default())?;
        let parallel =
            tsv_batch_par_slice(&candles.close, &candles.volume, &sweep, &TsvParams::default())?;
        assert_eq!(serial.rows, 3);
        assert_eq!(serial.tsv.len(), 3 * candles.close.len());
        for i in 0..serial.tsv.len() {
            assert!(same_bits(serial.tsv[i], parallel.tsv[i]));
            assert!(same_bits(serial.signal[i], parallel.signal[i]));
            assert!(same_bits(serial.ratio[i], parallel.ratio[i]));
        }

        let query = TsvParams {
            length: Some(16),
            signal: Some(10),
            ..TsvParams::default()
        };
        assert_eq!(serial.row_for_params(&query), Some(1));
        assert_eq!(serial.row_for_params(&TsvParams::default()), Some(2));
        assert!(serial
            .row_for_params(&TsvParams {
                length: Some(15),
                ..TsvParams::default()
            })
            .is_none());
        Ok(())
    }

    #[test]
    fn test_tsv_batch_errors() {
        let close = [1.0, 2.0, 3.0];
        let volume = [1.0, 1.0, 1.0];
        let sweep = TsvBatchRange {
            length: (9, 2, 1),
            signal: (10, 10, 0),
        };
        assert!(matches!(
            tsv_batch_slice(&close, &volume, &sweep, &TsvParams::default()),
            Err(TsvError::EmptyParameterGrid)
        ));
        assert!(matches!(
            TsvBatchBuilder::new()
                .parallel(false)
                .apply_slices(&close, &volume[..2]),
            Err(TsvError::MismatchedLength { .. })
        ));
    }
}
