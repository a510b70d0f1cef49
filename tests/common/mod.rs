//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::error::Error;
use std::ops::Range;
use std::sync::Once;
use tsv_ta::utilities::data_loader::{read_candles_from_csv, Candles};

static LOGGER: Once = Once::new();

/// Installs `env_logger` once per test binary; honors `RUST_LOG`.
pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub struct TestData {
    pub candles: Candles,
}

impl TestData {
    /// Load test data from the bundled CSV fixture
    pub fn load() -> Result<Self, Box<dyn Error>> {
        let candles = read_candles_from_csv("src/data/sample_4h.csv")?;
        if candles.is_empty() {
            return Err("fixture has no rows".into());
        }
        Ok(TestData { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Close-and-volume candles with volume blanked out over `gap`.
    pub fn with_volume_gap(&self, gap: Range<usize>) -> Candles {
        let mut volume = self.candles.volume.clone();
        for v in &mut volume[gap] {
            *v = f64::NAN;
        }
        Candles::from_close_volume(
            self.candles.timestamp.clone(),
            self.candles.close.clone(),
            volume,
        )
    }

    pub fn close_prices(&self) -> &[f64] {
        &self.candles.close
    }

    pub fn volume(&self) -> &[f64] {
        &self.candles.volume
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.candles.timestamp
    }
}

/// Compare two arrays with a tolerance; `NaN` only matches `NaN`.
pub fn assert_array_close(actual: &[f64], expected: &[f64], rtol: f64, atol: f64, name: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: Length mismatch: actual {} vs expected {}",
        name,
        actual.len(),
        expected.len()
    );

    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        if a.is_nan() || e.is_nan() {
            assert!(
                a.is_nan() && e.is_nan(),
                "{}: NaN mismatch at index {}: actual {} vs expected {}",
                name,
                i,
                a,
                e
            );
            continue;
        }

        let diff = (a - e).abs();
        let tol = atol + rtol * e.abs();

        assert!(
            diff <= tol,
            "{}: Value mismatch at index {}: actual {} vs expected {} (diff: {}, tol: {})",
            name,
            i,
            a,
            e,
            diff,
            tol
        );
    }
}

pub fn last_n(values: &[f64], n: usize) -> &[f64] {
    &values[values.len() - n..]
}
