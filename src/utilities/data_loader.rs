use csv::ReaderBuilder;
use std::error::Error;
use std::fs::File;

#[derive(Debug, Clone)]
pub struct Candles {
    pub timestamp: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub hl2: Vec<f64>,
    pub hlc3: Vec<f64>,
    pub ohlc4: Vec<f64>,
    pub hlcc4: Vec<f64>,
}

impl Candles {
    pub fn new(
        timestamp: Vec<i64>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Self {
        let mut candles = Candles {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            hl2: Vec::new(),
            hlc3: Vec::new(),
            ohlc4: Vec::new(),
            hlcc4: Vec::new(),
        };
        candles.hl2 = candles.compute_hl2();
        candles.hlc3 = candles.compute_hlc3();
        candles.ohlc4 = candles.compute_ohlc4();
        candles.hlcc4 = candles.compute_hlcc4();
        candles
    }

    /// Builds candles from close and volume only; open, high and low mirror close.
    pub fn from_close_volume(timestamp: Vec<i64>, close: Vec<f64>, volume: Vec<f64>) -> Self {
        Self::new(
            timestamp,
            close.clone(),
            close.clone(),
            close.clone(),
            close,
            volume,
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn get_timestamp(&self) -> Result<&[i64], Box<dyn Error>> {
        Ok(&self.timestamp)
    }

    pub fn select_candle_field(&self, field: &str) -> Result<&[f64], Box<dyn Error>> {
        match field.to_lowercase().as_str() {
            "open" => Ok(&self.open),
            "high" => Ok(&self.high),
            "low" => Ok(&self.low),
            "close" => Ok(&self.close),
            "volume" => Ok(&self.volume),
            _ => Err(format!("Invalid field: {}", field).into()),
        }
    }

    pub fn get_calculated_field(&self, field: &str) -> Result<Vec<f64>, Box<dyn Error>> {
        match field.to_lowercase().as_str() {
            "hl2" => Ok(self.hl2.clone()),
            "hlc3" => Ok(self.hlc3.clone()),
            "ohlc4" => Ok(self.ohlc4.clone()),
            "hlcc4" => Ok(self.hlcc4.clone()),
            _ => Err(format!("Invalid calculated field: {}", field).into()),
        }
    }

    fn compute_hl2(&self) -> Vec<f64> {
        self.high
            .iter()
            .zip(self.low.iter())
            .map(|(&high, &low)| (high + low) / 2.0)
            .collect()
    }

    fn compute_hlc3(&self) -> Vec<f64> {
        self.high
            .iter()
            .zip(self.low.iter())
            .zip(self.close.iter())
            .map(|((&high, &low), &close)| (high + low + close) / 3.0)
            .collect()
    }

    fn compute_ohlc4(&self) -> Vec<f64> {
        self.open
            .iter()
            .zip(self.high.iter())
            .zip(self.low.iter())
            .zip(self.close.iter())
            .map(|(((&open, &high), &low), &close)| (open + high + low + close) / 4.0)
            .collect()
    }

    fn compute_hlcc4(&self) -> Vec<f64> {
        self.high
            .iter()
            .zip(self.low.iter())
            .zip(self.close.iter())
            .map(|((&high, &low), &close)| (high + low + 2.0 * close) / 4.0)
            .collect()
    }
}

/// Resolves a price source by name. Unknown names fall back to `close`.
#[inline]
pub fn source_type<'a>(candles: &'a Candles, source: &str) -> &'a [f64] {
    match source.to_lowercase().as_str() {
        "open" => &candles.open,
        "high" => &candles.high,
        "low" => &candles.low,
        "close" => &candles.close,
        "volume" => &candles.volume,
        "hl2" => &candles.hl2,
        "hlc3" => &candles.hlc3,
        "ohlc4" => &candles.ohlc4,
        "hlcc4" | "hlcc" => &candles.hlcc4,
        other => {
            log::warn!("unknown candle source '{}', using close", other);
            &candles.close
        }
    }
}

/// Reads `timestamp,open,close,high,low,volume` rows (header required).
pub fn read_candles_from_csv(file_path: &str) -> Result<Candles, Box<dyn Error>> {
    let file = File::open(file_path)?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut timestamp = Vec::new();
    let mut open = Vec::new();
    let mut high = Vec::new();
    let mut low = Vec::new();
    let mut close = Vec::new();
    let mut volume = Vec::new();

    for result in rdr.records() {
        let record = result?;
        if record.len() < 6 {
            return Err(format!(
                "malformed candle row at line {}: expected 6 fields, got {}",
                record.position().map_or(0, |p| p.line()),
                record.len()
            )
            .into());
        }
        timestamp.push(record[0].parse::<i64>()?);
        open.push(record[1].parse::<f64>()?);
        close.push(record[2].parse::<f64>()?);
        high.push(record[3].parse::<f64>()?);
        low.push(record[4].parse::<f64>()?);
        volume.push(record[5].parse::<f64>()?);
    }

    log::debug!("loaded {} candles from {}", close.len(), file_path);
    Ok(Candles::new(timestamp, open, high, low, close, volume))
}
