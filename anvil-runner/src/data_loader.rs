//! Data adapters: CSV candle files, a seeded synthetic generator, and a
//! JSON strategy file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use anvil_core::{Candle, Strategy, Timeframe};

use crate::ports::{DataError, PriceDataService, StrategyRepository};

// ── CSV candles ──

/// Candle source backed by a directory of `{symbol}.csv` files with
/// `timestamp,open,high,low,close,volume` columns.
pub struct CsvPriceService {
    dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvPriceService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

/// Accepts unix epoch milliseconds, RFC 3339, or a bare `YYYY-MM-DD` date.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataError> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| DataError::Parse(format!("epoch millis out of range: {raw}")));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    Err(DataError::Parse(format!("unrecognized timestamp: {raw}")))
}

impl PriceDataService for CsvPriceService {
    fn historical_candles(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataError> {
        let path = self.symbol_path(symbol);
        if !path.exists() {
            return Err(DataError::NoData(symbol.to_string()));
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| DataError::Parse(format!("{}: {e}", path.display())))?;

        let mut candles = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::Parse(format!("{}: {e}", path.display())))?;
            let timestamp = parse_timestamp(&row.timestamp)?;
            if timestamp < start || timestamp > end {
                continue;
            }
            candles.push(Candle {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        candles.sort_by_key(|c| c.timestamp);
        debug!(symbol, count = candles.len(), "loaded candles from csv");
        Ok(candles)
    }
}

// ── Synthetic candles ──

/// Deterministic random-walk candle generator for demos and smoke runs.
///
/// The same seed and symbol always produce the same series; different
/// symbols under one seed diverge by folding a symbol hash into the seed.
pub struct SyntheticPriceService {
    seed: u64,
    start_price: f64,
}

impl SyntheticPriceService {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let hash = blake3::hash(symbol.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        StdRng::seed_from_u64(self.seed ^ u64::from_le_bytes(prefix))
    }
}

impl PriceDataService for SyntheticPriceService {
    fn historical_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataError> {
        let mut rng = self.rng_for(symbol);
        let step = timeframe.step();
        let mut candles = Vec::new();
        let mut price = self.start_price;
        let mut at = start;
        while at <= end {
            let drift: f64 = rng.gen_range(-0.01..0.011);
            let open = price;
            let close = (open * (1.0 + drift)).max(0.01);
            let wiggle = open.max(close) * rng.gen_range(0.0..0.004);
            candles.push(Candle {
                timestamp: at,
                open,
                high: open.max(close) + wiggle,
                low: (open.min(close) - wiggle).max(0.005),
                close,
                volume: rng.gen_range(100.0..10_000.0),
            });
            price = close;
            at += step;
        }
        Ok(candles)
    }
}

// ── JSON strategies ──

/// Strategy repository backed by a JSON file holding an array of
/// strategy documents.
pub struct JsonStrategyFile {
    by_id: HashMap<String, Strategy>,
}

impl JsonStrategyFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let strategies: Vec<Strategy> = serde_json::from_str(&raw)
            .map_err(|e| DataError::Parse(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Self::from_strategies(strategies))
    }

    pub fn from_strategies(strategies: Vec<Strategy>) -> Self {
        let by_id = strategies.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self { by_id }
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.by_id.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl StrategyRepository for JsonStrategyFile {
    fn get_by_id(&self, id: &str) -> Result<Option<Strategy>, DataError> {
        Ok(self.by_id.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    // ── Timestamp parsing ──

    #[test]
    fn parses_epoch_millis_rfc3339_and_dates() {
        let a = parse_timestamp("1704067200000").unwrap();
        let b = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        let c = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(a, day(1));
        assert_eq!(b, day(1));
        assert_eq!(c, day(1));
        assert!(parse_timestamp("yesterday").is_err());
    }

    // ── CSV ──

    #[test]
    fn csv_loads_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("BTCUSDT.csv")).unwrap();
        writeln!(f, "timestamp,open,high,low,close,volume").unwrap();
        // Out of order, with one row outside the range
        writeln!(f, "2024-01-03,102,103,101,102.5,500").unwrap();
        writeln!(f, "2024-01-02,101,102,100,101.5,400").unwrap();
        writeln!(f, "2024-02-15,110,111,109,110.5,300").unwrap();
        drop(f);

        let svc = CsvPriceService::new(dir.path());
        let candles = svc
            .historical_candles("BTCUSDT", Timeframe::D1, day(1), day(31))
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, day(2));
        assert_eq!(candles[1].timestamp, day(3));
        assert_eq!(candles[1].close, 102.5);
    }

    #[test]
    fn csv_missing_symbol_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let svc = CsvPriceService::new(dir.path());
        let err = svc
            .historical_candles("ETHUSDT", Timeframe::D1, day(1), day(31))
            .unwrap_err();
        assert!(matches!(err, DataError::NoData(s) if s == "ETHUSDT"));
    }

    // ── Synthetic ──

    #[test]
    fn synthetic_is_deterministic_per_symbol() {
        let svc = SyntheticPriceService::new(42);
        let a = svc
            .historical_candles("BTCUSDT", Timeframe::H1, day(1), day(5))
            .unwrap();
        let b = svc
            .historical_candles("BTCUSDT", Timeframe::H1, day(1), day(5))
            .unwrap();
        let other = svc
            .historical_candles("ETHUSDT", Timeframe::H1, day(1), day(5))
            .unwrap();
        assert_eq!(a.len(), 97);
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.close == y.close));
        assert!(a.iter().zip(&other).any(|(x, y)| x.close != y.close));
    }

    #[test]
    fn synthetic_candles_are_sane() {
        let svc = SyntheticPriceService::new(7);
        let candles = svc
            .historical_candles("SOLUSDT", Timeframe::H4, day(1), day(30))
            .unwrap();
        assert!(!candles.is_empty());
        for c in &candles {
            assert!(c.is_sane(), "{c:?}");
            assert!(c.low > 0.0);
        }
        // Timestamps advance by the timeframe step
        assert_eq!(candles[1].timestamp - candles[0].timestamp, Timeframe::H4.step());
    }

    // ── Strategy file ──

    #[test]
    fn json_strategy_file_round_trips() {
        let json = r#"[
            {
                "id": "sma-cross",
                "name": "SMA crossover",
                "symbols": ["BTCUSDT"],
                "entry": {
                    "type": "compare",
                    "left": {"kind": "sma", "period": 10},
                    "op": "crossover",
                    "right": {"kind": "sma", "period": 30}
                },
                "exit": {
                    "type": "compare",
                    "left": {"kind": "sma", "period": 10},
                    "op": "crossunder",
                    "right": {"kind": "sma", "period": 30}
                },
                "sizing": {"type": "fixed_percent", "percent": 25.0},
                "risk": {"stop_loss_pct": 5.0, "take_profit_pct": 15.0}
            }
        ]"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strategies.json");
        std::fs::write(&path, json).unwrap();

        let repo = JsonStrategyFile::load(&path).unwrap();
        assert_eq!(repo.ids(), vec!["sma-cross".to_string()]);
        let strat = repo.get_by_id("sma-cross").unwrap().unwrap();
        assert_eq!(strat.name, "SMA crossover");
        assert_eq!(strat.risk.max_capital_usage_pct, 100.0);
        assert!(repo.get_by_id("nope").unwrap().is_none());
    }
}
