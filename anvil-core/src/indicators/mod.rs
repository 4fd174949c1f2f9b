//! Technical indicators — full-series computation with NaN warmups.
//!
//! Every function takes a slice and returns a series of the same length,
//! with NaN in positions where the indicator is not yet defined. Signal
//! evaluation treats NaN readings as "condition false", so warmup candles
//! can never trigger a trade.

use std::collections::HashMap;

use crate::domain::strategy::{ConditionTree, IndicatorKind, IndicatorRef};
use crate::domain::Candle;

/// MACD uses the conventional fixed periods.
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Bollinger bands use 2 standard deviations.
const BOLLINGER_K: f64 = 2.0;

/// Simple moving average. NaN before the first full window.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if period == 0 {
        return vec![f64::NAN; n];
    }
    let mut out = vec![f64::NAN; n];
    let mut window_sum = 0.0;
    for i in 0..n {
        window_sum += values[i];
        if i >= period {
            window_sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = window_sum / period as f64;
        }
    }
    out
}

/// Exponential moving average, seeded with the first value.
///
/// Defined from index 0 onward; the early readings are biased toward the
/// seed, matching the common streaming formulation.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || period == 0 {
        return vec![f64::NAN; n];
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(n);
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = (v - prev) * k + prev;
        out.push(prev);
    }
    out
}

/// Relative Strength Index using simple-average gains and losses over the
/// trailing window. 100 when the window has no losses.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    if period == 0 {
        return vec![f64::NAN; n];
    }
    let mut out = vec![f64::NAN; n];
    for i in period..n {
        let mut gains = 0.0;
        let mut losses = 0.0;
        for j in (i - period + 1)..=i {
            let change = closes[j] - closes[j - 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }
        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;
        out[i] = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }
    out
}

/// MACD line, signal line, and histogram.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD(12, 26, 9): fast EMA minus slow EMA, EMA-smoothed signal.
pub fn macd(closes: &[f64]) -> MacdSeries {
    let fast = ema(closes, MACD_FAST);
    let slow = ema(closes, MACD_SLOW);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, MACD_SIGNAL);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
    MacdSeries {
        line,
        signal,
        histogram,
    }
}

/// Bollinger upper, middle, and lower bands.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger bands: SMA middle, +/- k population standard deviations.
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> BollingerSeries {
    let n = closes.len();
    let middle = sma(closes, period);
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    if period == 0 {
        return BollingerSeries {
            upper,
            middle,
            lower,
        };
    }
    for i in 0..n {
        if i + 1 < period || middle[i].is_nan() {
            continue;
        }
        let window = &closes[i + 1 - period..=i];
        let mean = middle[i];
        let variance =
            window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / period as f64;
        let sigma = variance.sqrt();
        upper[i] = mean + k * sigma;
        lower[i] = mean - k * sigma;
    }
    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

/// Average True Range: simple average of true ranges over the window.
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    let n = candles.len();
    if period == 0 || n == 0 {
        return vec![f64::NAN; n];
    }
    let mut tr = Vec::with_capacity(n);
    tr.push(candles[0].high - candles[0].low);
    for i in 1..n {
        let c = &candles[i];
        let prev_close = candles[i - 1].close;
        let range = (c.high - c.low)
            .max((c.high - prev_close).abs())
            .max((c.low - prev_close).abs());
        tr.push(range);
    }
    let mut out = vec![f64::NAN; n];
    for i in period..n {
        let window = &tr[i + 1 - period..=i];
        out[i] = window.iter().sum::<f64>() / period as f64;
    }
    out
}

/// Precomputed indicator series, keyed by the references a strategy's
/// condition trees actually mention.
///
/// Computing everything up front keeps the simulation loop allocation-free
/// and makes each candle's evaluation an O(refs) lookup.
#[derive(Debug, Default)]
pub struct IndicatorSet {
    series: HashMap<IndicatorRef, Vec<f64>>,
}

impl IndicatorSet {
    /// Compute every series referenced by the given condition trees.
    pub fn compute(candles: &[Candle], trees: &[&ConditionTree]) -> Self {
        let mut refs = Vec::new();
        for tree in trees {
            tree.indicator_refs(&mut refs);
        }
        refs.sort();
        refs.dedup();

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let mut series = HashMap::with_capacity(refs.len());
        for r in refs {
            let values = match r.kind {
                IndicatorKind::Close => closes.clone(),
                IndicatorKind::Volume => candles.iter().map(|c| c.volume).collect(),
                IndicatorKind::Sma => sma(&closes, r.period),
                IndicatorKind::Ema => ema(&closes, r.period),
                IndicatorKind::Rsi => rsi(&closes, r.period),
                IndicatorKind::MacdLine => macd(&closes).line,
                IndicatorKind::MacdSignal => macd(&closes).signal,
                IndicatorKind::MacdHistogram => macd(&closes).histogram,
                IndicatorKind::BollingerUpper => bollinger(&closes, r.period, BOLLINGER_K).upper,
                IndicatorKind::BollingerMiddle => bollinger(&closes, r.period, BOLLINGER_K).middle,
                IndicatorKind::BollingerLower => bollinger(&closes, r.period, BOLLINGER_K).lower,
                IndicatorKind::Atr => atr(candles, r.period),
            };
            series.insert(r, values);
        }
        Self { series }
    }

    /// Reading of one series at candle `i`. NaN if the series is missing or
    /// the index is out of range.
    pub fn value(&self, r: &IndicatorRef, i: usize) -> f64 {
        self.series
            .get(r)
            .and_then(|s| s.get(i))
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
