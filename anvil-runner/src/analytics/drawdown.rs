//! Drawdown episode extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use anvil_core::EquityPoint;

/// One peak-to-recovery drawdown episode.
///
/// `end` is `None` while the drawdown is still open at the last equity
/// point; `duration_ms` then measures up to the end of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub start: DateTime<Utc>,
    pub trough: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub depth_pct: f64,
    pub duration_ms: i64,
}

/// Extract drawdown episodes from an equity curve.
///
/// An episode opens on the first point below the running peak and closes on
/// the point that reclaims it (`drawdown_pct` back to zero).
pub fn episodes(curve: &[EquityPoint]) -> Vec<DrawdownEpisode> {
    let mut out = Vec::new();
    let mut open: Option<DrawdownEpisode> = None;

    for point in curve {
        if point.drawdown_pct > 0.0 {
            match open.as_mut() {
                None => {
                    open = Some(DrawdownEpisode {
                        start: point.timestamp,
                        trough: point.timestamp,
                        end: None,
                        depth_pct: point.drawdown_pct,
                        duration_ms: 0,
                    });
                }
                Some(ep) => {
                    if point.drawdown_pct > ep.depth_pct {
                        ep.depth_pct = point.drawdown_pct;
                        ep.trough = point.timestamp;
                    }
                }
            }
        } else if let Some(mut ep) = open.take() {
            ep.end = Some(point.timestamp);
            ep.duration_ms = (point.timestamp - ep.start).num_milliseconds();
            out.push(ep);
        }
    }

    if let (Some(mut ep), Some(last)) = (open.take(), curve.last()) {
        ep.duration_ms = (last.timestamp - ep.start).num_milliseconds();
        out.push(ep);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn curve(equities: &[f64]) -> Vec<EquityPoint> {
        let mut peak = f64::MIN;
        equities
            .iter()
            .enumerate()
            .map(|(i, &equity)| {
                if equity > peak {
                    peak = equity;
                }
                EquityPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(i as i64),
                    equity,
                    cash: equity,
                    position_value: 0.0,
                    drawdown_pct: (peak - equity) / peak * 100.0,
                }
            })
            .collect()
    }

    #[test]
    fn flat_curve_has_no_episodes() {
        assert!(episodes(&curve(&[100.0, 100.0, 100.0])).is_empty());
    }

    #[test]
    fn single_recovered_episode() {
        let eps = episodes(&curve(&[100.0, 90.0, 80.0, 95.0, 100.0]));
        assert_eq!(eps.len(), 1);
        let ep = &eps[0];
        assert!((ep.depth_pct - 20.0).abs() < 1e-10);
        assert!(ep.end.is_some());
        // Opened at hour 1, trough at hour 2, recovered at hour 4
        assert_eq!(ep.duration_ms, 3 * 3600 * 1000);
        assert!(ep.trough > ep.start);
    }

    #[test]
    fn unrecovered_episode_stays_open() {
        let eps = episodes(&curve(&[100.0, 110.0, 99.0, 95.0]));
        assert_eq!(eps.len(), 1);
        assert!(eps[0].end.is_none());
        assert!((eps[0].depth_pct - (110.0 - 95.0) / 110.0 * 100.0).abs() < 1e-10);
        assert_eq!(eps[0].duration_ms, 3600 * 1000);
    }

    #[test]
    fn multiple_episodes_separated_by_new_peaks() {
        let eps = episodes(&curve(&[100.0, 95.0, 101.0, 104.0, 100.0, 105.0]));
        assert_eq!(eps.len(), 2);
        assert!(eps[0].end.is_some());
        assert!(eps[1].end.is_some());
    }
}
