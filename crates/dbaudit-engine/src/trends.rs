//! Historical trend comparator
//!
//! Compares a current metric with its values in previous snapshots to detect
//! fast growth, inactivity and degradation. Missing or zero metrics are no
//! evidence: they never produce a result.

use chrono::{DateTime, Duration, Utc};
use dbaudit_core::{AnalyzeHistory, DatabaseQuery, Entity, EntityRef, Index};
use serde::Serialize;

/// Period units, in milliseconds
pub const DAY: i64 = 24 * 60 * 60 * 1000;
pub const MONTH: i64 = 30 * DAY;
pub const YEAR: i64 = 365 * DAY;

/// A metric value in a previous snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint<'a> {
    pub report: &'a str,
    pub date: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Maximum growth rates, as ratios (0.1 is 10%)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthThresholds {
    pub yearly: f64,
    pub monthly: f64,
    pub daily: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Growth {
    pub report: String,
    pub date: DateTime<Utc>,
    pub previous: f64,
    pub current: f64,
    pub growth: f64,
    pub growth_daily: f64,
    pub growth_monthly: f64,
    pub growth_yearly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unused {
    pub since: DateTime<Utc>,
    /// History report where the counter was already the same, `None` when
    /// found from the last activity date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Degradation {
    pub report: String,
    pub date: DateTime<Utc>,
    pub previous: f64,
    pub current: f64,
    pub degradation: f64,
    pub degradation_daily: f64,
}

/// Rate of `change` over `period`, normalized to `unit` (both in ms)
fn rate(change: f64, period: i64, unit: i64) -> f64 {
    change * unit as f64 / period as f64
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Growth since the point with the worst monthly rate, among the points
/// exceeding a threshold
pub fn fastest_growth(
    now: DateTime<Utc>,
    current: Option<f64>,
    points: &[TrendPoint<'_>],
    max: GrowthThresholds,
) -> Option<Growth> {
    let current = positive(current)?;
    let mut worst: Option<Growth> = None;

    for point in points {
        let Some(previous) = positive(point.value) else { continue };
        let period = (now - point.date).num_milliseconds();
        if current <= previous || period <= 0 {
            continue;
        }
        let growth = (current - previous) / previous;
        let growth_daily = rate(growth, period, DAY);
        let growth_monthly = rate(growth, period, MONTH);
        let growth_yearly = rate(growth, period, YEAR);
        let flagged = (period >= YEAR && growth_yearly > max.yearly)
            || (period >= MONTH && growth_monthly > max.monthly)
            || (period >= DAY && growth_daily > max.daily);
        if flagged && worst.as_ref().map_or(true, |w| growth_monthly > w.growth_monthly) {
            worst = Some(Growth {
                report: point.report.to_string(),
                date: point.date,
                previous,
                current,
                growth,
                growth_daily,
                growth_monthly,
                growth_yearly,
            });
        }
    }
    worst
}

/// Earliest date since when the activity counter did not move, either from
/// history (measured at `now`) or from the last activity date (measured at
/// `scan_time`, when the stats were extracted)
pub fn unused_since(
    now: DateTime<Utc>,
    scan_time: DateTime<Utc>,
    current: Option<f64>,
    last_activity: Option<DateTime<Utc>>,
    points: &[TrendPoint<'_>],
    min_days: i64,
) -> Option<Unused> {
    // out of range periods can't be reached
    let min_period = Duration::try_days(min_days)?;

    let from_history = positive(current).and_then(|count| {
        points
            .iter()
            .filter(|p| p.value == Some(count) && now - p.date >= min_period)
            .min_by_key(|p| p.date)
            .map(|p| Unused {
                since: p.date,
                report: Some(p.report.to_string()),
                count: Some(count),
            })
    });
    let from_last_activity = last_activity.filter(|last| scan_time - *last >= min_period).map(|last| Unused {
        since: last,
        report: None,
        count: None,
    });

    match (from_history, from_last_activity) {
        (Some(history), Some(last)) => Some(if last.since < history.since { last } else { history }),
        (history, last) => history.or(last),
    }
}

/// Degradation since the point with the worst daily rate, among the points
/// exceeding a threshold
pub fn worst_degradation(
    now: DateTime<Utc>,
    current: Option<f64>,
    points: &[TrendPoint<'_>],
    max_degradation: f64,
    max_degradation_daily: f64,
) -> Option<Degradation> {
    let current = positive(current)?;
    let mut worst: Option<Degradation> = None;

    for point in points {
        let Some(previous) = positive(point.value) else { continue };
        let period = (now - point.date).num_milliseconds();
        if current <= previous || period <= 0 {
            continue;
        }
        let degradation = (current - previous) / previous;
        let degradation_daily = rate(degradation, period, DAY);
        let flagged = degradation > max_degradation || (period >= DAY && degradation_daily > max_degradation_daily);
        if flagged && worst.as_ref().map_or(true, |w| degradation_daily > w.degradation_daily) {
            worst = Some(Degradation {
                report: point.report.to_string(),
                date: point.date,
                previous,
                current,
                degradation,
                degradation_daily,
            });
        }
    }
    worst
}

/// Metric of an entity in every history snapshot
pub fn entity_points<'a>(
    history: &'a [AnalyzeHistory],
    entity: &EntityRef,
    metric: impl Fn(&Entity) -> Option<f64>,
) -> Vec<TrendPoint<'a>> {
    history
        .iter()
        .map(|h| TrendPoint {
            report: &h.report,
            date: h.date,
            value: h.database.find_entity(entity).and_then(&metric),
        })
        .collect()
}

/// Metric of an index in every history snapshot, matched by name or by attributes when unnamed
pub fn index_points<'a>(
    history: &'a [AnalyzeHistory],
    entity: &EntityRef,
    index: &Index,
    metric: impl Fn(&Index) -> Option<f64>,
) -> Vec<TrendPoint<'a>> {
    history
        .iter()
        .map(|h| TrendPoint {
            report: &h.report,
            date: h.date,
            value: h
                .database
                .find_entity(entity)
                .and_then(|e| e.indexes.iter().find(|i| same_index(i, index)))
                .and_then(&metric),
        })
        .collect()
}

fn same_index(a: &Index, b: &Index) -> bool {
    match (&a.name, &b.name) {
        (Some(a), Some(b)) => a == b,
        _ => a.attrs == b.attrs,
    }
}

/// Metric of a query in every history snapshot
pub fn query_points<'a>(
    history: &'a [AnalyzeHistory],
    query_id: &str,
    metric: impl Fn(&DatabaseQuery) -> Option<f64>,
) -> Vec<TrendPoint<'a>> {
    history
        .iter()
        .map(|h| TrendPoint {
            report: &h.report,
            date: h.date,
            value: h.queries.iter().find(|q| q.id == query_id).and_then(&metric),
        })
        .collect()
}
