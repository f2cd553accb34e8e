//! Queries getting slower compared to previous snapshots

use dbaudit_core::{DatabaseQuery, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::QueryNamer;
use crate::format::{show_date, show_duration, show_percent};
use crate::ignores::query_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};
use crate::trends::{query_points, worst_degradation, Degradation};

pub const RULE_ID: &str = "query-degrading";
const RULE_NAME: &str = "degrading query";

/// Degradation thresholds on mean execution time, as ratios (0.1 is 10%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DegradingConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    pub max_degradation: f64,
    pub max_degradation_daily: f64,
}

rule_conf!(DegradingConf);

pub fn rule() -> Rule<DegradingConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Queries whose mean execution time increases may suffer from data growth, a missing index or a plan change.",
        conf: DegradingConf {
            level: RuleLevel::Medium,
            ignores: Vec::new(),
            max_degradation: 1.0,
            max_degradation_daily: 0.1,
        },
        analyze,
    }
}

fn analyze(conf: &DegradingConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = query_ignores(&conf.ignores, ctx.reference);
    let namer = QueryNamer::new(ctx.database);
    get_degrading_queries(ctx, conf.max_degradation, conf.max_degradation_daily)
        .into_iter()
        .filter(|(q, _)| !ignores.contains(&q.id))
        .map(|(q, degradation)| {
            let query = namer.name(q);
            let message = format!(
                "{} has degraded by {} ({}) since {} ({} daily).",
                query.label(),
                show_percent(degradation.degradation),
                show_duration(degradation.current - degradation.previous),
                show_date(&degradation.date),
                show_percent(degradation.degradation_daily)
            );
            query.violation(RULE_ID, RULE_NAME, conf.level, message, json!({"degradation": degradation}))
        })
        .collect()
}

/// Queries with their worst mean time degradation over the thresholds
pub fn get_degrading_queries<'a>(
    ctx: &RuleContext<'a>,
    max_degradation: f64,
    max_degradation_daily: f64,
) -> Vec<(&'a DatabaseQuery, Degradation)> {
    let mean_time = |q: &DatabaseQuery| q.exec.as_ref().map(|e| e.mean_time);
    ctx.queries
        .iter()
        .filter_map(|q| {
            let points = query_points(ctx.history, &q.id, mean_time);
            worst_degradation(ctx.now, mean_time(q), &points, max_degradation, max_degradation_daily).map(|d| (q, d))
        })
        .collect()
}
