//! Queries slower than a fixed mean time

use dbaudit_core::{DatabaseQuery, QueryStats, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::QueryNamer;
use crate::format::show_duration;
use crate::ignores::query_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "query-too-slow";
const RULE_NAME: &str = "query too slow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TooSlowConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    pub max_ms: f64,
}

rule_conf!(TooSlowConf);

pub fn rule() -> Rule<TooSlowConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Slow queries hurt user experience and hold resources, check their plan for missing indexes.",
        conf: TooSlowConf {
            level: RuleLevel::Medium,
            ignores: Vec::new(),
            max_ms: 1000.0,
        },
        analyze,
    }
}

fn analyze(conf: &TooSlowConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = query_ignores(&conf.ignores, ctx.reference);
    let namer = QueryNamer::new(ctx.database);
    get_slow_queries(ctx.queries, conf.max_ms)
        .into_iter()
        .filter(|(q, _)| !ignores.contains(&q.id))
        .map(|(q, exec)| {
            let query = namer.name(q);
            let message = format!("{} is too slow ({} avg).", query.label(), show_duration(exec.mean_time));
            query.violation(RULE_ID, RULE_NAME, conf.level, message, json!({"stats": exec}))
        })
        .collect()
}

pub fn get_slow_queries(queries: &[DatabaseQuery], max_ms: f64) -> Vec<(&DatabaseQuery, &QueryStats)> {
    queries
        .iter()
        .filter_map(|q| q.exec.as_ref().filter(|e| e.mean_time > max_ms).map(|e| (q, e)))
        .collect()
}
