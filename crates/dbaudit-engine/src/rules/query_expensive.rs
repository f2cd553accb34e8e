//! Queries with the highest cumulated execution time

use dbaudit_core::{DatabaseQuery, QueryStats, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::QueryNamer;
use crate::format::show_duration;
use crate::ignores::query_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "query-expensive";
const RULE_NAME: &str = "expensive query";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpensiveConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Number of queries to report
    pub max_queries: usize,
}

rule_conf!(ExpensiveConf);

pub fn rule() -> Rule<ExpensiveConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Queries consuming the most database time overall, optimizing them has the biggest impact.",
        conf: ExpensiveConf {
            level: RuleLevel::Medium,
            ignores: Vec::new(),
            max_queries: 10,
        },
        analyze,
    }
}

fn analyze(conf: &ExpensiveConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = query_ignores(&conf.ignores, ctx.reference);
    let namer = QueryNamer::new(ctx.database);
    let candidates: Vec<_> = ctx.queries.iter().filter(|q| !ignores.contains(&q.id)).collect();
    get_most_expensive_queries(&candidates, conf.max_queries)
        .into_iter()
        .map(|(q, exec)| {
            let query = namer.name(q);
            let message = format!(
                "{} is one of the most expensive, cumulated {} exec time in {} executions ({} avg).",
                query.label(),
                show_duration(exec.sum_time),
                exec.count,
                show_duration(exec.mean_time)
            );
            query.violation(RULE_ID, RULE_NAME, conf.level, message, json!({"stats": exec}))
        })
        .collect()
}

/// Queries with the highest total execution time, most expensive first
pub fn get_most_expensive_queries<'a>(queries: &[&'a DatabaseQuery], max: usize) -> Vec<(&'a DatabaseQuery, &'a QueryStats)> {
    let mut executed: Vec<_> = queries
        .iter()
        .filter_map(|q| q.exec.as_ref().filter(|e| e.sum_time > 0.0).map(|e| (*q, e)))
        .collect();
    executed.sort_by(|(_, a), (_, b)| b.sum_time.total_cmp(&a.sum_time));
    executed.truncate(max);
    executed
}
