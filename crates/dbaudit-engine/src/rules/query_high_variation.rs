//! Queries with unstable execution time

use dbaudit_core::{DatabaseQuery, QueryStats, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::QueryNamer;
use crate::format::show_duration;
use crate::ignores::query_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "query-high-variation";
const RULE_NAME: &str = "query with high variation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VariationConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    pub max_standard_deviation_ms: f64,
}

rule_conf!(VariationConf);

pub fn rule() -> Rule<VariationConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Queries with a high execution time variation depend on their parameters or suffer from locks and cache misses.",
        conf: VariationConf {
            level: RuleLevel::Low,
            ignores: Vec::new(),
            max_standard_deviation_ms: 500.0,
        },
        analyze,
    }
}

fn analyze(conf: &VariationConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = query_ignores(&conf.ignores, ctx.reference);
    let namer = QueryNamer::new(ctx.database);
    get_high_variation_queries(ctx.queries, conf.max_standard_deviation_ms)
        .into_iter()
        .filter(|(q, _)| !ignores.contains(&q.id))
        .map(|(q, exec)| {
            let query = namer.name(q);
            let message = format!(
                "{} has high variation, with {} standard deviation and execution time ranging from {} to {}.",
                query.label(),
                show_duration(exec.sd_time),
                show_duration(exec.min_time),
                show_duration(exec.max_time)
            );
            query.violation(RULE_ID, RULE_NAME, conf.level, message, json!({"stats": exec}))
        })
        .collect()
}

pub fn get_high_variation_queries(queries: &[DatabaseQuery], max_sd_ms: f64) -> Vec<(&DatabaseQuery, &QueryStats)> {
    queries
        .iter()
        .filter_map(|q| q.exec.as_ref().filter(|e| e.sd_time > max_sd_ms).map(|e| (q, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages};
    use pretty_assertions::assert_eq;

    #[test]
    fn report_high_variation() {
        let db = database(vec![]);
        let stats = |sd_time: f64| QueryStats {
            count: 20,
            min_time: 12.0,
            max_time: 4500.0,
            sd_time,
            ..Default::default()
        };
        let queries = vec![
            DatabaseQuery::new("1", "DELETE FROM sessions").with_exec(stats(800.0)),
            DatabaseQuery::new("2", "SELECT * FROM users").with_exec(stats(80.0)),
        ];
        let ctx = RuleContext {
            queries: &queries,
            ..context(&db)
        };
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &ctx)),
            vec!["Query 1 (DELETE sessions) has high variation, with 800 ms standard deviation and execution time ranging from 12 ms to 4.5 s."]
        );
    }
}
