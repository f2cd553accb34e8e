//! Tables needing maintenance: dead rows, vacuum or analyze lagging behind

use chrono::{DateTime, Duration, Utc};
use dbaudit_core::{Entity, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::format::show_date;
use crate::ignores::entity_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-not-clean";
const RULE_NAME: &str = "entity not clean";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotCleanConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    pub max_dead_rows: u64,
    pub max_vacuum_lag: u64,
    pub max_analyze_lag: u64,
    pub max_vacuum_delay_days: i64,
    pub max_analyze_delay_days: i64,
}

rule_conf!(NotCleanConf);

pub fn rule() -> Rule<NotCleanConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Dead rows and outdated statistics make queries slower, check the vacuum and analyze settings.",
        conf: NotCleanConf {
            level: RuleLevel::Low,
            ignores: Vec::new(),
            max_dead_rows: 30_000,
            max_vacuum_lag: 30_000,
            max_analyze_lag: 30_000,
            max_vacuum_delay_days: 30,
            max_analyze_delay_days: 30,
        },
        analyze,
    }
}

fn analyze(conf: &NotCleanConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_unclean_entities(&ctx.database.entities, ctx.snapshot_time(), conf)
        .into_iter()
        .filter(|(e, _)| !ignores.contains(&e.entity_ref()))
        .map(|(e, reasons)| {
            let message = format!("Entity {} is not clean: {}.", e.id(), reasons.join(", "));
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(e.entity_ref())
                .with_extra(json!({"reasons": reasons}))
        })
        .collect()
}

/// Tables with the reasons they are not clean
pub fn get_unclean_entities<'a>(entities: &'a [Entity], now: DateTime<Utc>, conf: &NotCleanConf) -> Vec<(&'a Entity, Vec<String>)> {
    entities
        .iter()
        .filter_map(|e| {
            let stats = e.stats.as_ref()?;
            let mut reasons = Vec::new();
            if let Some(dead) = stats.rows_dead.filter(|d| *d > conf.max_dead_rows) {
                reasons.push(format!("{} dead rows", dead));
            }
            if let Some(lag) = stats.vacuum_lag.filter(|l| *l > conf.max_vacuum_lag) {
                reasons.push(format!("{} rows to vacuum", lag));
            }
            if let Some(lag) = stats.analyze_lag.filter(|l| *l > conf.max_analyze_lag) {
                reasons.push(format!("{} rows to analyze", lag));
            }
            if let Some(last) = stats.vacuum_last.filter(|d| is_older(now, *d, conf.max_vacuum_delay_days)) {
                reasons.push(format!("last vacuum on {}", show_date(&last)));
            }
            if let Some(last) = stats.analyze_last.filter(|d| is_older(now, *d, conf.max_analyze_delay_days)) {
                reasons.push(format!("last analyze on {}", show_date(&last)));
            }
            (!reasons.is_empty()).then_some((e, reasons))
        })
        .collect()
}

/// Out of range delays are never exceeded
fn is_older(now: DateTime<Utc>, date: DateTime<Utc>, max_days: i64) -> bool {
    Duration::try_days(max_days).is_some_and(|max| now - date > max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages, now};
    use dbaudit_core::{DatabaseStats, EntityStats};
    use pretty_assertions::assert_eq;

    #[test]
    fn find_unclean_entities() {
        let db = database(vec![
            Entity::new("users", vec![]).with_stats(EntityStats {
                rows_dead: Some(45_000),
                vacuum_lag: Some(100),
                vacuum_last: Some(now() - Duration::days(60)),
                analyze_last: Some(now() - Duration::days(2)),
                ..Default::default()
            }),
            Entity::new("posts", vec![]).with_stats(EntityStats {
                rows_dead: Some(12),
                ..Default::default()
            }),
        ]);
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec!["Entity users is not clean: 45000 dead rows, last vacuum on 2024-04-02."]
        );
    }

    #[test]
    fn delays_measured_from_extraction() {
        let mut db = database(vec![Entity::new("users", vec![]).with_stats(EntityStats {
            vacuum_last: Some(now() - Duration::days(60)),
            ..Default::default()
        })]);
        db.stats = Some(DatabaseStats {
            extracted_at: Some(now() - Duration::days(50)),
            ..Default::default()
        });
        assert!((rule().analyze)(&rule().conf, &context(&db)).is_empty());
    }

    #[test]
    fn huge_delays_are_never_exceeded() {
        let db = database(vec![Entity::new("users", vec![]).with_stats(EntityStats {
            vacuum_last: Some(now() - Duration::days(600)),
            analyze_last: Some(now() - Duration::days(600)),
            ..Default::default()
        })]);
        let conf = NotCleanConf {
            max_vacuum_delay_days: i64::MAX,
            max_analyze_delay_days: i64::MAX,
            ..rule().conf
        };
        assert!((rule().analyze)(&conf, &context(&db)).is_empty());
    }
}
