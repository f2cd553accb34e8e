//! Tables not scanned for a while

use dbaudit_core::{Entity, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};

use crate::format::show_date;
use crate::ignores::entity_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};
use crate::trends::{entity_points, unused_since, Unused};

pub const RULE_ID: &str = "entity-unused";
const RULE_NAME: &str = "unused entity";

/// Conf of the unused rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnusedConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Days without activity before reporting
    pub min_days: i64,
}

rule_conf!(UnusedConf);

impl UnusedConf {
    pub fn new(level: RuleLevel) -> Self {
        Self {
            level,
            ignores: Vec::new(),
            min_days: 30,
        }
    }
}

pub fn rule() -> Rule<UnusedConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Tables not read for a long time may be dead, check all database instances before removing them.",
        conf: UnusedConf::new(RuleLevel::Medium),
        analyze,
    }
}

fn analyze(conf: &UnusedConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_unused_entities(ctx, conf.min_days)
        .into_iter()
        .filter(|(e, _)| !ignores.contains(&e.entity_ref()))
        .map(|(e, unused)| {
            let message = format!(
                "Entity {} is unused since {} ({}).",
                e.id(),
                show_date(&unused.since),
                unused_source(&unused, "scan")
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(e.entity_ref())
                .with_extra(serde_json::to_value(&unused).unwrap_or_default())
        })
        .collect()
}

/// How inactivity was found, for messages
pub(crate) fn unused_source(unused: &Unused, activity: &str) -> String {
    match &unused.report {
        Some(report) => format!("no new {} since {}", activity, report),
        None => format!("last {}", activity),
    }
}

pub fn get_unused_entities<'a>(ctx: &RuleContext<'a>, min_days: i64) -> Vec<(&'a Entity, Unused)> {
    let scans = |e: &Entity| e.stats.as_ref().and_then(|s| s.scans()).map(|s| s as f64);
    ctx.database
        .entities
        .iter()
        .filter(|e| e.is_table())
        .filter_map(|e| {
            let points = entity_points(ctx.history, &e.entity_ref(), scans);
            let last_scan = e.stats.as_ref().and_then(|s| s.scans_last());
            unused_since(ctx.now, ctx.snapshot_time(), scans(e), last_scan, &points, min_days).map(|unused| (e, unused))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages, now};
    use chrono::Duration;
    use dbaudit_core::{AnalyzeHistory, DatabaseStats, EntityStats};
    use pretty_assertions::assert_eq;

    fn scanned(name: &str, scans: u64) -> Entity {
        Entity::new(name, vec![]).with_stats(EntityStats {
            scan_seq: Some(scans),
            ..Default::default()
        })
    }

    #[test]
    fn unused_from_history() {
        let db = database(vec![scanned("users", 100), scanned("posts", 42)]);
        let history = vec![AnalyzeHistory::new(
            "report_2024-04-01",
            now() - Duration::days(61),
            database(vec![scanned("users", 50), scanned("posts", 42)]),
        )];
        let ctx = RuleContext {
            history: &history,
            ..context(&db)
        };
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &ctx)),
            vec!["Entity posts is unused since 2024-04-01 (no new scan since report_2024-04-01)."]
        );
    }

    #[test]
    fn unused_from_last_scan() {
        let db = database(vec![Entity::new("users", vec![]).with_stats(EntityStats {
            scan_idx: Some(3),
            scan_idx_last: Some(now() - Duration::days(40)),
            ..Default::default()
        })]);
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec!["Entity users is unused since 2024-04-22 (last scan)."]
        );
    }

    #[test]
    fn huge_min_days_reports_nothing() {
        let db = database(vec![Entity::new("users", vec![]).with_stats(EntityStats {
            scan_idx: Some(3),
            scan_idx_last: Some(now() - Duration::days(400)),
            ..Default::default()
        })]);
        let conf = UnusedConf {
            min_days: i64::MAX,
            ..rule().conf
        };
        assert!((rule().analyze)(&conf, &context(&db)).is_empty());
    }

    #[test]
    fn last_scan_measured_from_extraction() {
        let mut db = database(vec![Entity::new("users", vec![]).with_stats(EntityStats {
            scan_idx: Some(3),
            scan_idx_last: Some(now() - Duration::days(40)),
            ..Default::default()
        })]);
        db.stats = Some(DatabaseStats {
            extracted_at: Some(now() - Duration::days(20)),
            ..Default::default()
        });
        assert!((rule().analyze)(&rule().conf, &context(&db)).is_empty());
    }
}
