//! Indexes not scanned for a while

use dbaudit_core::{Entity, Index, RuleLevel, RuleViolation};
use serde_json::json;

use super::entity_unused::{unused_source, UnusedConf};
use crate::format::show_date;
use crate::ignores::{attributes_ignores, extra_value};
use crate::rule::{Rule, RuleContext};
use crate::trends::{index_points, unused_since, Unused};

pub const RULE_ID: &str = "index-unused";
const RULE_NAME: &str = "unused index";

pub fn rule() -> Rule<UnusedConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Indexes never used by queries only slow down writes, check all database instances before removing them.",
        conf: UnusedConf::new(RuleLevel::Medium),
        analyze,
    }
}

fn analyze(conf: &UnusedConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attributes_ignores(&conf.ignores, ctx.reference, |v| extra_value(v, "index"));
    get_unused_indexes(ctx, conf.min_days)
        .into_iter()
        .filter(|(e, index, _)| !ignores.contains(&e.attributes_ref(&index.attrs)))
        .map(|(e, index, unused)| {
            let index_ref = e.attributes_ref(&index.attrs);
            let message = format!(
                "Index {} on {} is unused since {} ({}).",
                index.label(),
                index_ref.id(),
                show_date(&unused.since),
                unused_source(&unused, "scan")
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(e.entity_ref())
                .with_extra(json!({"index": index_ref, "unused": unused}))
        })
        .collect()
}

pub fn get_unused_indexes<'a>(ctx: &RuleContext<'a>, min_days: i64) -> Vec<(&'a Entity, &'a Index, Unused)> {
    let scans = |i: &Index| i.stats.as_ref().and_then(|s| s.scans).map(|s| s as f64);
    ctx.database
        .entities
        .iter()
        .flat_map(|e| e.indexes.iter().map(move |index| (e, index)))
        .filter_map(|(e, index)| {
            let points = index_points(ctx.history, &e.entity_ref(), index, scans);
            let last_scan = index.stats.as_ref().and_then(|s| s.scans_last);
            unused_since(ctx.now, ctx.snapshot_time(), scans(index), last_scan, &points, min_days).map(|unused| (e, index, unused))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages, now};
    use chrono::Duration;
    use dbaudit_core::IndexStats;
    use pretty_assertions::assert_eq;

    #[test]
    fn find_unused_index() {
        let index = |name: &str, days: i64| {
            Index::new(Some(name), vec![vec![name.to_string()]]).with_stats(IndexStats {
                size: Some(8192),
                scans: Some(10),
                scans_last: Some(now() - Duration::days(days)),
            })
        };
        let db = database(vec![Entity::new("users", vec![]).with_index(index("email", 90)).with_index(index("name", 3))]);
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec!["Index email on users(email) is unused since 2024-03-03 (last scan)."]
        );
    }
}
