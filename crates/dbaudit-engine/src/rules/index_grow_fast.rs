//! Indexes whose size grows fast compared to previous snapshots

use dbaudit_core::{Entity, Index, RuleLevel, RuleViolation};
use serde_json::json;

use super::entity_grow_fast::GrowthConf;
use crate::format::{show_bytes, show_date, show_percent};
use crate::ignores::{attributes_ignores, extra_value};
use crate::rule::{Rule, RuleContext};
use crate::trends::{fastest_growth, index_points, Growth, GrowthThresholds};

pub const RULE_ID: &str = "index-grow-fast";
const RULE_NAME: &str = "fast growing index";

pub fn rule() -> Rule<GrowthConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Indexes growing fast use more and more memory, check they are still useful.",
        conf: GrowthConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &GrowthConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attributes_ignores(&conf.ignores, ctx.reference, |v| extra_value(v, "index"));
    get_fast_growing_indexes(ctx, conf.thresholds())
        .into_iter()
        .filter(|(e, index, _)| !ignores.contains(&e.attributes_ref(&index.attrs)))
        .map(|(e, index, growth)| {
            let index_ref = e.attributes_ref(&index.attrs);
            let message = format!(
                "Index {} on {} has grown by {} ({}) since {} ({} monthly).",
                index.label(),
                index_ref.id(),
                show_percent(growth.growth),
                show_bytes((growth.current - growth.previous).max(0.0) as u64),
                show_date(&growth.date),
                show_percent(growth.growth_monthly)
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(e.entity_ref())
                .with_extra(json!({"index": index_ref, "growth": growth}))
        })
        .collect()
}

/// Indexes with their fastest size growth over the thresholds
pub fn get_fast_growing_indexes<'a>(ctx: &RuleContext<'a>, max: GrowthThresholds) -> Vec<(&'a Entity, &'a Index, Growth)> {
    let size = |i: &Index| i.stats.as_ref().and_then(|s| s.size).map(|s| s as f64);
    ctx.database
        .entities
        .iter()
        .flat_map(|e| e.indexes.iter().map(move |index| (e, index)))
        .filter_map(|(e, index)| {
            let points = index_points(ctx.history, &e.entity_ref(), index, size);
            fastest_growth(ctx.now, size(index), &points, max).map(|growth| (e, index, growth))
        })
        .collect()
}
