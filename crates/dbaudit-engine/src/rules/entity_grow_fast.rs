//! Tables whose row count grows fast compared to previous snapshots

use dbaudit_core::{Entity, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};

use crate::format::{show_date, show_percent};
use crate::ignores::entity_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};
use crate::trends::{entity_points, fastest_growth, Growth, GrowthThresholds};

pub const RULE_ID: &str = "entity-grow-fast";
const RULE_NAME: &str = "fast growing entity";

/// Growth thresholds, as ratios (0.1 is 10%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrowthConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    pub max_growth_yearly: f64,
    pub max_growth_monthly: f64,
    pub max_growth_daily: f64,
}

rule_conf!(GrowthConf);

impl GrowthConf {
    pub fn new(level: RuleLevel) -> Self {
        Self {
            level,
            ignores: Vec::new(),
            max_growth_yearly: 1.0,
            max_growth_monthly: 0.1,
            max_growth_daily: 0.01,
        }
    }

    pub fn thresholds(&self) -> GrowthThresholds {
        GrowthThresholds {
            yearly: self.max_growth_yearly,
            monthly: self.max_growth_monthly,
            daily: self.max_growth_daily,
        }
    }
}

pub fn rule() -> Rule<GrowthConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Tables growing fast may need partitioning, archiving or a closer look at what creates rows.",
        conf: GrowthConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &GrowthConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_fast_growing_entities(ctx, conf.thresholds())
        .into_iter()
        .filter(|(e, _)| !ignores.contains(&e.entity_ref()))
        .map(|(e, growth)| {
            let message = format!(
                "Entity {} has grown by {} ({} rows) since {} ({} monthly).",
                e.id(),
                show_percent(growth.growth),
                (growth.current - growth.previous).round(),
                show_date(&growth.date),
                show_percent(growth.growth_monthly)
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(e.entity_ref())
                .with_extra(serde_json::to_value(&growth).unwrap_or_default())
        })
        .collect()
}

/// Tables with their fastest row growth over the thresholds
pub fn get_fast_growing_entities<'a>(ctx: &RuleContext<'a>, max: GrowthThresholds) -> Vec<(&'a Entity, Growth)> {
    let rows = |e: &Entity| e.stats.as_ref().and_then(|s| s.rows).map(|r| r as f64);
    ctx.database
        .entities
        .iter()
        .filter(|e| e.is_table())
        .filter_map(|e| {
            let points = entity_points(ctx.history, &e.entity_ref(), rows);
            fastest_growth(ctx.now, rows(e), &points, max).map(|growth| (e, growth))
        })
        .collect()
}
