//! Tables whose indexes take more space than their data

use dbaudit_core::{Entity, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::format::show_decimal;
use crate::ignores::entity_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-index-too-heavy";
const RULE_NAME: &str = "entity with too heavy indexes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IndexTooHeavyConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Max index size, relative to the data size
    pub max_index_ratio: f64,
}

rule_conf!(IndexTooHeavyConf);

pub fn rule() -> Rule<IndexTooHeavyConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Indexes bigger than the data slow down writes and use memory, some of them may be unnecessary.",
        conf: IndexTooHeavyConf {
            level: RuleLevel::Low,
            ignores: Vec::new(),
            max_index_ratio: 1.0,
        },
        analyze,
    }
}

fn analyze(conf: &IndexTooHeavyConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_heavy_index_entities(&ctx.database.entities, conf.max_index_ratio)
        .into_iter()
        .filter(|(e, _)| !ignores.contains(&e.entity_ref()))
        .map(|(e, ratio)| {
            let message = format!(
                "Entity {} has too heavy indexes ({}x data size, {} indexes).",
                e.id(),
                show_decimal(ratio),
                e.indexes.len()
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(e.entity_ref())
                .with_extra(json!({"ratio": ratio}))
        })
        .collect()
}

/// Tables with their index/data size ratio, when above `max_ratio`
pub fn get_heavy_index_entities(entities: &[Entity], max_ratio: f64) -> Vec<(&Entity, f64)> {
    entities
        .iter()
        .filter_map(|e| {
            let stats = e.stats.as_ref()?;
            let (size, size_idx) = (stats.size?, stats.size_idx?);
            if size == 0 {
                return None;
            }
            let ratio = size_idx as f64 / size as f64;
            (ratio > max_ratio).then_some((e, ratio))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages};
    use dbaudit_core::{EntityStats, Index};
    use pretty_assertions::assert_eq;

    fn sized(name: &str, size: u64, size_idx: u64) -> Entity {
        Entity::new(name, vec![])
            .with_index(Index::new(Some("idx_a"), vec![vec!["a".to_string()]]))
            .with_index(Index::new(Some("idx_b"), vec![vec!["b".to_string()]]))
            .with_stats(EntityStats {
                size: Some(size),
                size_idx: Some(size_idx),
                ..Default::default()
            })
    }

    #[test]
    fn find_heavy_indexes() {
        let db = database(vec![sized("users", 1000, 2500), sized("posts", 1000, 800), sized("empty", 0, 8192)]);
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec!["Entity users has too heavy indexes (2.5x data size, 2 indexes)."]
        );
    }
}
