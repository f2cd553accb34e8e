//! Relations pointing to entities absent from the snapshot

use dbaudit_core::{Database, EntityRef, Relation, RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::relation_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "relation-miss-entity";
const RULE_NAME: &str = "relation with missing entity";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Relations should link existing entities, they may have been renamed or dropped.",
        conf: BasicConf::new(RuleLevel::High),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = relation_ignores(&conf.ignores, ctx.reference);
    get_missing_entity_relations(ctx.database)
        .into_iter()
        .filter(|(relation, _)| !ignores.contains(&relation.src_attrs()))
        .map(|(relation, missing)| {
            let message = format!(
                "Relation {} references missing entity(ies): {}.",
                relation.id(),
                missing.iter().map(EntityRef::id).collect::<Vec<_>>().join(", ")
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(relation.src.clone())
                .with_extra(json!({"relation": relation, "missing": missing}))
        })
        .collect()
}

/// Relations with their source and/or referenced entity missing
pub fn get_missing_entity_relations(database: &Database) -> Vec<(&Relation, Vec<EntityRef>)> {
    database
        .relations
        .iter()
        .filter_map(|relation| {
            let mut missing: Vec<EntityRef> = Vec::new();
            for entity in [&relation.src, &relation.reference] {
                if database.find_entity(entity).is_none() && !missing.contains(entity) {
                    missing.push(entity.clone());
                }
            }
            (!missing.is_empty()).then_some((relation, missing))
        })
        .collect()
}
