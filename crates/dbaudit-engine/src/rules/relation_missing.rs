//! Relations guessed from attribute names but not declared

use dbaudit_core::{refs::attribute_path_id, Relation, RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::relation_ignores;
use crate::inference::infer_missing_relations;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "relation-missing";
const RULE_NAME: &str = "missing relation";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Attributes named like references to other entities should be declared as relations (foreign keys).",
        conf: BasicConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = relation_ignores(&conf.ignores, ctx.reference);
    infer_missing_relations(&ctx.database.entities, &ctx.database.relations)
        .into_iter()
        .filter(|relation| !ignores.contains(&relation.src_attrs()))
        .map(|relation| {
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, missing_relation_message(&relation))
                .with_entity(relation.src.clone())
                .with_extra(json!({"relation": relation}))
        })
        .collect()
}

fn missing_relation_message(relation: &Relation) -> String {
    let polymorphic = match &relation.polymorphic {
        Some(p) => {
            let value = p.value.as_str().map(str::to_string).unwrap_or_else(|| p.value.to_string());
            format!(" when {} is {}", attribute_path_id(&p.attribute), value)
        }
        None => String::new(),
    };
    format!(
        "Create a relation from {} to {}{}.",
        relation.src_attrs().id(),
        relation.ref_attrs().id(),
        polymorphic
    )
}
