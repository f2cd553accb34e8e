//! Relations pointing to attributes absent from existing entities

use dbaudit_core::{AttributeRef, Database, Relation, RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::relation_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "relation-miss-attribute";
const RULE_NAME: &str = "relation with missing attributes";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Relations should link existing attributes, they may have been renamed or dropped.",
        conf: BasicConf::new(RuleLevel::High),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = relation_ignores(&conf.ignores, ctx.reference);
    get_missing_attribute_relations(ctx.database)
        .into_iter()
        .filter(|(relation, _)| !ignores.contains(&relation.src_attrs()))
        .map(|(relation, missing)| {
            let message = format!(
                "Relation {} references missing attribute(s): {}.",
                relation.id(),
                missing.iter().map(AttributeRef::id).collect::<Vec<_>>().join(", ")
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(relation.src.clone())
                .with_extra(json!({"relation": relation, "missing": missing}))
        })
        .collect()
}

/// Relations with attributes missing in their (existing) entities, missing
/// entities are left to `relation-miss-entity`
pub fn get_missing_attribute_relations(database: &Database) -> Vec<(&Relation, Vec<AttributeRef>)> {
    database
        .relations
        .iter()
        .filter_map(|relation| {
            let src = database.find_entity(&relation.src);
            let reference = database.find_entity(&relation.reference);
            let mut missing: Vec<AttributeRef> = Vec::new();
            for link in &relation.attrs {
                if src.is_some_and(|e| e.find_attribute(&link.src).is_none()) {
                    missing.push(AttributeRef::new(relation.src.clone(), link.src.clone()));
                }
                if reference.is_some_and(|e| e.find_attribute(&link.reference).is_none()) {
                    missing.push(AttributeRef::new(relation.reference.clone(), link.reference.clone()));
                }
            }
            (!missing.is_empty()).then_some((relation, missing))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, messages};
    use dbaudit_core::{Attribute, Entity, EntityRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn find_relations_with_missing_attributes() {
        let relation = |attr: &str, ref_attr: &str| {
            Relation::new(EntityRef::new("posts"), vec![attr.to_string()], EntityRef::new("users"), vec![ref_attr.to_string()])
        };
        let db = Database {
            entities: vec![
                Entity::new("users", vec![Attribute::new("id", "int")]),
                Entity::new("posts", vec![Attribute::new("author", "int")]),
            ],
            relations: vec![
                relation("author", "id"),
                relation("editor", "id"),
                relation("editor", "uuid"),
                Relation::new(EntityRef::new("logs"), vec!["user".to_string()], EntityRef::new("users"), vec!["id".to_string()]),
            ],
            ..Default::default()
        };
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec![
                "Relation posts(editor)->users(id) references missing attribute(s): posts(editor).",
                "Relation posts(editor)->users(uuid) references missing attribute(s): posts(editor), users(uuid).",
            ]
        );
    }
}
