//! Relations whose source attributes are not indexed

use dbaudit_core::{AttributesRef, Database, Relation, RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::{attributes_ignores, extra_value};
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "index-on-relation";
const RULE_NAME: &str = "index on relation";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Relations are used in joins, an index on their source attributes makes them much faster.",
        conf: BasicConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attributes_ignores(&conf.ignores, ctx.reference, |v| extra_value(v, "indexAttrs"));
    get_missing_relation_indexes(ctx.database)
        .into_iter()
        .filter(|missing| !ignores.contains(&missing.attributes))
        .map(|missing| {
            let message = format!(
                "Create an index on {} to improve {} relation.",
                missing.attributes.id(),
                missing.relation.id()
            );
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(missing.attributes.entity.clone())
                .with_extra(json!({"indexAttrs": missing.attributes, "relation": missing.relation}))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingIndex<'a> {
    pub attributes: AttributesRef,
    pub relation: &'a Relation,
}

/// Relation source attributes not starting any index or the primary key,
/// once per attribute list
pub fn get_missing_relation_indexes(database: &Database) -> Vec<MissingIndex<'_>> {
    let mut missing: Vec<MissingIndex<'_>> = Vec::new();
    for relation in &database.relations {
        let Some(entity) = database.find_entity(&relation.src) else { continue };
        if !entity.is_table() {
            continue;
        }
        let attrs: Vec<_> = relation.attrs.iter().map(|link| link.src.clone()).collect();
        let indexed = entity
            .pk
            .iter()
            .map(|pk| &pk.attrs)
            .chain(entity.indexes.iter().map(|i| &i.attrs))
            .any(|index| index.starts_with(&attrs));
        let attributes = relation.src_attrs();
        if !indexed && !missing.iter().any(|m| m.attributes == attributes) {
            missing.push(MissingIndex { attributes, relation });
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, messages};
    use dbaudit_core::{Attribute, Entity, EntityRef, Index};
    use pretty_assertions::assert_eq;

    fn relation(src: &str, attr: &str) -> Relation {
        Relation::new(EntityRef::new(src), vec![attr.to_string()], EntityRef::new("users"), vec!["id".to_string()])
    }

    #[test]
    fn find_relations_without_index() {
        let db = Database {
            entities: vec![
                Entity::new("users", vec![Attribute::new("id", "int")]).with_pk(vec![vec!["id".to_string()]]),
                Entity::new("posts", vec![Attribute::new("author", "int"), Attribute::new("editor", "int")])
                    .with_index(Index::new(Some("posts_author_idx"), vec![vec!["author".to_string()], vec!["created_at".to_string()]])),
            ],
            relations: vec![relation("posts", "author"), relation("posts", "editor"), relation("posts", "editor")],
            ..Default::default()
        };
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec!["Create an index on posts(editor) to improve posts(editor)->users(id) relation."]
        );
    }
}
