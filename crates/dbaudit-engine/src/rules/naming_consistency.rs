//! Entity and attribute naming conventions, in a single rule
//!
//! Off by default: `entity-name-inconsistent` and `attribute-name-inconsistent`
//! report the same findings separately.

use dbaudit_core::{RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::{attribute_ignores, entity_ignores};
use crate::naming::{attribute_names, check_naming_consistency, entity_names};
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "naming-consistency";
const RULE_NAME: &str = "naming consistency";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Entity and attribute names should each follow a single naming convention.",
        conf: BasicConf::new(RuleLevel::Off),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignored_entities = entity_ignores(&conf.ignores, ctx.reference);
    let ignored_attributes = attribute_ignores(&conf.ignores, ctx.reference);
    let entities = check_naming_consistency(&entity_names(&ctx.database.entities));
    let attributes = check_naming_consistency(&attribute_names(&ctx.database.entities));

    let entity_violations = entities
        .invalid
        .into_iter()
        .filter(|item| !ignored_entities.contains(&item.entity))
        .map(|item| {
            RuleViolation::new(
                RULE_ID,
                RULE_NAME,
                conf.level,
                format!("Entity {} doesn't follow naming convention {}.", item.entity.id(), entities.convention),
            )
            .with_entity(item.entity)
            .with_extra(json!({"convention": entities.convention}))
        });
    let attribute_violations = attributes
        .invalid
        .iter()
        .filter_map(|item| item.attribute_ref())
        .filter(|attr| !ignored_attributes.contains(attr))
        .map(|attr| {
            RuleViolation::new(
                RULE_ID,
                RULE_NAME,
                conf.level,
                format!("Attribute {} doesn't follow naming convention {}.", attr.id(), attributes.convention),
            )
            .with_attribute(attr)
            .with_extra(json!({"convention": attributes.convention}))
        });
    entity_violations.chain(attribute_violations).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::AnalyzeRule;
    use crate::rules::testing::{context, database, messages};
    use dbaudit_core::{Attribute, Entity};
    use pretty_assertions::assert_eq;

    fn db() -> dbaudit_core::Database {
        database(vec![
            Entity::new(
                "users",
                vec![Attribute::new("id", "int"), Attribute::new("firstName", "text"), Attribute::new("last_name", "text")],
            ),
            Entity::new("blog_posts", vec![]),
            Entity::new("Comments", vec![]),
        ])
    }

    #[test]
    fn report_entities_and_attributes() {
        let db = db();
        let mut conf = rule().conf;
        conf.level = RuleLevel::Hint;
        assert_eq!(
            messages(&(rule().analyze)(&conf, &context(&db))),
            vec![
                "Entity Comments doesn't follow naming convention snake-lower.",
                "Attribute users(firstName) doesn't follow naming convention snake-lower.",
            ]
        );
    }

    #[test]
    fn off_by_default() {
        let db = db();
        assert!(rule().run(None, &context(&db)).violations.is_empty());
    }
}
