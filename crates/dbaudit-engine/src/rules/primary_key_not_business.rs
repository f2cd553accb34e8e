//! Primary keys made of business attributes (email, code...) instead of
//! technical identifiers

use dbaudit_core::{refs::attribute_paths_id, Entity, RuleLevel, RuleViolation};

use crate::ignores::entity_ignores;
use crate::rule::{BasicConf, Rule, RuleContext};
use crate::words::split_words;

pub const RULE_ID: &str = "primary-key-not-business";
const RULE_NAME: &str = "business primary key";

const TECHNICAL_TYPES: [&str; 4] = ["int", "serial", "uuid", "uniqueidentifier"];

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Business values change, primary keys should not. Prefer a technical identifier.",
        conf: BasicConf::new(RuleLevel::Low),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_business_primary_keys(&ctx.database.entities)
        .into_iter()
        .filter(|e| !ignores.contains(&e.entity_ref()))
        .map(|e| {
            let attrs = e.pk.as_ref().map(|pk| attribute_paths_id(&pk.attrs)).unwrap_or_default();
            let message = format!("Entity {} should have a technical primary key, current one is: ({}).", e.id(), attrs);
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message).with_entity(e.entity_ref())
        })
        .collect()
}

/// Tables with a primary key attribute that is neither named nor typed as an identifier
pub fn get_business_primary_keys(entities: &[Entity]) -> Vec<&Entity> {
    entities
        .iter()
        .filter(|e| {
            e.is_table()
                && e.pk.as_ref().is_some_and(|pk| {
                    pk.attrs.iter().any(|path| {
                        let data_type = e.find_attribute(path).map(|a| a.data_type.to_lowercase());
                        !is_technical(path.last().map(String::as_str).unwrap_or_default(), data_type.as_deref())
                    })
                })
        })
        .collect()
}

fn is_technical(name: &str, data_type: Option<&str>) -> bool {
    let named_id = split_words(name).last().is_some_and(|w| w == "id" || w.ends_with("id"));
    let typed_id = data_type.is_some_and(|t| TECHNICAL_TYPES.iter().any(|technical| t.contains(technical)));
    named_id || typed_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages};
    use dbaudit_core::Attribute;
    use pretty_assertions::assert_eq;

    fn keyed(name: &str, attr: &str, data_type: &str) -> Entity {
        Entity::new(name, vec![Attribute::new(attr, data_type)]).with_pk(vec![vec![attr.to_string()]])
    }

    #[test]
    fn find_business_primary_keys() {
        let db = database(vec![
            keyed("users", "id", "uuid"),
            keyed("accounts", "email", "varchar(255)"),
            keyed("countries", "code", "char(2)"),
            keyed("events", "seq", "bigint"),
            keyed("posts", "post_id", "varchar"),
        ]);
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec![
                "Entity accounts should have a technical primary key, current one is: (email).",
                "Entity countries should have a technical primary key, current one is: (code).",
            ]
        );
    }
}
