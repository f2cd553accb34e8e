//! Indexes made useless by another index starting with the same attributes

use dbaudit_core::{refs::attribute_paths_id, AttributesRef, Entity, Index, RuleLevel, RuleViolation};
use serde_json::json;

use crate::ignores::{attributes_ignores, extra_value};
use crate::rule::{BasicConf, Rule, RuleContext};

pub const RULE_ID: &str = "index-duplicated";
const RULE_NAME: &str = "duplicated index";

pub fn rule() -> Rule<BasicConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "An index whose attributes are a prefix of another index is redundant, it only slows down writes.",
        conf: BasicConf::new(RuleLevel::Medium),
        analyze,
    }
}

fn analyze(conf: &BasicConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = attributes_ignores(&conf.ignores, ctx.reference, |v| extra_value(v, "index"));
    get_duplicated_indexes(&ctx.database.entities)
        .into_iter()
        .filter(|dup| !ignores.contains(&dup.entity.attributes_ref(&dup.index.attrs)))
        .map(|dup| {
            let index_ref = dup.entity.attributes_ref(&dup.index.attrs);
            let covered_by: Vec<String> = dup.covered_by.iter().map(|i| index_display(i)).collect();
            let message = format!(
                "Index {} on {} can be deleted, it's covered by: {}.",
                dup.index.label(),
                index_ref.id(),
                covered_by.join(", ")
            );
            let covering_refs: Vec<AttributesRef> =
                dup.covered_by.iter().map(|i| dup.entity.attributes_ref(&i.attrs)).collect();
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message)
                .with_entity(dup.entity.entity_ref())
                .with_extra(json!({"index": index_ref, "coveredBy": covering_refs}))
        })
        .collect()
}

/// `name(a, b)`, or `(a, b)` for unnamed indexes
pub(crate) fn index_display(index: &Index) -> String {
    format!("{}({})", index.name.as_deref().unwrap_or_default(), attribute_paths_id(&index.attrs))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatedIndex<'a> {
    pub entity: &'a Entity,
    pub index: &'a Index,
    pub covered_by: Vec<&'a Index>,
}

/// Non-unique indexes whose attributes start another index with the same
/// predicate. Among identical indexes, the first one is kept.
pub fn get_duplicated_indexes(entities: &[Entity]) -> Vec<DuplicatedIndex<'_>> {
    entities
        .iter()
        .flat_map(|entity| {
            entity.indexes.iter().enumerate().filter_map(move |(i, index)| {
                if index.is_unique() {
                    return None;
                }
                let covered_by: Vec<&Index> = entity
                    .indexes
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| {
                        *j != i
                            && other.partial == index.partial
                            && other.attrs.starts_with(&index.attrs)
                            && (other.attrs.len() > index.attrs.len() || *j < i)
                    })
                    .map(|(_, other)| other)
                    .collect();
                (!covered_by.is_empty()).then_some(DuplicatedIndex {
                    entity,
                    index,
                    covered_by,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages};
    use pretty_assertions::assert_eq;

    fn index(name: &str, attrs: &[&str]) -> Index {
        Index::new(Some(name), attrs.iter().map(|a| vec![a.to_string()]).collect())
    }

    #[test]
    fn prefix_index_is_covered() {
        let db = database(vec![Entity::new("users", vec![])
            .with_index(index("users_name_idx", &["first_name", "last_name"]))
            .with_index(index("users_first_name_idx", &["first_name"]))
            .with_index(index("users_last_name_idx", &["last_name"]))]);
        let violations = (rule().analyze)(&rule().conf, &context(&db));
        assert_eq!(
            messages(&violations),
            vec!["Index users_first_name_idx on users(first_name) can be deleted, it's covered by: users_name_idx(first_name, last_name)."]
        );
        assert_eq!(violations[0].extra.as_ref().unwrap()["index"]["attributes"], json!([["first_name"]]));
    }

    #[test]
    fn identical_indexes_keep_the_first() {
        let entities = vec![Entity::new("users", vec![])
            .with_index(index("a_idx", &["email"]))
            .with_index(index("b_idx", &["email"]))];
        let found = get_duplicated_indexes(&entities);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index.name.as_deref(), Some("b_idx"));
    }

    #[test]
    fn unique_indexes_are_kept() {
        let entities = vec![Entity::new("users", vec![])
            .with_index(index("users_email_name_idx", &["email", "name"]))
            .with_index(index("users_email_key", &["email"]).unique())];
        assert!(get_duplicated_indexes(&entities).is_empty());
    }

    #[test]
    fn ignore_by_attributes_id() {
        let db = database(vec![Entity::new("users", vec![])
            .with_index(index("users_name_idx", &["first_name", "last_name"]))
            .with_index(index("users_first_name_idx", &["first_name"]))]);
        let mut conf = rule().conf;
        conf.ignores = vec!["users(first_name)".to_string()];
        assert!((rule().analyze)(&conf, &context(&db)).is_empty());
    }
}
