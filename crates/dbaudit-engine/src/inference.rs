//! Missing relation inference
//!
//! Guesses foreign keys from attribute names: `user_id` in `posts` targets
//! `users.id`, `created_by` targets `users.id` (or `accounts.id`), and
//! `item_id` with a sibling `item_kind` column targets one entity per kind
//! value. Only tables are considered, on both sides.
//!
//! Candidate target entities are looked up through an ordered list of
//! strategies, each stripping some leading/trailing words from the hint. The
//! first strategy with a match wins, then the closest namespaces are kept.

use dbaudit_core::{
    AttributePath, Entity, FlatAttribute, Namespace, Relation, RelationOrigin, RelationPolymorphic,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::words::singular_words;

const ID: &str = "id";
const POLYMORPHIC_SUFFIXES: [&str; 3] = ["type", "kind", "class"];
const BY_TARGETS: [&str; 2] = ["user", "account"];

/// Words stripped from the hint, as (leading, trailing), in priority order
const STRATEGIES: [(usize, usize); 14] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (1, 0),
    (1, 1),
    (1, 2),
    (2, 0),
    (2, 1),
    (2, 2),
    (3, 0),
    (3, 1),
    (3, 2),
];

/// Relations suggested from attribute names, not already in `relations`
pub fn infer_missing_relations(entities: &[Entity], relations: &[Relation]) -> Vec<Relation> {
    let tables: Vec<&Entity> = entities.iter().filter(|e| e.is_table()).collect();
    let index = EntityIndex::new(&tables);
    let mut missing: Vec<Relation> = Vec::new();

    for entity in &tables {
        let attrs = entity.flat_attributes();
        for attr in &attrs {
            for candidate in infer_attribute_relations(entity, attr, &attrs, &index) {
                let tautology = candidate.src == candidate.reference
                    && candidate.attrs.iter().all(|link| link.src == link.reference);
                let known = relations.iter().chain(missing.iter()).any(|r| r.same_link(&candidate));
                if !tautology && !known {
                    tracing::trace!(relation = %candidate.id(), "inferred relation");
                    missing.push(candidate);
                }
            }
        }
    }
    missing
}

/// Tables indexed by singular name, with 0, 1 and 2 leading words dropped
struct EntityIndex<'a> {
    by_name: [HashMap<String, Vec<&'a Entity>>; 3],
}

impl<'a> EntityIndex<'a> {
    fn new(tables: &[&'a Entity]) -> Self {
        let mut by_name: [HashMap<String, Vec<&'a Entity>>; 3] = Default::default();
        for entity in tables {
            let words = singular_words(&entity.name);
            for (dropped, map) in by_name.iter_mut().enumerate() {
                if words.len() > dropped {
                    map.entry(words[dropped..].join("_")).or_default().push(*entity);
                }
            }
        }
        Self { by_name }
    }

    /// Entities matching the hint words with the first successful strategy,
    /// keeping the ones closest to `namespace`
    fn find(&self, hint: &[String], namespace: &Namespace) -> Vec<&'a Entity> {
        for key in strategy_keys(hint) {
            for map in &self.by_name {
                if let Some(found) = map.get(&key) {
                    return closest(found, namespace);
                }
            }
        }
        Vec::new()
    }
}

fn strategy_keys(hint: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for (prefix, suffix) in STRATEGIES {
        if prefix + suffix < hint.len() {
            let key = hint[prefix..hint.len() - suffix].join("_");
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys
}

fn closest<'a>(entities: &[&'a Entity], namespace: &Namespace) -> Vec<&'a Entity> {
    let best = entities
        .iter()
        .map(|e| e.namespace.proximity(namespace))
        .max()
        .unwrap_or(0);
    entities
        .iter()
        .filter(|e| e.namespace.proximity(namespace) == best)
        .copied()
        .collect()
}

fn infer_attribute_relations(
    entity: &Entity,
    attr: &FlatAttribute<'_>,
    siblings: &[FlatAttribute<'_>],
    index: &EntityIndex<'_>,
) -> Vec<Relation> {
    let words = singular_words(&attr.attribute.name);
    let Some((last, hint)) = words.split_last() else {
        return Vec::new();
    };

    if last == ID && !hint.is_empty() {
        if let Some(kind) = polymorphic_attribute(attr, siblings) {
            return polymorphic_relations(entity, attr, kind, index);
        }
        relations_to(entity, attr, &words, hint, index)
    } else if last.len() > ID.len() && last.ends_with(ID) {
        if let Some(kind) = polymorphic_attribute(attr, siblings) {
            return polymorphic_relations(entity, attr, kind, index);
        }
        let mut hint = hint.to_vec();
        hint.push(last[..last.len() - ID.len()].to_string());
        relations_to(entity, attr, &words, &hint, index)
    } else if last == "by" && !hint.is_empty() {
        BY_TARGETS
            .iter()
            .map(|target| relations_to(entity, attr, &[ID.to_string()], &[target.to_string()], index))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    } else {
        Vec::new()
    }
}

fn relations_to(
    entity: &Entity,
    attr: &FlatAttribute<'_>,
    words: &[String],
    hint: &[String],
    index: &EntityIndex<'_>,
) -> Vec<Relation> {
    index
        .find(hint, &entity.namespace)
        .into_iter()
        .filter_map(|target| {
            let ref_attr = find_ref_attribute(target, words)?;
            Some(relation(entity, attr, target, ref_attr))
        })
        .collect()
}

fn relation(entity: &Entity, attr: &FlatAttribute<'_>, target: &Entity, ref_attr: AttributePath) -> Relation {
    Relation::new(entity.entity_ref(), attr.path.clone(), target.entity_ref(), ref_attr)
        .with_origin(RelationOrigin::InferName)
}

/// Referenced attribute: `id` if present, else the attribute whose last words
/// match the source attribute words (`user_id` for `author_user_id`)
fn find_ref_attribute(target: &Entity, src_words: &[String]) -> Option<AttributePath> {
    if let Some(id) = target.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(ID)) {
        return Some(vec![id.name.clone()]);
    }
    let src_words = split_id_suffix(src_words.to_vec());
    target
        .attrs
        .iter()
        .find(|a| {
            let words = split_id_suffix(singular_words(&a.name));
            let size = words.len().min(src_words.len());
            size >= 2
                && words.last().is_some_and(|w| w == ID)
                && words[words.len() - size..] == src_words[src_words.len() - size..]
        })
        .map(|a| vec![a.name.clone()])
}

/// `[author, userid]` → `[author, user, id]`
fn split_id_suffix(mut words: Vec<String>) -> Vec<String> {
    if let Some(last) = words.last() {
        if last.len() > ID.len() && last.ends_with(ID) {
            let stem = last[..last.len() - ID.len()].to_string();
            words.pop();
            words.push(stem);
            words.push(ID.to_string());
        }
    }
    words
}

/// Sibling `<hint>type`, `<hint>kind` or `<hint>class` attribute with known values
fn polymorphic_attribute<'a>(attr: &FlatAttribute<'_>, siblings: &'a [FlatAttribute<'a>]) -> Option<&'a FlatAttribute<'a>> {
    let name = attr.attribute.name.to_lowercase();
    let base = name.strip_suffix("ids").or_else(|| name.strip_suffix(ID))?;
    let hint = normalize(base);
    siblings.iter().find(|sibling| {
        let sibling_name = normalize(&sibling.attribute.name);
        sibling.parent() == attr.parent()
            && sibling.path != attr.path
            && !sibling.attribute.distinct_values().is_empty()
            && POLYMORPHIC_SUFFIXES
                .iter()
                .any(|suffix| sibling_name == format!("{}{}", hint, suffix))
    })
}

fn polymorphic_relations(
    entity: &Entity,
    attr: &FlatAttribute<'_>,
    kind: &FlatAttribute<'_>,
    index: &EntityIndex<'_>,
) -> Vec<Relation> {
    kind.attribute
        .distinct_values()
        .iter()
        .flat_map(|value| {
            let hint = singular_words(value_entity_name(value));
            let words: Vec<String> = hint.iter().cloned().chain([ID.to_string()]).collect();
            index
                .find(&hint, &entity.namespace)
                .into_iter()
                .filter_map(|target| {
                    let ref_attr = find_ref_attribute(target, &words)?;
                    let mut relation = relation(entity, attr, target, ref_attr);
                    relation.polymorphic = Some(RelationPolymorphic {
                        attribute: kind.path.clone(),
                        value: value.clone(),
                    });
                    Some(relation)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Last segment of a kind value: `App\Models\Post`, `app.Post` or `Post` give `Post`
fn value_entity_name(value: &Value) -> &str {
    match value {
        Value::String(s) => s
            .rsplit(|c: char| matches!(c, '\\' | '.' | ':' | '/'))
            .find(|segment| !segment.is_empty())
            .unwrap_or(s),
        _ => "",
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbaudit_core::{Attribute, AttributeStats, EntityKind, EntityRef};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entity(name: &str, attrs: &[&str]) -> Entity {
        Entity::new(name, attrs.iter().map(|a| Attribute::new(*a, "int")).collect())
    }

    fn with_values(name: &str, values: &[&str]) -> Attribute {
        Attribute::new(name, "varchar").with_stats(AttributeStats {
            distinct_values: values.iter().map(|v| json!(v)).collect(),
            ..Default::default()
        })
    }

    fn ids(relations: &[Relation]) -> Vec<String> {
        relations.iter().map(Relation::id).collect()
    }

    #[test]
    fn infer_by_id_suffix() {
        let entities = vec![entity("users", &["id"]), entity("posts", &["id", "user_id"])];
        let relations = infer_missing_relations(&entities, &[]);

        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].src, EntityRef::new("posts"));
        assert_eq!(relations[0].reference, EntityRef::new("users"));
        assert_eq!(relations[0].attrs[0].src, vec!["user_id".to_string()]);
        assert_eq!(relations[0].attrs[0].reference, vec!["id".to_string()]);
        assert_eq!(relations[0].origin, Some(RelationOrigin::InferName));
    }

    #[test]
    fn infer_camel_case_and_glued_id() {
        let entities = vec![
            entity("users", &["id"]),
            entity("posts", &["id", "authorUserId"]),
            entity("comments", &["id", "userid"]),
        ];
        assert_eq!(
            ids(&infer_missing_relations(&entities, &[])),
            vec!["posts(authorUserId)->users(id)", "comments(userid)->users(id)"]
        );
    }

    #[test]
    fn infer_with_entity_prefix() {
        let entities = vec![entity("wp_users", &["id"]), entity("wp_posts", &["id", "user_id"])];
        assert_eq!(ids(&infer_missing_relations(&entities, &[])), vec!["wp_posts(user_id)->wp_users(id)"]);
    }

    #[test]
    fn infer_created_by() {
        let entities = vec![entity("accounts", &["id"]), entity("posts", &["id", "created_by"])];
        assert_eq!(ids(&infer_missing_relations(&entities, &[])), vec!["posts(created_by)->accounts(id)"]);

        let entities = vec![
            entity("accounts", &["id"]),
            entity("users", &["id"]),
            entity("posts", &["id", "created_by"]),
        ];
        assert_eq!(ids(&infer_missing_relations(&entities, &[])), vec!["posts(created_by)->users(id)"]);
    }

    #[test]
    fn infer_polymorphic() {
        let entities = vec![
            entity("posts", &["id"]),
            entity("comments", &["id"]),
            Entity::new(
                "events",
                vec![
                    Attribute::new("id", "int"),
                    with_values("item_kind", &["Post", "Comment"]),
                    Attribute::new("item_id", "int"),
                ],
            ),
        ];
        let relations = infer_missing_relations(&entities, &[]);

        assert_eq!(ids(&relations), vec!["events(item_id)->posts(id)", "events(item_id)->comments(id)"]);
        assert_eq!(
            relations[0].polymorphic,
            Some(RelationPolymorphic {
                attribute: vec!["item_kind".to_string()],
                value: json!("Post"),
            })
        );
        assert_eq!(relations[1].polymorphic.as_ref().unwrap().value, json!("Comment"));
    }

    #[test]
    fn polymorphic_values_with_namespaces() {
        let entities = vec![
            entity("posts", &["id"]),
            Entity::new(
                "likes",
                vec![with_values("likeableType", &["App\\Models\\Post"]), Attribute::new("likeableId", "int")],
            ),
        ];
        assert_eq!(ids(&infer_missing_relations(&entities, &[])), vec!["likes(likeableId)->posts(id)"]);
    }

    #[test]
    fn infer_nested_attribute() {
        let entities = vec![
            entity("users", &["id"]),
            Entity::new(
                "events",
                vec![
                    Attribute::new("id", "int"),
                    Attribute::new("payload", "jsonb").with_attrs(vec![Attribute::new("user_id", "int")]),
                ],
            ),
        ];
        assert_eq!(ids(&infer_missing_relations(&entities, &[])), vec!["events(payload.user_id)->users(id)"]);
    }

    #[test]
    fn infer_ref_attribute_by_suffix() {
        let entities = vec![
            entity("users", &["user_id", "name"]),
            entity("posts", &["id", "author_user_id"]),
        ];
        assert_eq!(ids(&infer_missing_relations(&entities, &[])), vec!["posts(author_user_id)->users(user_id)"]);
    }

    #[test]
    fn skip_known_and_self_relations() {
        let entities = vec![entity("users", &["id"]), entity("posts", &["id", "user_id"])];
        let known = Relation::new(
            EntityRef::new("posts"),
            vec!["user_id".to_string()],
            EntityRef::new("users"),
            vec!["id".to_string()],
        )
        .with_origin(RelationOrigin::Fk);
        assert!(infer_missing_relations(&entities, &[known]).is_empty());

        // users.user_id -> users.user_id would be a tautology
        assert!(infer_missing_relations(&[entity("users", &["user_id"])], &[]).is_empty());
    }

    #[test]
    fn skip_views() {
        let entities = vec![
            entity("users", &["id"]),
            entity("active_posts", &["id", "user_id"]).with_kind(EntityKind::View),
            entity("admins", &["id"]).with_kind(EntityKind::View),
            entity("logs", &["admin_id"]),
        ];
        assert!(infer_missing_relations(&entities, &[]).is_empty());
    }

    #[test]
    fn prefer_closest_namespace() {
        let entities = vec![
            entity("users", &["id"]).with_namespace(Namespace::schema("auth")),
            entity("users", &["id"]).with_namespace(Namespace::schema("public")),
            entity("posts", &["id", "user_id"]).with_namespace(Namespace::schema("public")),
        ];
        assert_eq!(
            ids(&infer_missing_relations(&entities, &[])),
            vec!["public.posts(user_id)->public.users(id)"]
        );
    }

    #[test]
    fn strategy_keys_order() {
        let hint: Vec<String> = ["main", "billing", "account"].iter().map(|w| w.to_string()).collect();
        assert_eq!(
            strategy_keys(&hint),
            vec!["main_billing_account", "main_billing", "main", "billing_account", "billing", "account"]
        );
    }

    #[test]
    fn no_hint_no_relation() {
        let entities = vec![entity("users", &["id", "paid", "valid"])];
        assert!(infer_missing_relations(&entities, &[]).is_empty());
    }
}
