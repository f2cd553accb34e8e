//! Tables with too many indexes

use dbaudit_core::{Entity, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};

use crate::ignores::entity_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-index-too-many";
const RULE_NAME: &str = "entity with too many indexes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TooManyIndexesConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    pub max: usize,
}

rule_conf!(TooManyIndexesConf);

pub fn rule() -> Rule<TooManyIndexesConf> {
    Rule {
        id: RULE_ID,
        aliases: &["entity-too-many-indexes"],
        name: RULE_NAME,
        description: "Each index slows down writes, too many of them may hurt more than they help.",
        conf: TooManyIndexesConf {
            level: RuleLevel::Low,
            ignores: Vec::new(),
            max: 10,
        },
        analyze,
    }
}

fn analyze(conf: &TooManyIndexesConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_entities_with_too_many_indexes(&ctx.database.entities, conf.max)
        .into_iter()
        .filter(|e| !ignores.contains(&e.entity_ref()))
        .map(|e| {
            let message = format!("Entity {} has too many indexes ({}).", e.id(), e.indexes.len());
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message).with_entity(e.entity_ref())
        })
        .collect()
}

pub fn get_entities_with_too_many_indexes(entities: &[Entity], max: usize) -> Vec<&Entity> {
    entities.iter().filter(|e| e.indexes.len() > max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{context, database, messages};
    use dbaudit_core::Index;
    use pretty_assertions::assert_eq;

    fn indexed(name: &str, count: usize) -> Entity {
        (0..count).fold(Entity::new(name, vec![]), |e, i| {
            e.with_index(Index::new(None, vec![vec![format!("col{}", i)]]))
        })
    }

    #[test]
    fn find_too_many_indexes() {
        let db = database(vec![indexed("users", 12), indexed("posts", 10)]);
        assert_eq!(
            messages(&(rule().analyze)(&rule().conf, &context(&db))),
            vec!["Entity users has too many indexes (12)."]
        );
    }
}
