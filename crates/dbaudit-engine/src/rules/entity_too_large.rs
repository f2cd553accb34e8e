//! Entities with too many attributes

use dbaudit_core::{Entity, RuleLevel, RuleViolation};
use serde::{Deserialize, Serialize};

use crate::ignores::entity_ignores;
use crate::rule::{rule_conf, Rule, RuleContext};

pub const RULE_ID: &str = "entity-too-large";
const RULE_NAME: &str = "entity too large";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TooLargeConf {
    pub level: RuleLevel,
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Max number of top-level attributes
    pub max: usize,
}

rule_conf!(TooLargeConf);

pub fn rule() -> Rule<TooLargeConf> {
    Rule {
        id: RULE_ID,
        aliases: &[],
        name: RULE_NAME,
        description: "Entities with a lot of attributes often mix several concepts and could be split.",
        conf: TooLargeConf {
            level: RuleLevel::Medium,
            ignores: Vec::new(),
            max: 30,
        },
        analyze,
    }
}

fn analyze(conf: &TooLargeConf, ctx: &RuleContext<'_>) -> Vec<RuleViolation> {
    let ignores = entity_ignores(&conf.ignores, ctx.reference);
    get_large_entities(&ctx.database.entities, conf.max)
        .into_iter()
        .filter(|e| !ignores.contains(&e.entity_ref()))
        .map(|e| {
            let message = format!("Entity {} has too many attributes ({}).", e.id(), e.attrs.len());
            RuleViolation::new(RULE_ID, RULE_NAME, conf.level, message).with_entity(e.entity_ref())
        })
        .collect()
}

pub fn get_large_entities(entities: &[Entity], max: usize) -> Vec<&Entity> {
    entities.iter().filter(|e| e.attrs.len() > max).collect()
}
