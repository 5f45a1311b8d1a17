use crate::alias::Alias;
use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-operation default content hint: which output format an operation
/// renders with by default (`content`) and, if the operation's response is
/// dominated by one entity, which entity it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub entity: Option<String>,
}

/// The on-disk config format consumed at startup and produced offline by
/// `octl-configgen` (§6 "Config file format"): YAML, single-quoted
/// strings, top-level keys `default_content`, `contents`, `entities`,
/// `aliases`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_content: String,
    #[serde(default)]
    pub contents: BTreeMap<String, ContentEntry>,
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /// Merges `other` into `self`, with `self` taking precedence on
    /// conflicting entity/content keys — this is the "caller-supplied
    /// base takes precedence" rule from §4.5's Config Generator merge step.
    /// Aliases are concatenated, since the generator always owns them
    /// outright (a base config has no hand-authored aliases to protect).
    pub fn merge_base(mut self, generated: Config) -> Self {
        for (name, entity) in generated.entities {
            self.entities.entry(name).or_insert(entity);
        }
        for (name, entry) in generated.contents {
            self.contents.entry(name).or_insert(entry);
        }
        if self.default_content.is_empty() {
            self.default_content = generated.default_content;
        }
        let mut aliases = generated.aliases;
        aliases.extend(self.aliases);
        self.aliases = aliases;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_base_prefers_base_entity_on_conflict() {
        let mut base = Config::new();
        base.entities
            .insert("volume".into(), Entity::new("volume", "volumes"));
        base.entities.get_mut("volume").unwrap().explode = true;

        let mut generated = Config::new();
        generated
            .entities
            .insert("volume".into(), Entity::new("volume", "volumes"));
        generated
            .entities
            .insert("vm".into(), Entity::new("vm", "vms"));

        let merged = base.merge_base(generated);
        assert!(merged.entities["volume"].explode);
        assert!(merged.entities.contains_key("vm"));
    }

    #[test]
    fn round_trips_through_yaml() {
        let mut config = Config::new();
        config
            .entities
            .insert("volume".into(), Entity::new("volume", "volumes"));
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let back: Config = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back.entities["volume"].singular, "volume");
    }
}
