//! Keeps the compiled extractor in sync with the persisted rule set.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::extraction::Extractor;
use crate::schema::AttributeKind;

use super::rule_set::{PatternRule, RuleSet};
use super::store::ConfigStore;

/// Façade over [`ConfigStore`] that rebuilds the [`Extractor`] after every
/// mutation, so new rules apply to the very next parse.
#[derive(Debug)]
pub struct RuntimeRuleManager {
    store: ConfigStore,
    extractor: Extractor,
}

impl RuntimeRuleManager {
    /// Wrap a loaded store, compiling its rule set.
    pub fn new(store: ConfigStore) -> Result<Self> {
        let extractor = Extractor::new(store.snapshot())?;
        Ok(Self { store, extractor })
    }

    /// Load (or create) the rule set at `path` and compile it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ConfigStore::load(path)?)
    }

    /// The compiled extractor for the current rule set.
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// The underlying store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Current rule set snapshot.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.store.snapshot()
    }

    pub fn add_dictionary_entry(&mut self, kind: AttributeKind, token: &str, value: &str) -> Result<()> {
        self.store.add_dictionary_entry(kind, token, value)?;
        self.rebuild()
    }

    pub fn remove_dictionary_entry(&mut self, kind: AttributeKind, token: &str) -> Result<bool> {
        let removed = self.store.remove_dictionary_entry(kind, token)?;
        if removed {
            self.rebuild()?;
        }
        Ok(removed)
    }

    pub fn add_brand_mapping(&mut self, name: &str, id: u32) -> Result<()> {
        self.store.add_brand_mapping(name, id)?;
        self.rebuild()
    }

    pub fn add_product_name_mapping(&mut self, name: &str, brand_id: u32) -> Result<()> {
        self.store.add_product_name_mapping(name, brand_id)?;
        self.rebuild()
    }

    pub fn add_rule(&mut self, rule: PatternRule) -> Result<()> {
        self.store.add_rule(rule)?;
        self.rebuild()
    }

    pub fn remove_rule(&mut self, name: &str) -> Result<bool> {
        let removed = self.store.remove_rule(name)?;
        if removed {
            self.rebuild()?;
        }
        Ok(removed)
    }

    pub fn add_ignore_pattern(&mut self, pattern: &str) -> Result<()> {
        self.store.add_ignore_pattern(pattern)?;
        self.rebuild()
    }

    /// Replace the rule set with an imported file.
    pub fn import_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.store.import_from(path)?;
        self.rebuild()
    }

    /// Write the current rule set to another file.
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        self.store.export_to(path)
    }

    /// Human-readable problems with the current rule set.
    pub fn validate(&self) -> Vec<String> {
        self.store.validate()
    }

    /// Next free name with the given prefix (`<prefix>_1`, `<prefix>_2`, ...).
    pub fn next_rule_name(&self, prefix: &str) -> String {
        let rules = self.store.rules();
        (1..)
            .map(|n| format!("{}_{}", prefix, n))
            .find(|name| rules.rule(name).is_none())
            .unwrap_or_else(|| prefix.to_string())
    }

    fn rebuild(&mut self) -> Result<()> {
        self.extractor = Extractor::new(self.store.snapshot())?;
        debug!(
            revision = self.store.rules().revision,
            rules = self.extractor.rule_count(),
            "rebuilt extractor"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Gender;
    use tempfile::TempDir;

    #[test]
    fn test_dictionary_entry_applies_immediately() {
        let dir = TempDir::new().unwrap();
        let mut manager = RuntimeRuleManager::open(dir.path().join("rules.json")).unwrap();

        let before = manager.extractor().parse_description("ROSE POUR ELLE 50ML");
        assert_eq!(before.gender, None);

        manager
            .add_dictionary_entry(AttributeKind::Gender, "ELLE", "Female")
            .unwrap();
        let after = manager.extractor().parse_description("ROSE POUR ELLE 50ML");
        assert_eq!(after.gender, Some(Gender::Female));
    }

    #[test]
    fn test_next_rule_name() {
        let dir = TempDir::new().unwrap();
        let mut manager = RuntimeRuleManager::open(dir.path().join("rules.json")).unwrap();
        assert_eq!(manager.next_rule_name("learned_size"), "learned_size_1");

        manager
            .add_rule(
                PatternRule::new("learned_size_1", r"(\d+)\s*CC", AttributeKind::Size).with_value("ml"),
            )
            .unwrap();
        assert_eq!(manager.next_rule_name("learned_size"), "learned_size_2");
    }
}
