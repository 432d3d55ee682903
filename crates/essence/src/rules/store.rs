//! Persistent rule set store - the single source of truth for rules.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{EssenceError, Result};
use crate::schema::AttributeKind;

use super::rule_set::{PatternRule, RuleSet};

/// Loads, persists and mutates a [`RuleSet`].
///
/// The rule set is held as an immutable snapshot. Every mutation clones the
/// snapshot, applies the change, persists it and only then swaps the shared
/// reference, so readers holding an older snapshot keep a consistent view and
/// a failed write leaves the store unchanged.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: Arc<RuleSet>,
}

impl ConfigStore {
    /// Load the rule set at `path`, creating and persisting the built-in
    /// default if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            info!(path = %path.display(), "rule set not found, writing built-in default");
            let store = Self {
                path,
                current: Arc::new(RuleSet::default()),
            };
            store.save()?;
            return Ok(store);
        }

        let rules = read_rule_set(&path)?;
        info!(
            path = %path.display(),
            rules = rules.rules.len(),
            revision = rules.revision,
            "loaded rule set"
        );

        Ok(Self {
            path,
            current: Arc::new(rules),
        })
    }

    /// Create a store for an in-memory rule set, persisting it immediately.
    pub fn create(path: impl AsRef<Path>, rules: RuleSet) -> Result<Self> {
        let mut rules = rules;
        rules.normalize_keys();
        rules.ensure_valid()?;

        let store = Self {
            path: path.as_ref().to_path_buf(),
            current: Arc::new(rules),
        };
        store.save()?;
        Ok(store)
    }

    /// Path the store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current rule set snapshot.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.current)
    }

    /// Borrow the current rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.current
    }

    /// Persist the current rule set to the store path.
    pub fn save(&self) -> Result<()> {
        write_rule_set(&self.current, &self.path)
    }

    /// Write the current rule set to another file.
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_rule_set(&self.current, path)?;
        info!(path = %path.display(), "exported rule set");
        Ok(())
    }

    /// Replace the rule set with the one at `path`.
    ///
    /// The replaced file is backed up into the history directory first.
    pub fn import_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let imported = read_rule_set(path)?;

        if self.path.exists() {
            backup_to_history(&self.path)?;
        }

        write_rule_set(&imported, &self.path)?;
        info!(
            from = %path.display(),
            rules = imported.rules.len(),
            "imported rule set"
        );
        self.current = Arc::new(imported);
        Ok(())
    }

    /// Human-readable problems with the current rule set.
    pub fn validate(&self) -> Vec<String> {
        self.current.validate()
    }

    /// Add or replace a dictionary entry.
    pub fn add_dictionary_entry(
        &mut self,
        kind: AttributeKind,
        token: &str,
        value: &str,
    ) -> Result<()> {
        self.mutate(|rules| rules.insert_entry(kind, token, value))?;
        debug!(kind = %kind, token, value, "added dictionary entry");
        Ok(())
    }

    /// Remove a dictionary entry. Returns false if it did not exist, in which
    /// case nothing is written.
    pub fn remove_dictionary_entry(&mut self, kind: AttributeKind, token: &str) -> Result<bool> {
        let mut removed = false;
        self.mutate_if(|rules| {
            removed = rules.remove_entry(kind, token);
            Ok(removed)
        })?;
        Ok(removed)
    }

    /// Map a brand name to its id.
    pub fn add_brand_mapping(&mut self, name: &str, id: u32) -> Result<()> {
        self.add_dictionary_entry(AttributeKind::Brand, name, &id.to_string())
    }

    /// Map a product name to the id of its brand.
    pub fn add_product_name_mapping(&mut self, name: &str, brand_id: u32) -> Result<()> {
        self.add_dictionary_entry(AttributeKind::Name, name, &brand_id.to_string())
    }

    /// Append a pattern rule. The rule must compile and its name must be
    /// unique.
    pub fn add_rule(&mut self, rule: PatternRule) -> Result<()> {
        let problems = rule.problems();
        if !problems.is_empty() {
            return Err(EssenceError::InvalidRule(problems.join("; ")));
        }
        if self.current.rule(&rule.name).is_some() {
            return Err(EssenceError::InvalidRule(format!(
                "a rule named '{}' already exists",
                rule.name
            )));
        }

        let name = rule.name.clone();
        self.mutate(move |rules| {
            rules.rules.push(rule);
            Ok(())
        })?;
        info!(rule = %name, "added rule");
        Ok(())
    }

    /// Remove a rule by name. Returns false if no such rule existed.
    pub fn remove_rule(&mut self, name: &str) -> Result<bool> {
        let mut removed = false;
        self.mutate_if(|rules| {
            let before = rules.rules.len();
            rules.rules.retain(|r| r.name != name);
            removed = rules.rules.len() != before;
            Ok(removed)
        })?;
        if removed {
            info!(rule = name, "removed rule");
        }
        Ok(removed)
    }

    /// Add an ignore pattern. It must compile.
    pub fn add_ignore_pattern(&mut self, pattern: &str) -> Result<()> {
        Regex::new(pattern)?;
        let pattern = pattern.to_string();
        self.mutate(move |rules| {
            if !rules.ignore_patterns.contains(&pattern) {
                rules.ignore_patterns.push(pattern);
            }
            Ok(())
        })
    }

    fn mutate(&mut self, change: impl FnOnce(&mut RuleSet) -> Result<()>) -> Result<()> {
        self.mutate_if(|rules| change(rules).map(|_| true))
    }

    /// Apply a change to a copy of the snapshot, persist it when the change
    /// reports that something changed, then swap it in.
    fn mutate_if(&mut self, change: impl FnOnce(&mut RuleSet) -> Result<bool>) -> Result<()> {
        let mut next = RuleSet::clone(&self.current);
        if !change(&mut next)? {
            return Ok(());
        }
        next.revision += 1;

        write_rule_set(&next, &self.path)?;
        self.current = Arc::new(next);
        Ok(())
    }

    /// List backups of a rule set file, newest first.
    pub fn list_history(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let history_dir = history_directory(path.as_ref());

        if !history_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&history_dir)
            .map_err(|e| {
                EssenceError::Config(format!(
                    "Failed to read history directory '{}': {}",
                    history_dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();

        entries.sort_by(|a, b| b.cmp(a));

        Ok(entries)
    }
}

/// Read, normalize and check a persisted rule set.
fn read_rule_set(path: &Path) -> Result<RuleSet> {
    let file = File::open(path).map_err(|e| EssenceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut rules: RuleSet = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        EssenceError::Config(format!(
            "Failed to parse rule set '{}': {}",
            path.display(),
            e
        ))
    })?;

    rules.normalize_keys();
    rules.ensure_valid().map_err(|e| {
        EssenceError::Config(format!("Rule set '{}' is invalid: {}", path.display(), e))
    })?;

    Ok(rules)
}

/// Write a rule set as pretty-printed JSON.
fn write_rule_set(rules: &RuleSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                EssenceError::Config(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(path).map_err(|e| {
        EssenceError::Config(format!(
            "Failed to create file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, rules)
        .map_err(|e| EssenceError::Config(format!("Failed to serialize rule set: {}", e)))?;
    writer.flush().map_err(|e| {
        EssenceError::Config(format!("Failed to write '{}': {}", path.display(), e))
    })?;

    debug!(path = %path.display(), revision = rules.revision, "persisted rule set");
    Ok(())
}

/// Copy the file at `path` into its history directory under a timestamp.
fn backup_to_history(path: &Path) -> Result<()> {
    let history_dir = history_directory(path);

    if !history_dir.exists() {
        fs::create_dir_all(&history_dir).map_err(|e| {
            EssenceError::Config(format!(
                "Failed to create history directory '{}': {}",
                history_dir.display(),
                e
            ))
        })?;
    }

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
    let backup = history_dir.join(format!("{}.json", timestamp));

    fs::copy(path, &backup).map_err(|e| {
        EssenceError::Config(format!(
            "Failed to back up '{}' to '{}': {}",
            path.display(),
            backup.display(),
            e
        ))
    })?;

    Ok(())
}

/// Get the history directory for a rule set file.
fn history_directory(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.history", stem))
}
