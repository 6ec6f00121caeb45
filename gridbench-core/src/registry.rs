//! Component Registry: named, taggable factories for interchangeable algorithms.
//!
//! Entries are registered once, usually at startup, and looked up by name or by
//! tag set. Names and tags are normalized (trimmed, lower-cased), so lookups are
//! case-insensitive. A single read-write lock guards both the name map and the
//! derived tag index; a reader never sees an entry that is only partially
//! indexed.

use crate::component::{Classifier, Clusterer, Transform};
use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Zero-argument producer of fresh component instances.
pub type Factory<C> = Arc<dyn Fn() -> Box<C> + Send + Sync>;

pub type ClassifierRegistry = ComponentRegistry<dyn Classifier>;
pub type TransformRegistry = ComponentRegistry<dyn Transform>;
pub type ClustererRegistry = ComponentRegistry<dyn Clusterer>;

/// Normalize a name or tag for storage and lookup.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// How a set of tags is combined in [`ComponentRegistry::get_by_tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    /// Entries carrying at least one of the tags.
    Union,
    /// Entries carrying every one of the tags.
    Intersection,
}

/// An immutable registry record: name, tags and factory.
pub struct RegistryEntry<C: ?Sized> {
    name: String,
    tags: BTreeSet<String>,
    factory: Factory<C>,
}

impl<C: ?Sized> RegistryEntry<C> {
    pub fn new<F>(name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<C> + Send + Sync + 'static,
    {
        Self {
            name: normalize_key(name),
            tags: BTreeSet::new(),
            factory: Arc::new(factory),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(
            tags.into_iter()
                .map(|t| normalize_key(t.as_ref()))
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&normalize_key(tag))
    }

    /// Produce a fresh instance.
    pub fn build(&self) -> Box<C> {
        (self.factory)()
    }
}

impl RegistryEntry<dyn Classifier> {
    pub fn classifier<T, F>(name: &str, factory: F) -> Self
    where
        T: Classifier + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(name, move || Box::new(factory()) as Box<dyn Classifier>)
    }
}

impl RegistryEntry<dyn Transform> {
    pub fn transform<T, F>(name: &str, factory: F) -> Self
    where
        T: Transform + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(name, move || Box::new(factory()) as Box<dyn Transform>)
    }
}

impl RegistryEntry<dyn Clusterer> {
    pub fn clusterer<T, F>(name: &str, factory: F) -> Self
    where
        T: Clusterer + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(name, move || Box::new(factory()) as Box<dyn Clusterer>)
    }
}

impl<C: ?Sized> std::fmt::Debug for RegistryEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

struct RegistryIndex<C: ?Sized> {
    by_name: HashMap<String, Arc<RegistryEntry<C>>>,
    /// tag -> entry names; derived from `by_name`.
    by_tag: HashMap<String, BTreeSet<String>>,
}

/// Registry of component factories of one kind.
pub struct ComponentRegistry<C: ?Sized> {
    kind: &'static str,
    index: RwLock<RegistryIndex<C>>,
}

impl<C: ?Sized> ComponentRegistry<C> {
    /// Create an empty registry. `kind` names the component family in errors
    /// and logs ("classifier", "transform", ...).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            index: RwLock::new(RegistryIndex {
                by_name: HashMap::new(),
                by_tag: HashMap::new(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryIndex<C>> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryIndex<C>> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an entry. Fails if the name is empty or already taken; a
    /// rejected entry leaves the registry unchanged.
    pub fn register(&self, entry: RegistryEntry<C>) -> Result<(), RegistryError> {
        if entry.name.is_empty() {
            return Err(RegistryError::InvalidName {
                kind: self.kind,
                name: entry.name,
            });
        }

        let mut index = self.write();
        if index.by_name.contains_key(&entry.name) {
            return Err(RegistryError::DuplicateName {
                kind: self.kind,
                name: entry.name,
            });
        }

        let entry = Arc::new(entry);
        for tag in &entry.tags {
            index
                .by_tag
                .entry(tag.clone())
                .or_default()
                .insert(entry.name.clone());
        }
        index.by_name.insert(entry.name.clone(), Arc::clone(&entry));
        debug!(kind = self.kind, name = %entry.name, tags = ?entry.tags, "Registered component");
        Ok(())
    }

    /// Look up an entry by name.
    pub fn get_by_name(&self, name: &str) -> Result<Arc<RegistryEntry<C>>, RegistryError> {
        let key = normalize_key(name);
        self.read()
            .by_name
            .get(&key)
            .cloned()
            .ok_or(RegistryError::NotFound {
                kind: self.kind,
                name: key,
            })
    }

    /// Build a fresh instance of the named component.
    pub fn build(&self, name: &str) -> Result<Box<C>, RegistryError> {
        Ok(self.get_by_name(name)?.build())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().by_name.contains_key(&normalize_key(name))
    }

    /// Entries matching a tag set, in name order. An empty tag set matches
    /// nothing in either mode.
    pub fn get_by_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
        mode: TagMatch,
    ) -> Vec<Arc<RegistryEntry<C>>> {
        let wanted: BTreeSet<String> = tags
            .iter()
            .map(|t| normalize_key(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        if wanted.is_empty() {
            return Vec::new();
        }

        let index = self.read();
        let names: BTreeSet<&String> = match mode {
            TagMatch::Union => wanted
                .iter()
                .filter_map(|t| index.by_tag.get(t))
                .flatten()
                .collect(),
            TagMatch::Intersection => {
                let mut buckets = Vec::with_capacity(wanted.len());
                for tag in &wanted {
                    match index.by_tag.get(tag) {
                        Some(bucket) => buckets.push(bucket),
                        None => return Vec::new(),
                    }
                }
                buckets.sort_by_key(|b| b.len());
                let Some((smallest, rest)) = buckets.split_first() else {
                    return Vec::new();
                };
                smallest
                    .iter()
                    .filter(|name| rest.iter().all(|b| b.contains(*name)))
                    .collect()
            }
        };

        names
            .into_iter()
            .filter_map(|name| index.by_name.get(name).cloned())
            .collect()
    }

    /// All entries in name order.
    pub fn entries(&self) -> Vec<Arc<RegistryEntry<C>>> {
        let index = self.read();
        let mut entries: Vec<_> = index.by_name.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// All tags in use, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.read().by_tag.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().by_name.is_empty()
    }
}

impl ComponentRegistry<dyn Classifier> {
    pub fn classifiers() -> Self {
        Self::new("classifier")
    }
}

impl ComponentRegistry<dyn Transform> {
    pub fn transforms() -> Self {
        Self::new("transform")
    }
}

impl ComponentRegistry<dyn Clusterer> {
    pub fn clusterers() -> Self {
        Self::new("clusterer")
    }
}

impl<C: ?Sized> std::fmt::Debug for ComponentRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}
