//! Property-based tests for the component registry using proptest.

use proptest::prelude::*;
use std::collections::BTreeSet;

use gridbench_core::{
    AlgorithmError, Classifier, ClassifierRegistry, Dataset, RegistryEntry, TagMatch,
};

struct Noop;

impl Classifier for Noop {
    fn fit(&mut self, _train: &Dataset) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
        Ok(vec![String::new(); data.len()])
    }
}

fn tag_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(str::to_string)
}

fn entries_strategy() -> impl Strategy<Value = Vec<Seed>> {
    prop::collection::vec(
        ("[a-z]{1,6}", prop::collection::btree_set(tag_strategy(), 0..4)),
        0..20,
    )
}

type Seed = (String, BTreeSet<String>);

fn build(entries: &[Seed]) -> (ClassifierRegistry, Vec<Seed>) {
    let registry = ClassifierRegistry::classifiers();
    let mut accepted = Vec::new();
    for (name, tags) in entries {
        let entry = RegistryEntry::classifier(name, || Noop).with_tags(tags);
        if registry.register(entry).is_ok() {
            accepted.push((name.clone(), tags.clone()));
        }
    }
    (registry, accepted)
}

proptest! {
    #[test]
    fn names_are_unique_and_first_wins(entries in entries_strategy()) {
        let (registry, accepted) = build(&entries);
        let unique: BTreeSet<&String> = entries.iter().map(|(n, _)| n).collect();
        prop_assert_eq!(registry.len(), unique.len());
        prop_assert_eq!(accepted.len(), unique.len());
        for (name, tags) in &accepted {
            let entry = registry.get_by_name(name).unwrap();
            prop_assert_eq!(entry.tags(), tags);
        }
    }

    #[test]
    fn tag_index_matches_entries(entries in entries_strategy(), tag in tag_strategy()) {
        let (registry, accepted) = build(&entries);
        let expected: Vec<&str> = {
            let mut names: Vec<&str> = accepted
                .iter()
                .filter(|(_, tags)| tags.contains(&tag))
                .map(|(n, _)| n.as_str())
                .collect();
            names.sort();
            names
        };
        let found = registry.get_by_tags(&[tag.as_str()], TagMatch::Union);
        let found: Vec<&str> = found.iter().map(|e| e.name()).collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn intersection_is_subset_of_union(
        entries in entries_strategy(),
        query in prop::collection::vec(tag_strategy(), 1..4),
    ) {
        let (registry, _) = build(&entries);
        let union: BTreeSet<String> = registry
            .get_by_tags(&query, TagMatch::Union)
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        let intersection = registry.get_by_tags(&query, TagMatch::Intersection);
        for entry in &intersection {
            prop_assert!(union.contains(entry.name()));
            for tag in &query {
                prop_assert!(entry.has_tag(tag));
            }
        }
    }

    #[test]
    fn tag_results_are_sorted_and_distinct(
        entries in entries_strategy(),
        query in prop::collection::vec(tag_strategy(), 0..5),
    ) {
        let (registry, _) = build(&entries);
        for mode in [TagMatch::Union, TagMatch::Intersection] {
            let names: Vec<String> = registry
                .get_by_tags(&query, mode)
                .iter()
                .map(|e| e.name().to_string())
                .collect();
            let mut sorted = names.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(names, sorted);
        }
    }
}
