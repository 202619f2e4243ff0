//! Specialization Catalog
//!
//! The immutable, validated set of specializations available in a session.
//! Built once per load and read-only afterwards; a reload builds a new
//! catalog rather than mutating this one.
//!
//! Duplicate names are resolved last-write-wins: the later record replaces
//! the earlier one everywhere, and the overwrite is logged.

use crate::error::CatalogError;
use crate::specialization::Specialization;
use crate::validation::validate_specialization;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_name: BTreeMap<String, Arc<Specialization>>,
    /// class → specializations of that class, ordered by name
    by_class: BTreeMap<String, Vec<Arc<Specialization>>>,
}

impl Catalog {
    /// Build a catalog from already-validated records
    pub fn load(records: impl IntoIterator<Item = Specialization>) -> Result<Self, CatalogError> {
        let mut by_name: BTreeMap<String, Arc<Specialization>> = BTreeMap::new();

        for record in records {
            let name = record.name.clone();
            if let Some(previous) = by_name.insert(name.clone(), Arc::new(record)) {
                warn!(
                    specialization = %name,
                    previous_class = %previous.class_name,
                    "duplicate specialization name, later record wins"
                );
            }
        }

        if by_name.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_class: BTreeMap<String, Vec<Arc<Specialization>>> = BTreeMap::new();
        for spec in by_name.values() {
            by_class
                .entry(spec.class_name.clone())
                .or_default()
                .push(Arc::clone(spec));
        }

        debug!(
            specializations = by_name.len(),
            classes = by_class.len(),
            "catalog built"
        );

        Ok(Self { by_name, by_class })
    }

    /// Validate raw JSON values, drop the invalid ones, and build a catalog
    /// from whatever survived.
    pub fn from_json_values(values: &[Value]) -> Result<Self, CatalogError> {
        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            match validate_specialization(value) {
                Ok(spec) => records.push(spec),
                Err(e) => warn!(index, error = %e, "skipping invalid specialization record"),
            }
        }
        Self::load(records)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Specialization>> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn by_class(&self, class_name: &str) -> &[Arc<Specialization>] {
        self.by_class
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.by_class.keys().map(String::as_str)
    }

    /// All specializations in display order: by class, then by name
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Specialization>> {
        self.by_class.values().flatten()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialization::{Effect, EffectScope, EffectType};
    use serde_json::json;

    fn spec(name: &str, class: &str) -> Specialization {
        Specialization::new(name, class, "icons/test.png")
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let result = Catalog::load(Vec::new());
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = Catalog::load(vec![spec("Arms Warrior", "Warrior")]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("Arms Warrior"));
        assert_eq!(catalog.get("Arms Warrior").unwrap().class_name, "Warrior");
        assert!(catalog.get("Fury Warrior").is_none());
    }

    #[test]
    fn test_grouping_by_class_is_ordered() {
        let catalog = Catalog::load(vec![
            spec("Protection Warrior", "Warrior"),
            spec("Holy Priest", "Priest"),
            spec("Arms Warrior", "Warrior"),
        ])
        .unwrap();

        let classes: Vec<_> = catalog.classes().collect();
        assert_eq!(classes, vec!["Priest", "Warrior"]);

        let warriors: Vec<_> = catalog
            .by_class("Warrior")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(warriors, vec!["Arms Warrior", "Protection Warrior"]);
        assert!(catalog.by_class("Druid").is_empty());

        let order: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["Holy Priest", "Arms Warrior", "Protection Warrior"]);
    }

    #[test]
    fn test_duplicate_name_last_write_wins() {
        let first = spec("Holy", "Priest");
        let second = spec("Holy", "Paladin").with_effect(Effect::new(
            "Devotion Aura",
            EffectType::Buff,
            EffectScope::Group,
            "Armor",
        ));
        let catalog = Catalog::load(vec![first, second]).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Holy").unwrap().class_name, "Paladin");
        assert!(catalog.by_class("Priest").is_empty());
        assert_eq!(catalog.by_class("Paladin").len(), 1);
    }

    #[test]
    fn test_from_json_values_skips_invalid() {
        let values = vec![
            json!({
                "name": "Arms Warrior",
                "class": "Warrior",
                "icon_path": "icons/warrior/arms.png",
                "effects": []
            }),
            json!({"name": "Broken"}),
        ];
        let catalog = Catalog::from_json_values(&values).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("Arms Warrior"));
    }

    #[test]
    fn test_from_json_values_all_invalid_is_empty() {
        let result = Catalog::from_json_values(&[json!(42)]);
        assert!(matches!(result, Err(CatalogError::Empty)));
    }
}
