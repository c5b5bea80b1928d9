//! The predefined question bundles offered by the survey builder, and the
//! synchronization rules that tie their count questions to repeating groups.

pub mod calculations;
pub mod choices;
pub mod constraints;
pub mod defaults;
pub mod grouping;
pub mod media;
pub mod repeats;
pub mod scales;

use survey_builder::{Bundle, ChoiceDependency, CountBinding, SyncRules};

/// Ordered, read-only collection of bundles.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    bundles: Vec<Bundle>,
}

impl Catalog {
    pub fn new(bundles: Vec<Bundle>) -> Self {
        Self { bundles }
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter()
    }

    /// Look up a bundle by id, e.g. `bundle_age_v1`.
    pub fn get(&self, id: &str) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.bundles.iter().map(|b| b.id.as_str()).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        catalog()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Bundle;
    type IntoIter = std::slice::Iter<'a, Bundle>;

    fn into_iter(self) -> Self::IntoIter {
        self.bundles.iter()
    }
}

/// All bundles, in the order they are offered.
pub fn catalog() -> Catalog {
    Catalog::new(vec![
        repeats::simple_repeat(),
        repeats::nested_repeat(),
        choices::choice_filter(),
        choices::skip_logic(),
        media::media_upload(),
        constraints::constraints(),
        grouping::grouped_questions(),
        scales::range_scale(),
        choices::multiple_select_logic(),
        calculations::calculations(),
        choices::email(),
        constraints::age(),
        choices::equipment(),
        media::photo_id(),
        scales::satisfaction(),
        choices::ranking(),
        defaults::defaults(),
        grouping::matrix(),
    ])
}

/// Count-to-panel bindings and choice dependencies used by the catalog's
/// bundles.
pub fn sync_rules() -> SyncRules {
    SyncRules::new()
        .count(CountBinding::new("children_count", "children_details"))
        .count(CountBinding::new("household_size", "household_members"))
        .count(CountBinding::within(
            "household_members",
            "asset_count",
            "member_assets",
        ))
        .dependency(ChoiceDependency::new("country", "city"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn eighteen_unique_bundles() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 18);

        let ids: HashSet<&str> = catalog.ids().into_iter().collect();
        assert_eq!(ids.len(), 18);
    }

    #[test]
    fn field_names_unique_across_catalog() {
        let catalog = catalog();
        let mut seen = HashSet::new();
        for bundle in &catalog {
            for name in bundle.field_names() {
                assert!(seen.insert(name.to_string()), "duplicate field {name}");
            }
        }
    }

    #[test]
    fn lookup_by_id() {
        let catalog = catalog();
        let age = catalog.get("bundle_age_v1").unwrap();
        assert_eq!(age.bundle_title, "Age Question (with validation)");
        assert!(catalog.get("bundle_missing").is_none());
    }

    #[test]
    fn rules_reference_catalog_fields() {
        let catalog = catalog();
        let rules = sync_rules();
        let top_level: HashSet<&str> = catalog.iter().flat_map(|b| b.field_names()).collect();

        for binding in rules.counts.iter().filter(|b| b.within.is_none()) {
            assert!(top_level.contains(binding.count_field.as_str()));
            assert!(top_level.contains(binding.panel_field.as_str()));
        }
        for dependency in &rules.dependencies {
            assert!(top_level.contains(dependency.controller.as_str()));
            assert!(top_level.contains(dependency.dependent.as_str()));
        }
    }
}
