//! # survey-builder-cli
//!
//! Terminal front end for the survey builder.
//!
//! The interactive session offers the catalog's question bundles, lets the
//! user fill in the survey with step-by-step `dialoguer` prompts and exports
//! the built survey as JSON. The non-interactive helpers here back the
//! `list-bundles`, `show-bundle` and `export` subcommands.

mod app;
pub mod config;
mod renderer;

pub use app::{App, status_line};
pub use renderer::{DialoguerError, DialoguerRenderer};

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use survey_builder::{Action, Notice, Store};
use survey_catalog::{Catalog, sync_rules};
use tracing::{info, warn};

/// One line per bundle: id, title and question count.
pub fn list_bundles(catalog: &Catalog) -> String {
    catalog
        .iter()
        .map(|b| {
            format!(
                "{}\t{} ({} questions)\n",
                b.id,
                b.bundle_title,
                b.question_schemas.len()
            )
        })
        .collect()
}

/// The bundle with `id` as pretty-printed JSON.
pub fn show_bundle(catalog: &Catalog, id: &str) -> anyhow::Result<String> {
    let Some(bundle) = catalog.get(id) else {
        bail!("unknown bundle '{id}'");
    };
    serde_json::to_string_pretty(bundle).context("serialize bundle")
}

/// A fresh store with the given bundles added in order.
pub fn build_store(catalog: &Catalog, ids: &[String]) -> anyhow::Result<Store> {
    let mut store = Store::new(sync_rules());
    for id in ids {
        let Some(bundle) = catalog.get(id) else {
            bail!("unknown bundle '{id}'");
        };
        match store.dispatch(Action::AddBundle(bundle.clone())) {
            Notice::AllDuplicates { .. } => warn!(bundle = %id, "bundle already added"),
            notice => info!(bundle = %id, "{notice}"),
        }
    }
    Ok(store)
}

/// Build a survey from `ids` and write the export file into `dir`.
pub fn export_bundles(catalog: &Catalog, ids: &[String], dir: &Path) -> anyhow::Result<PathBuf> {
    let store = build_store(catalog, ids)?;
    let path = store
        .export()
        .write_to(dir)
        .with_context(|| format!("write export to {}", dir.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_catalog::catalog;

    #[test]
    fn lists_every_bundle() {
        let catalog = catalog();
        let listing = list_bundles(&catalog);
        assert_eq!(listing.lines().count(), catalog.len());
        assert!(listing.contains("bundle_age_v1\tAge Question (with validation) (1 questions)"));
    }

    #[test]
    fn unknown_bundle_is_an_error() {
        let err = show_bundle(&catalog(), "bundle_nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown bundle 'bundle_nope'");
        assert!(build_store(&catalog(), &["bundle_nope".to_string()]).is_err());
    }

    #[test]
    fn shown_bundle_is_camel_case_json() {
        let json = show_bundle(&catalog(), "bundle_age_v1").unwrap();
        assert!(json.contains("\"bundleTitle\""));
        assert!(json.contains("\"questionSchemas\""));
    }

    #[test]
    fn duplicate_bundles_are_added_once() {
        let ids = vec!["bundle_age_v1".to_string(), "bundle_age_v1".to_string()];
        let store = build_store(&catalog(), &ids).unwrap();
        assert_eq!(store.question_count(), 1);
        assert_eq!(store.metadata().total_bundles_added, 1);
    }
}
