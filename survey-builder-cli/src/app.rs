//! Interactive builder session.

use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use dialoguer::{Confirm, FuzzySelect, Select};
use survey_builder::{Action, CLEAR_CONFIRMATION, Notice, Store};
use survey_catalog::Catalog;
use tracing::{debug, info};

use crate::config::Settings;
use crate::renderer::DialoguerRenderer;

const MENU: [&str; 5] = [
    "Add question bundle",
    "Fill in survey",
    "Clear survey",
    "Export survey JSON",
    "Quit",
];

/// Status line shown above the menu.
pub fn status_line(question_count: usize) -> String {
    if question_count == 0 {
        "No questions yet. Add a bundle to get started.".to_string()
    } else {
        format!("{question_count} question(s) added")
    }
}

/// The menu loop around a [`Store`].
pub struct App {
    store: Store,
    catalog: Catalog,
    settings: Settings,
}

impl App {
    pub fn new(store: Store, catalog: Catalog, settings: Settings) -> Self {
        Self {
            store,
            catalog,
            settings,
        }
    }

    fn theme(&self) -> Box<dyn Theme> {
        if self.settings.colorful {
            Box::new(ColorfulTheme::default())
        } else {
            Box::new(SimpleTheme)
        }
    }

    /// Run until the user quits or cancels the menu.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            println!();
            println!("{}", status_line(self.store.question_count()));

            let theme = self.theme();
            let Some(choice) = Select::with_theme(theme.as_ref())
                .with_prompt("What next?")
                .items(&MENU)
                .default(0)
                .interact_opt()?
            else {
                return Ok(());
            };

            match choice {
                0 => self.add_bundle()?,
                1 => self.fill_in()?,
                2 => self.clear()?,
                3 => self.export()?,
                _ => return Ok(()),
            }
        }
    }

    fn add_bundle(&mut self) -> anyhow::Result<()> {
        let titles: Vec<&str> = self
            .catalog
            .iter()
            .map(|b| b.bundle_title.as_str())
            .collect();

        let theme = self.theme();
        let Some(index) = FuzzySelect::with_theme(theme.as_ref())
            .with_prompt("Question bundle")
            .items(&titles)
            .default(0)
            .interact_opt()?
        else {
            return Ok(());
        };

        let Some(bundle) = self.catalog.bundles().get(index).cloned() else {
            return Ok(());
        };
        debug!(bundle = %bundle.id, "bundle picked");
        report(&self.store.dispatch(Action::AddBundle(bundle)));
        Ok(())
    }

    fn fill_in(&mut self) -> anyhow::Result<()> {
        if self.store.document().is_empty() {
            println!("Add some questions first.");
            return Ok(());
        }

        let renderer = DialoguerRenderer::new()
            .with_colors(self.settings.colorful)
            .with_default_max_size(self.settings.default_max_size);
        match self.store.run(&renderer) {
            Ok(notice) => report(&notice),
            Err(err) if err.is_cancelled() => {
                println!("Survey cancelled. Answers entered so far are kept.");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        let notice = self.store.dispatch(Action::Clear { confirmed: false });
        if !matches!(notice, Notice::ConfirmClear) {
            report(&notice);
            return Ok(());
        }

        let theme = self.theme();
        let confirmed = Confirm::with_theme(theme.as_ref())
            .with_prompt(CLEAR_CONFIRMATION)
            .default(false)
            .interact_opt()?
            .unwrap_or(false);
        if confirmed {
            report(&self.store.dispatch(Action::Clear { confirmed: true }));
        }
        Ok(())
    }

    fn export(&mut self) -> anyhow::Result<()> {
        let path = self.store.export().write_to(&self.settings.export_dir)?;
        info!(path = %path.display(), "survey exported");
        println!("Survey exported to {}", path.display());
        Ok(())
    }
}

fn report(notice: &Notice) {
    if !notice.is_silent() {
        println!("{notice}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts_questions() {
        assert_eq!(status_line(3), "3 question(s) added");
        assert_eq!(
            status_line(0),
            "No questions yet. Add a bundle to get started."
        );
    }

    #[test]
    fn menu_ends_with_quit() {
        assert_eq!(MENU.last(), Some(&"Quit"));
    }
}
