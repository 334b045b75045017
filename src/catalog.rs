//! Catalog loader.
//!
//! Reads a directory tree of the form `<root>/<category>/<command>.json`
//! into a flat list of [`Command`]s, each tagged with its category. The
//! catalog is rebuilt from disk on every request; nothing is cached, so a
//! lookup always reflects what the mirror last wrote.
//!
//! A single bad file never fails the load: unreadable or malformed records
//! are logged and skipped. A missing root yields an empty catalog.

use std::path::Path;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::models::Command;

/// Lookup failures surfaced to API clients as `404`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Category '{category}' not found")]
    CategoryNotFound { category: String },

    #[error("Command '{command}' not found in category '{category}'")]
    CommandNotFound { category: String, command: String },
}

/// Result of one load pass over the catalog root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    commands: Vec<Command>,
}

impl Catalog {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Every loaded command, in load order.
    pub fn all(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Distinct category names, in the order they were first seen.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for cmd in &self.commands {
            if !seen.contains(&cmd.category.as_str()) {
                seen.push(&cmd.category);
            }
        }
        seen
    }

    /// Commands tagged with `category`.
    ///
    /// A category with no loadable commands (including an empty directory)
    /// is reported as not found.
    pub fn in_category(&self, category: &str) -> Result<Vec<&Command>, LookupError> {
        let matches: Vec<&Command> = self
            .commands
            .iter()
            .filter(|c| c.category == category)
            .collect();

        if matches.is_empty() {
            return Err(LookupError::CategoryNotFound {
                category: category.to_string(),
            });
        }
        Ok(matches)
    }

    /// First command named `name` within `category`.
    pub fn command(&self, category: &str, name: &str) -> Result<&Command, LookupError> {
        self.in_category(category)?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LookupError::CommandNotFound {
                category: category.to_string(),
                command: name.to_string(),
            })
    }
}

/// Load the catalog rooted at `root`.
pub fn load_catalog(root: &Path) -> Catalog {
    if !root.is_dir() {
        tracing::warn!(
            path = %root.display(),
            "catalog root does not exist; serving empty catalog"
        );
        return Catalog::default();
    }

    let mut commands = Vec::new();

    for category_dir in immediate_children(root) {
        if !category_dir.file_type().is_dir() {
            continue;
        }
        let category = category_dir.file_name().to_string_lossy().to_string();

        for file in immediate_children(category_dir.path()) {
            if !is_json_file(&file) {
                continue;
            }
            let path = file.path();
            let parsed = std::fs::read_to_string(path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| Command::from_json(&category, &raw).map_err(anyhow::Error::from));

            match parsed {
                Ok(cmd) => commands.push(cmd),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping command file");
                }
            }
        }
    }

    Catalog::new(commands)
}

/// Non-hidden direct children of `dir`, sorted by file name.
fn immediate_children(dir: &Path) -> impl Iterator<Item = DirEntry> {
    let dir_display = dir.display().to_string();
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %dir_display, error = %e, "failed to read catalog entry");
                None
            }
        })
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
}

fn is_json_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json")
}
