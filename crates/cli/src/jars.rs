use crate::app::{App, has_errors, report};
use brokerpad_core::ModuleCategory;
use clap::Subcommand;
use std::path::PathBuf;
use tabled::{Table, Tabled};

#[derive(Subcommand)]
pub enum JarCommands {
    /// Copy archives into a category
    Add {
        category: ModuleCategory,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove archives from a category by file name
    Remove {
        category: ModuleCategory,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List managed archives
    List {
        /// Only this category
        category: Option<ModuleCategory>,
    },
    /// Re-register every archive found in the category directories
    Refresh,
    /// Delete every archive of a category
    Clear { category: ModuleCategory },
}

#[derive(Tabled)]
struct JarRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Archive")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
}

pub fn run(app: &App, cmd: JarCommands) -> anyhow::Result<()> {
    let feedback = match cmd {
        JarCommands::Add { category, files } => files
            .iter()
            .map(|file| app.session.add(category, file))
            .collect(),
        JarCommands::Remove { category, names } => names
            .iter()
            .flat_map(|name| app.session.remove(category, name.as_ref()))
            .collect(),
        JarCommands::List { category } => return list(app, category),
        JarCommands::Refresh => app.session.refresh_all(),
        JarCommands::Clear { category } => app.session.delete_all(category),
    };

    report(&feedback);
    app.save()?;
    if has_errors(&feedback) {
        anyhow::bail!("some archives could not be updated");
    }
    Ok(())
}

fn list(app: &App, only: Option<ModuleCategory>) -> anyhow::Result<()> {
    let categories: Vec<ModuleCategory> = match only {
        Some(category) => vec![category],
        None => ModuleCategory::CLASSIFICATION_ORDER.to_vec(),
    };

    let mut rows = Vec::new();
    for category in categories {
        let manager = app.manager(category);
        for name in manager.tracked_files()? {
            let bytes = std::fs::metadata(manager.dir().join(&name))
                .map(|m| m.len())
                .unwrap_or(0);
            rows.push(JarRow {
                category: category.to_string(),
                name,
                size: format_size(bytes),
            });
        }
    }

    if rows.is_empty() {
        println!("No archives.");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}
