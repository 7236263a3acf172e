use crate::app::{App, report};
use anyhow::Context;
use brokerpad_gradle::DependencySpec;
use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct AdoptedRow {
    #[tabled(rename = "Archive")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
}

pub async fn run(app: &App, file: Option<&Path>, deps: &[String]) -> anyhow::Result<()> {
    let mut text = deps.join("\n");
    if let Some(file) = file {
        let declared =
            std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        text.push('\n');
        text.push_str(&declared);
    }
    let spec = DependencySpec::parse(&text)?;

    let fetcher = brokerpad_runtime::build_fetcher(&app.config, &app.session);
    println!("Fetching {} declarations...", spec.declarations().len());
    let outcome = fetcher
        .fetch_with_timeout(spec, app.config.fetch_timeout())
        .await?;

    if !outcome.output.trim().is_empty() {
        println!("{}", outcome.output.trim_end());
    }
    let rows: Vec<AdoptedRow> = outcome
        .adopted
        .iter()
        .map(|(category, path)| AdoptedRow {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            category: category.to_string(),
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
    report(&outcome.feedback);
    println!(
        "{} new archives, {} adopted, {} skipped",
        outcome.new_archives.len(),
        outcome.adopted.len(),
        outcome.skipped.len()
    );
    app.save()
}

pub async fn clean(app: &App) -> anyhow::Result<()> {
    let fetcher = brokerpad_runtime::build_fetcher(&app.config, &app.session);
    fetcher.cleanup().await?;
    println!("Removed {}", fetcher.project().dir().display());
    Ok(())
}
