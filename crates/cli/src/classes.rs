use crate::app::App;
use brokerpad_core::ModuleCategory;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ClassRow {
    #[tabled(rename = "Class")]
    name: String,
    #[tabled(rename = "Kind")]
    filter: String,
    #[tabled(rename = "Archive")]
    archive: String,
    #[tabled(rename = "")]
    selected: &'static str,
}

pub fn list(app: &App, category: ModuleCategory, filter: &str) -> anyhow::Result<()> {
    let manager = app.manager(category);
    let selected = manager.selected();
    let rows: Vec<ClassRow> = manager
        .query(filter)
        .into_iter()
        .map(|t| ClassRow {
            selected: if selected.as_ref() == Some(&t) { "*" } else { "" },
            name: t.name().to_string(),
            filter: t.filter().to_string(),
            archive: t.location().file_name(),
        })
        .collect();

    if rows.is_empty() {
        println!("No {category} classes match '{filter}'.");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

pub fn select(app: &App, category: ModuleCategory, class: &str) -> anyhow::Result<()> {
    let manager = app.manager(category);
    let found = manager.select(class)?;
    match manager.resolve_selected() {
        Some(Err(e)) => println!("warning: {} cannot be resolved: {}", found.name(), e),
        _ => println!("Selected {} from {}", found.name(), found.location()),
    }
    app.save()
}

pub fn template(app: &App, category: ModuleCategory) -> anyhow::Result<()> {
    let Some(selected) = app.manager(category).selected() else {
        anyhow::bail!("no {category} class selected");
    };
    println!("{}", selected.handler().generate_template());
    Ok(())
}
