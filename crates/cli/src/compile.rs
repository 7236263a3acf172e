use crate::app::App;
use anyhow::Context;
use brokerpad_core::ModuleCategory;
use std::io::Read;
use std::path::Path;
use tracing::info;

pub async fn run(
    app: &App,
    category: ModuleCategory,
    source: &Path,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let manager = app.manager(category);
    let Some(selected) = manager.selected() else {
        anyhow::bail!("no {category} class selected");
    };

    let text = if source == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("reading {}", source.display()))?
    };

    let compiler = brokerpad_runtime::build_compiler(&app.config, manager.registry().clone());
    let bytes = compiler.compile_async(text, selected.clone()).await?;
    info!("Compiled {} ({} bytes)", selected.name(), bytes.len());

    match out {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let value = selected.handler().deserialize(&bytes)?;
            println!("{}", selected.handler().pretty_print(&value));
        }
    }
    Ok(())
}
