mod app;
mod classes;
mod compile;
mod fetch;
mod jars;

use brokerpad_core::ModuleCategory;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use app::App;

#[derive(Parser)]
#[command(
    name = "brokerpad",
    version,
    about = "Manage message and auth archives for a broker client",
    long_about = "Brokerpad keeps user-supplied JVM archives in three categories (message, auth, common), \
                  discovers the message formats and authentication handlers they contain, compiles \
                  Groovy snippets into message payloads and fetches archives with Gradle."
)]
pub struct Cli {
    /// Data directory (defaults to $BROKERPAD_HOME or ~/.brokerpad)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add, remove and list managed archives
    #[command(subcommand)]
    Jars(jars::JarCommands),
    /// List discovered classes of a category
    Classes {
        #[arg(value_name = "CATEGORY")]
        category: ModuleCategory,
        /// Case-insensitive substring of the class name
        #[arg(default_value = "")]
        filter: String,
    },
    /// Select the class used for a category
    Select {
        #[arg(value_name = "CATEGORY")]
        category: ModuleCategory,
        /// Fully qualified class name
        class: String,
    },
    /// Print a snippet template for the selected class
    Template {
        #[arg(value_name = "CATEGORY")]
        category: ModuleCategory,
    },
    /// Evaluate a Groovy snippet into the selected class's payload
    #[command(
        long_about = "Evaluates the snippet with the category's archives on the classpath. The result \
                      must be an instance of the selected class; its payload is written to --out or \
                      pretty-printed."
    )]
    Compile {
        #[arg(value_name = "CATEGORY")]
        category: ModuleCategory,
        /// Snippet file, `-` for stdin
        #[arg(value_name = "SNIPPET")]
        source: PathBuf,
        /// Write the payload bytes here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Fetch archives with Gradle and sort them into categories
    Fetch {
        /// File with one dependency declaration per line
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
        /// Dependency coordinates, `group:artifact:version`
        #[arg(value_name = "COORDINATES")]
        deps: Vec<String>,
    },
    /// Remove the generated Gradle project, keeping its cache
    FetchClean,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = app::load_config(cli.data_dir.as_deref())?;
    let _guard = brokerpad_runtime::init_logging(&config, "cli", cli.verbose);

    let rt = tokio::runtime::Runtime::new()?;
    let app = App::open(config)?;

    match cli.command {
        Commands::Jars(cmd) => jars::run(&app, cmd),
        Commands::Classes { category, filter } => classes::list(&app, category, &filter),
        Commands::Select { category, class } => classes::select(&app, category, &class),
        Commands::Template { category } => classes::template(&app, category),
        Commands::Compile {
            category,
            source,
            out,
        } => rt.block_on(compile::run(&app, category, &source, out.as_deref())),
        Commands::Fetch { file, deps } => rt.block_on(fetch::run(&app, file.as_deref(), &deps)),
        Commands::FetchClean => rt.block_on(fetch::clean(&app)),
    }
}
