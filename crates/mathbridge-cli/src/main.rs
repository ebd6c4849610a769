use clap::{Parser, Subcommand};
use colored::Colorize;
use mathbridge_core::{
    normalize_for_display, normalize_for_parsing, Error, Expression, ExpressionStore,
    FormulaRegistry, JsonBridge, LatexGrammar,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// mathbridge — formula markup between an editor and a symbolic parser
///
/// Normalize LaTeX markup, parse it, export it under short aliases, and
/// keep named formulas in a registry file.
#[derive(Parser)]
#[command(name = "mathbridge", version, about, long_about = None)]
struct Cli {
    /// Suppress status messages
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug events to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite markup for the parser (default) or for the editor
    Normalize {
        /// Markup text
        #[arg(allow_hyphen_values = true)]
        markup: String,
        /// Run the display pipeline instead
        #[arg(long)]
        display: bool,
    },

    /// Parse editor markup and print its display form
    Parse {
        /// Markup text
        #[arg(allow_hyphen_values = true)]
        markup: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export markup as a foreign JSON value under short aliases
    Export {
        /// Markup text
        #[arg(allow_hyphen_values = true)]
        markup: String,
    },

    /// Manage a file of named formulas
    Registry {
        /// Path to the registry JSON file
        #[arg(long)]
        registry: PathBuf,
        #[command(subcommand)]
        action: RegistryAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum RegistryAction {
    /// Parse markup into the named formula, creating the file if needed
    Set {
        name: String,
        #[arg(allow_hyphen_values = true)]
        markup: String,
    },
    /// Add an empty formula, replacing any existing one
    Add { name: String },
    /// Print one formula, or all of them
    Show { name: Option<String> },
    /// Delete a formula
    Remove { name: String },
    /// Delete every empty formula
    Clean,
    /// List formula names
    List,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Normalize { markup, display } => cmd_normalize(&markup, display),
        Commands::Parse { markup, json } => cmd_parse(&markup, json),
        Commands::Export { markup } => cmd_export(&markup),
        Commands::Registry { registry, action } => cmd_registry(&registry, action, cli.quiet),
        Commands::Version => {
            println!(
                "mathbridge {} (mathbridge-core {})",
                env!("CARGO_PKG_VERSION"),
                mathbridge_core::VERSION
            );
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            exit_code(&err)
        }
    };
    process::exit(exit_code);
}

static INIT_LOGGING: Once = Once::new();

/// Install the stderr subscriber; later calls are no-ops
fn init_logging(verbose: bool) {
    INIT_LOGGING.call_once(|| {
        let default = if verbose { "mathbridge=debug" } else { "mathbridge=warn" };
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
            )
            .init();
    });
}

/// 1 for rejected input, 2 for environment failures
fn exit_code(err: &Error) -> i32 {
    match err {
        Error::IoError(_) | Error::SerializationError(_) => 2,
        _ => 1,
    }
}

// ── Commands ───────────────────────────────────────────────

fn cmd_normalize(markup: &str, display: bool) -> Result<(), Error> {
    let out = if display {
        normalize_for_display(markup)
    } else {
        normalize_for_parsing(markup)
    };
    println!("{}", out);
    Ok(())
}

fn cmd_parse(markup: &str, json: bool) -> Result<(), Error> {
    let mut store = ExpressionStore::new(LatexGrammar::new());
    store.set_from_markup(markup)?;
    let Some(expr) = store.expression() else {
        return Err(Error::EmptyStore);
    };

    if json {
        let symbols: Vec<String> = expr
            .free_symbols()
            .into_iter()
            .map(|s| s.into_name())
            .collect();
        let out = serde_json::json!({
            "normalized": normalize_for_parsing(markup),
            "expr": expr.to_string(),
            "markup": store.to_markup(),
            "symbols": symbols,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", store.to_markup());
    }
    Ok(())
}

fn cmd_export(markup: &str) -> Result<(), Error> {
    let mut store = ExpressionStore::new(LatexGrammar::new());
    store.set_from_markup(markup)?;
    let foreign = store.export_foreign(&JsonBridge)?;
    let out = serde_json::json!({
        "foreign": foreign,
        "symbols": store.symbols().to_pairs(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_registry(path: &Path, action: RegistryAction, quiet: bool) -> Result<(), Error> {
    let mut registry = FormulaRegistry::new(LatexGrammar::new());

    match action {
        RegistryAction::Set { name, markup } => {
            if path.exists() {
                registry.load_file(path)?;
            }
            registry.get(&name).set_from_markup(&markup)?;
            registry.save(path)?;
            if !quiet {
                println!("{}: {}", name.green(), registry.get(&name).to_markup());
            }
        }
        RegistryAction::Add { name } => {
            if path.exists() {
                registry.load_file(path)?;
            }
            registry.add(&name);
            registry.save(path)?;
            if !quiet {
                println!("{} {}", "added".green(), name);
            }
        }
        RegistryAction::Show { name: Some(name) } => {
            registry.load_file(path)?;
            println!("{}", registry.lookup(&name)?.to_markup());
        }
        RegistryAction::Show { name: None } => {
            registry.load_file(path)?;
            for (name, store) in registry.iter() {
                println!("{}: {}", name, store.to_markup());
            }
        }
        RegistryAction::Remove { name } => {
            registry.load_file(path)?;
            registry.remove(&name)?;
            registry.save(path)?;
            if !quiet {
                println!("{} {}", "removed".yellow(), name);
            }
        }
        RegistryAction::Clean => {
            registry.load_file(path)?;
            let removed = registry.clean_empty();
            registry.save(path)?;
            if !quiet {
                println!("{} {} empty formula(s)", "removed".yellow(), removed.len());
            }
        }
        RegistryAction::List => {
            registry.load_file(path)?;
            for name in registry.names() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
