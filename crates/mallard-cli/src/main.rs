use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mallard_cli::report::{self, render_diagnostics, render_pretty};
use mallard_types::{InferConfig, TypeChecker, UnresolvedPolicy};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mallard")]
#[command(about = "Mallard: duck-typed type inference over linked program graphs")]
struct Cli {
    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Infer types and print one line per typed node
    Infer {
        /// Path to a JSON program graph
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// Include nodes of skipped namespaces (the prelude)
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        options: InferOptions,
    },

    /// Infer types and report problems; exits non-zero on any
    Check {
        /// Path to a JSON program graph
        file: PathBuf,

        #[command(flatten)]
        options: InferOptions,
    },

    /// Print the prelude-only program graph as JSON
    Prelude,
}

#[derive(Args, Debug)]
struct InferOptions {
    /// Keep going past unresolved messages and report them all
    #[arg(long)]
    collect_unresolved: bool,

    /// Nesting limit for constraint generation
    #[arg(long)]
    max_depth: Option<u32>,

    /// JSON file with inference settings; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Debug)]
enum Format {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Infer {
            file,
            format,
            all,
            options,
        } => cmd_infer(&file, format, all, &options),

        Commands::Check { file, options } => cmd_check(&file, &options),

        Commands::Prelude => cmd_prelude(),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(options: &InferOptions) -> Result<InferConfig> {
    let mut config = match &options.config {
        Some(path) => report::load_config(path)?,
        None => InferConfig::default(),
    };
    if options.collect_unresolved {
        config.unresolved = UnresolvedPolicy::Collect;
    }
    if let Some(depth) = options.max_depth {
        config.max_depth = depth;
    }
    Ok(config)
}

fn cmd_infer(file: &Path, format: Format, all: bool, options: &InferOptions) -> Result<()> {
    let program = report::load_program(file)?;
    let mut checker = TypeChecker::with_config(&program, build_config(options)?);
    if let Err(e) = checker.infer() {
        eprintln!("Type error: {}", e);
        std::process::exit(1);
    }
    if !checker.diagnostics().is_empty() {
        eprintln!("{}", render_diagnostics(checker.diagnostics()));
    }

    let rows = report::type_rows(&checker, all);
    match format {
        Format::Pretty => println!("{}", render_pretty(&rows)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

fn cmd_check(file: &Path, options: &InferOptions) -> Result<()> {
    let program = report::load_program(file)?;
    let mut checker = TypeChecker::with_config(&program, build_config(options)?);
    if let Err(e) = checker.infer() {
        eprintln!("Type error: {}", e);
        std::process::exit(1);
    }
    if !checker.diagnostics().is_empty() {
        eprintln!("{}", render_diagnostics(checker.diagnostics()));
        eprintln!("{} unresolved message(s)", checker.diagnostics().len());
        std::process::exit(1);
    }

    println!(
        "ok: {} type variables, fixpoint after {} rounds",
        checker.ctx().len(),
        checker.rounds()
    );
    Ok(())
}

fn cmd_prelude() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&report::prelude_graph())?);
    Ok(())
}
