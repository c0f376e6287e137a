//! # astgen
//!
//! Generate AST node type definitions from a schema.
//!
//! ## Usage
//!
//! ```bash
//! # Generate C++ headers from ./ast.toml
//! astgen include/ast
//!
//! # Generate a Rust module from a specific schema
//! astgen --schema schemas/lox.toml --dialect rust src/ast
//!
//! # Preview without writing
//! astgen --dry-run include/ast
//!
//! # Fail if the files on disk are out of date
//! astgen --check include/ast
//! ```

use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use astgen::{DialectKind, EmitMode, WriteResult};
use astgen_cli::{
    config::{CliArgs, ConfigManager},
    error::CliError,
    generate,
};

#[derive(Parser)]
#[command(name = "astgen")]
#[command(author, version, about = "Generate AST node type definitions from a schema", long_about = None)]
struct Cli {
    /// Directory the generated files are written to (must exist)
    output_dir: PathBuf,

    /// Schema file (.toml or .json)
    #[arg(short, long, value_name = "PATH")]
    schema: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Target dialect (cpp, rust)
    #[arg(short, long)]
    dialect: Option<DialectKind>,

    /// Skeleton file replacing the built-in one
    #[arg(long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Print generated files instead of writing them
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Verify that the files on disk are up to date
    #[arg(long)]
    check: bool,

    /// Raise the log level (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let error = CliError::Usage(e.render().to_string());
            eprint!("{error}");
            return ExitCode::from(error.exit_code());
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("astgen={level},astgen_cli={level}"))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ConfigManager::load(cli.config.as_deref())?;
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            schema: cli.schema,
            dialect: cli.dialect,
            template: cli.template,
        },
    );

    let mode = if cli.dry_run {
        EmitMode::DryRun
    } else if cli.check {
        EmitMode::Check
    } else {
        EmitMode::Write
    };

    if mode != EmitMode::DryRun {
        println!(
            "{} {} ({})",
            "Generating from".cyan(),
            config.schema.path.display(),
            config.output.dialect
        );
    }

    let results = generate::run(&config, &cli.output_dir, mode)?;
    for result in &results {
        report(result);
    }

    if mode == EmitMode::Check {
        generate::ensure_up_to_date(&results)?;
        println!("{} Generated files are up to date", "✓".green());
    }

    Ok(())
}

/// Print the outcome for one file.
fn report(result: &WriteResult) {
    match result {
        WriteResult::Written { path, bytes } => {
            println!(
                "{} Written {} bytes to {}",
                "✓".green(),
                bytes,
                path.display()
            );
        }
        WriteResult::DryRun { content, path } => {
            println!("{} Would write to {}:", "[dry-run]".yellow(), path.display());
            println!("{}", "─".repeat(60).dimmed());
            println!("{}", content);
            println!("{}", "─".repeat(60).dimmed());
        }
        WriteResult::UpToDate { path } => {
            println!("{} {}", "✓".green(), path.display());
        }
        WriteResult::Stale { path } => {
            println!("{} {} is out of date", "✗".red(), path.display());
        }
        WriteResult::Missing { path } => {
            println!("{} {} is missing", "✗".red(), path.display());
        }
    }
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
