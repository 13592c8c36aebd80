// src/main.rs

//! `tacqubo` command line: compile, submit or locally solve a strategy file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tacqubo::{expand, CompiledQubo, Compiler, QuboReply, Settings, Solver};

/// Top-level CLI parser for the `tacqubo` binary.
#[derive(Debug, Parser)]
#[command(name = "tacqubo", version, about = "Compile tic-tac-toe strategies into QUBO problems")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./tacqubo.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the QUBO document a strategy compiles to
    Compile {
        /// Strategy source file
        file: PathBuf,
    },
    /// Compile a strategy and POST the document to the solver endpoint
    Submit {
        /// Strategy source file
        file: PathBuf,
        /// Override `solver.endpoint`
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Compile a strategy, expand it and solve it locally
    Solve {
        /// Strategy source file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("tacqubo error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Commands::Submit { endpoint: Some(endpoint), .. } = &cli.command {
        settings.solver.endpoint = endpoint.clone();
    }
    tacqubo::init(settings).context("failed to install settings")?;
    let compiler = Compiler::from_runtime();

    match &cli.command {
        Commands::Compile { file } => {
            let compilation = compiler.compile(&read_source(file)?);
            println!("{}", compilation.document.to_json_pretty()?);
            if let Some(reason) = &compilation.fallback {
                eprintln!("note: using the default document ({reason})");
            }
        }
        Commands::Submit { file, .. } => {
            let source = read_source(file)?;
            let (compilation, reply) = compiler
                .compile_and_submit(&source)
                .await
                .with_context(|| format!("failed to submit to {}", compiler.settings().solver.endpoint))?;
            if let Some(reason) = &compilation.fallback {
                eprintln!("note: submitted the default document ({reason})");
            }
            if let Ok(parsed) = QuboReply::from_value(&reply) {
                if let Some(error) = parsed.explanation.as_ref().and_then(|e| e.user_qubo_error.as_ref()) {
                    eprintln!("note: solver used its fallback QUBO ({error})");
                }
            }
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Solve { file } => {
            let compilation = compiler.compile(&read_source(file)?);
            if let Some(reason) = &compilation.fallback {
                eprintln!("note: solving the default document ({reason})");
            }
            let local = &compiler.settings().local;
            let qubo = expand(&compilation.document, local.penalty).unwrap_or_else(|error| {
                tracing::warn!(%error, "expansion failed, solving the fallback board QUBO");
                CompiledQubo::fallback()
            });
            let result = Solver::from_settings(local).solve(&qubo)?;
            print!("{result}");
        }
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Settings::load().context("failed to load configuration"),
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read strategy {}", path.display()))
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TACQUBO_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tacqubo",
            "submit",
            "strategy.js",
            "--endpoint",
            "http://127.0.0.1:9000/quantum",
            "-v",
        ])
        .expect("cli should parse");

        assert!(cli.verbose);
        assert!(!cli.quiet);
        match cli.command {
            Commands::Submit { file, endpoint } => {
                assert_eq!(file.to_str(), Some("strategy.js"));
                assert_eq!(endpoint.as_deref(), Some("http://127.0.0.1:9000/quantum"));
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn config_path_is_global() {
        let cli = Cli::try_parse_from(["tacqubo", "--config", "alt.toml", "solve", "s.js"])
            .expect("cli should parse");
        assert_eq!(cli.config.as_deref().and_then(|p| p.to_str()), Some("alt.toml"));
        assert!(matches!(cli.command, Commands::Solve { .. }));
    }
}
