//! typediagram CLI - Deterministic Mermaid class diagrams with drift checks

mod commands;

use clap::{Parser, Subcommand};
use commands::EmitArgs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use typediagram::output::{OutputMode, report_json_error};
use typediagram::toggle::DEFAULT_PACKAGE_VERSION;

#[derive(Parser)]
#[command(name = "typediagram")]
#[command(version)]
#[command(about = "Deterministic Mermaid class diagrams from a codebase's type graph")]
#[command(long_about = r#"
typediagram renders the types of a build unit or a whole solution as a
Mermaid classDiagram. Output is byte-identical across runs, so committed
diagrams can be checked for drift in CI.

Example usage:
  typediagram emit Shop.solution.toml --direction TB
  typediagram diff docs/Shop.mmd build/Shop.mmd
  typediagram install && typediagram status
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the nearest typediagram.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (human, json)
    #[arg(long, global = true, default_value = "human")]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a diagram for a unit (.symbols.json) or solution (.solution.toml)
    Emit {
        /// Path to the unit or solution descriptor
        path: PathBuf,

        /// Output file (defaults to <stem>.mmd next to the descriptor)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Layout direction: LR, TB, BT or RL
        #[arg(short, long)]
        direction: Option<String>,

        /// Lowest accessibility to include: public, internal, protected or private
        #[arg(long)]
        min_access: Option<String>,
    },

    /// Compare two diagrams byte for byte
    Diff {
        /// Committed diagram
        old: PathBuf,

        /// Freshly generated diagram
        new: PathBuf,
    },

    /// Add the build package to the repo-wide typediagram.toml
    Install {
        /// Package version to pin
        #[arg(long, default_value = DEFAULT_PACKAGE_VERSION)]
        version: String,
    },

    /// Enable generation (repo-wide, --solution, or --project)
    Enable {
        /// Apply to every unit of the solution in the current directory
        #[arg(long)]
        solution: bool,

        /// Apply to a single unit descriptor
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Disable generation (repo-wide, --solution, or --project)
    Disable {
        /// Apply to every unit of the solution in the current directory
        #[arg(long)]
        solution: bool,

        /// Apply to a single unit descriptor
        #[arg(long)]
        project: Option<PathBuf>,
    },

    /// Show install and enablement state
    Status,

    /// Remove the build package from typediagram.toml
    Uninstall,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = cli.format;
    let command_name = match &cli.command {
        Commands::Emit { .. } => "emit",
        Commands::Diff { .. } => "diff",
        Commands::Install { .. } => "install",
        Commands::Enable { .. } => "enable",
        Commands::Disable { .. } => "disable",
        Commands::Status => "status",
        Commands::Uninstall => "uninstall",
    };

    let result = match cli.command {
        Commands::Emit {
            path,
            out,
            direction,
            min_access,
        } => commands::run_emit(
            output_mode,
            cli.config.as_deref(),
            EmitArgs {
                path,
                out,
                direction,
                min_access,
            },
        ),
        Commands::Diff { old, new } => commands::run_diff(output_mode, &old, &new),
        Commands::Install { version } => commands::run_install(output_mode, &version),
        Commands::Enable { solution, project } => {
            commands::run_toggle(output_mode, true, solution, project.as_deref())
        }
        Commands::Disable { solution, project } => {
            commands::run_toggle(output_mode, false, solution, project.as_deref())
        }
        Commands::Status => commands::run_status(output_mode),
        Commands::Uninstall => commands::run_uninstall(output_mode),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            if output_mode.is_human() {
                typediagram::ui::error(&format!("{:#}", e));
            } else {
                report_json_error(command_name, &format!("{:#}", e));
            }
            ExitCode::from(commands::EXIT_FAILURE)
        }
    }
}
