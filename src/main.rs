use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quotadoc::cli::Overrides;
use quotadoc::cli::commands::{self, reset::ResetScope, run::RunOptions};

#[derive(Parser)]
#[command(name = "quotadoc")]
#[command(
    version,
    about = "Resumable, quota-aware documentation generator for source trees"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project config file (default: .quotadoc/config.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

impl Format {
    fn as_str(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize quotadoc in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Document pending source files within today's quota
    Run {
        #[arg(long, help = "Source root to scan")]
        root: Option<PathBuf>,
        #[arg(long, short, help = "Output directory for generated Markdown")]
        output: Option<PathBuf>,
        #[arg(long, help = "Daily attempt cap override")]
        cap: Option<u32>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long = "dry-run", help = "List pending items and quota without calling the API")]
        dry_run: bool,
    },

    /// Show quota usage and progress
    Status {
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Clear persisted progress
    Reset {
        #[arg(long, help = "Remove the whole progress file")]
        all: bool,
        #[arg(long, help = "Clear per-item failure counters")]
        failures: bool,
        #[arg(long, help = "Reset today's attempt counter")]
        quota: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mquotadoc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Run {
            root,
            output,
            cap,
            model,
            dry_run,
        } => {
            commands::run::run(
                config,
                RunOptions {
                    overrides: Overrides {
                        root,
                        output,
                        cap,
                        model,
                    },
                    dry_run,
                },
            )?;
        }
        Commands::Status { format } => {
            commands::status::run(config, format.as_str())?;
        }
        Commands::Reset {
            all,
            failures,
            quota,
        } => {
            commands::reset::run(
                config,
                ResetScope {
                    all,
                    failures,
                    quota,
                },
            )?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(config, format.as_str())?;
            }
            ConfigAction::Path => {
                commands::config::path(config)?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
