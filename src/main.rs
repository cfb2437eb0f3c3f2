//! Binary entrypoint for the hivlearn CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `modules [--user <id>]` - show the module list with unlock state
//! - `complete --user <id> --module <id> --score <0-100>` - record a quiz result
//! - `quiz --user <id> --module <id> --correct <n> --total <m>` - score and record a quiz
//! - `status --user <id>` - print overall progress
//!
//! See the library crate docs for module-level details: `hivlearn::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info};

use hivlearn::config::Config;
use hivlearn::progress::{
    ActivityOutcome, ModuleViewState, ProgressError, ProgressionEngine, SledProgressStore,
    PASS_THRESHOLD,
};

#[derive(Parser)]
#[command(name = "hivlearn")]
#[command(about = "Module progression for the HIV/AIDS awareness program")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show modules and their unlock state
    Modules {
        /// Signed-in user id; omit for the anonymous view
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Record a finished quiz with a percentage score
    Complete {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        module: String,
        #[arg(short, long)]
        score: u32,
    },
    /// Score a quiz from its answer tally and record it
    Quiz {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        module: String,
        #[arg(long)]
        correct: u32,
        #[arg(long)]
        total: u32,
    },
    /// Show overall progress for a user
    Status {
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    let catalog = Arc::new(config.progression.load_catalog()?);
    let db_path = config.storage.progress_db_path();
    let store = Arc::new(SledProgressStore::open(&db_path)?);
    info!(
        "{}: {} modules, progress at {}",
        config.app.name,
        catalog.len(),
        db_path.display()
    );
    let engine = ProgressionEngine::new(catalog, store);

    let result = match cli.command {
        Commands::Init => Ok(()),
        Commands::Modules { user } => engine
            .load_progression(user.as_deref())
            .await
            .map(|view| print_modules(&view)),
        Commands::Complete {
            user,
            module,
            score,
        } => complete(&engine, &user, &module, score).await,
        Commands::Quiz {
            user,
            module,
            correct,
            total,
        } => {
            let Some(outcome) = ActivityOutcome::quiz(correct, total) else {
                anyhow::bail!("quiz for {} has no questions; nothing recorded", module);
            };
            let score = outcome.score().map(u32::from).unwrap_or(0);
            println!("Quiz score: {}% ({}/{})", score, correct.min(total), total);
            complete(&engine, &user, &module, score).await
        }
        Commands::Status { user } => {
            engine.load_progression(Some(user.as_str())).await.map(|_| {
                if let Some(summary) = engine.summary() {
                    println!(
                        "{} of {} modules completed ({}%), {} passed",
                        summary.completed, summary.total, summary.percent_complete, summary.passed
                    );
                    match summary.next_module {
                        Some(next) => println!("Next module: {}", next),
                        None => println!("No open modules left."),
                    }
                }
            })
        }
    };

    if let Err(e) = result {
        if e.is_retryable() {
            error!("{} (try again later)", e);
        } else {
            error!("{}", e);
        }
        return Err(e.into());
    }
    Ok(())
}

async fn complete(
    engine: &ProgressionEngine,
    user: &str,
    module: &str,
    score: u32,
) -> Result<(), ProgressError> {
    engine.load_progression(Some(user)).await?;
    let view = engine.record_completion(Some(user), module, score).await?;
    if score >= u32::from(PASS_THRESHOLD) {
        println!("Passed {} with {}%.", module, score);
    } else {
        println!(
            "Recorded {}% on {}; {}% is needed to open the next module.",
            score, module, PASS_THRESHOLD
        );
    }
    print_modules(&view);
    Ok(())
}

fn print_modules(view: &[ModuleViewState]) {
    for module in view {
        let score = if module.completed {
            format!("{:>3}%", module.score)
        } else {
            "   -".to_string()
        };
        println!(
            "{:>2}. {:<28} {:<9} {}",
            module.order,
            module.id,
            module.stage().label(),
            score
        );
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });
    let security_path = config
        .as_ref()
        .and_then(|cfg| cfg.logging.security_file.clone());

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if record.target() == "security" {
                    append_security_line(security_path.as_deref(), &line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if record.target() == "security" {
                    append_security_line(security_path.as_deref(), &line);
                }
                writeln!(fmt, "{}", line)
            });
        }
    }
    let _ = builder.try_init();
}

/// Mirror a security record to the dedicated security log, if one is configured.
fn append_security_line(path: Option<&str>, line: &str) {
    use std::io::Write;
    let Some(path) = path else {
        return;
    };
    if let Ok(mut sf) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        let _ = writeln!(sf, "{}", line);
    }
}
