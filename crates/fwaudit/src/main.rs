use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use fwaudit_core::{Analyzer, Config};
use fwaudit_report::text;

mod refresh;

#[derive(Parser)]
#[command(name = "fwaudit")]
#[command(about = "Audit firmware release packages and keep release profile snapshots fresh")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh every configured {folder, snapshot} task pair
    Run {
        /// Config file path (defaults to fwaudit.toml in the working directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Refresh one release folder against one snapshot file
    Refresh {
        /// Folder containing release packages
        folder: PathBuf,
        /// Snapshot file (.json or .xml)
        snapshot: PathBuf,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Analyze a single package and print its release profile
    Analyze {
        /// Package archive to analyze
        package: PathBuf,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Export a snapshot file or a release folder to another format
    Export {
        /// Snapshot file (.json or .xml) or folder of release packages
        source: PathBuf,
        /// Output file (.txt, .json, .xml, .htm, or .html)
        output: PathBuf,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default fwaudit.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config } => cmd_run(config.as_deref()),
        Commands::Refresh {
            folder,
            snapshot,
            config,
        } => cmd_refresh(&folder, &snapshot, config.as_deref()),
        Commands::Analyze { package, config } => cmd_analyze(&package, config.as_deref()),
        Commands::Export {
            source,
            output,
            config,
        } => cmd_export(&source, &output, config.as_deref()),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn cmd_run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    if config.tasks.is_empty() {
        anyhow::bail!("no tasks configured. Add [[tasks]] entries to fwaudit.toml");
    }
    let analyzer = Analyzer::new(&config);
    // Task pairs are independent units of work; image mounts inside them
    // still serialize on the global mount slot.
    let failures: Vec<String> = config
        .tasks
        .par_iter()
        .filter_map(|task| {
            match refresh::refresh(&task.folder, &task.snapshot, &analyzer, &config) {
                Ok(collection) => {
                    println!(
                        "{} {} -> {} ({} releases)",
                        "OK".green().bold(),
                        task.folder.display(),
                        task.snapshot.display(),
                        collection.len()
                    );
                    None
                }
                Err(e) => {
                    println!(
                        "{} {} -> {}: {e:#}",
                        "FAILED".red().bold(),
                        task.folder.display(),
                        task.snapshot.display()
                    );
                    Some(task.folder.display().to_string())
                }
            }
        })
        .collect();
    if !failures.is_empty() {
        eprintln!("{} of {} tasks failed", failures.len(), config.tasks.len());
        process::exit(1);
    }
    Ok(())
}

fn cmd_refresh(folder: &Path, snapshot: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let analyzer = Analyzer::new(&config);
    match refresh::refresh(folder, snapshot, &analyzer, &config) {
        Ok(collection) => {
            println!(
                "{} {} releases -> {}",
                "OK".green().bold(),
                collection.len(),
                snapshot.display()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e:#}", "FAILED".red().bold());
            process::exit(1);
        }
    }
}

fn cmd_analyze(package: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let analyzer = Analyzer::new(&config);
    match analyzer.analyze(package) {
        Ok(release) => {
            print!("{}", text::format_release(&release));
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e:#}", "FAILED".red().bold());
            process::exit(1);
        }
    }
}

fn cmd_export(source: &Path, output: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let analyzer = Analyzer::new(&config);
    let collection = refresh::import_any(source, &analyzer, &config)?;
    fwaudit_report::export(&collection, output, &config)?;
    println!(
        "{} {} releases -> {}",
        "OK".green().bold(),
        collection.len(),
        output.display()
    );
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from("fwaudit.toml");
    if target.exists() && !force {
        anyhow::bail!("fwaudit.toml already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created fwaudit.toml with default configuration.");
    Ok(())
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(Path::new("."))),
    }
}
