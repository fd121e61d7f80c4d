// src/main.rs

use anyhow::{Context, Result};
use aurum::aur::{AurClient, MetadataCache};
use aurum::config::Config;
use aurum::db::{PackageDatabase, PacmanDatabase};
use aurum::resolver::{self, ConflictMap};
use aurum::rpc::RpcClient;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "aurum")]
#[command(author, version, about = "AUR helper core: metadata queries and conflict analysis", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "/etc/aurum.toml")]
    config: PathBuf,

    /// Override the AUR host
    #[arg(long, global = true)]
    aur_host: Option<String>,

    /// Override the pacman database directory
    #[arg(short, long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show AUR records for packages
    Info {
        /// Package names
        #[arg(required = true)]
        names: Vec<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search the AUR by name and description
    ///
    /// Packages must match every term. Without terms the whole catalog is listed.
    Search {
        /// Search terms
        terms: Vec<String>,
        /// Match terms against package names only
        #[arg(long)]
        names_only: bool,
    },
    /// Enumerate every package in the AUR
    Catalog,
    /// Show conflicts for a prospective transaction
    Conflicts {
        /// Sync repository package to install
        #[arg(long = "repo", value_name = "NAME")]
        repo: Vec<String>,
        /// AUR package to install
        #[arg(long = "aur", value_name = "NAME")]
        aur: Vec<String>,
    },
    /// Show installed packages that sync packages replace
    Replacements,
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: clap_complete::Shell,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    if let Some(host) = &cli.aur_host {
        config.aur.host = host.clone();
    }
    if let Some(db_path) = &cli.db_path {
        config.pacman.db_path = db_path.clone();
    }

    config.validate()?;
    Ok(config)
}

fn aur_client(config: &Config) -> Result<AurClient<RpcClient>> {
    let transport = RpcClient::new(&config.aur)?;
    Ok(
        AurClient::new(transport, Arc::new(MetadataCache::new()))
            .with_limits(config.aur.info_batch_size, config.aur.catalog_concurrency),
    )
}

fn print_map(map: &ConflictMap, separator: &str) {
    for (name, others) in map {
        println!("{} {} {}", name, separator, others.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "aurum", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Info { names, json } => {
            let aur = aur_client(&config)?;
            let result = aur.lookup_by_names(&names[..]).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result.found)?);
            } else {
                for pkg in &result.found {
                    println!("Name        : {}", pkg.name);
                    println!("Version     : {}", pkg.version);
                    println!(
                        "Description : {}",
                        pkg.description.as_deref().unwrap_or("None")
                    );
                    println!(
                        "Maintainer  : {}",
                        pkg.maintainer.as_deref().unwrap_or("None")
                    );
                    println!("Votes       : {}", pkg.num_votes);
                    let base = pkg.package_base.as_deref().unwrap_or(&pkg.name);
                    println!("Git Clone   : {}", aur.package_source_url(base));
                    println!();
                }
            }

            for name in &result.not_found {
                eprintln!("Package not found in the AUR: {}", name);
            }
            Ok(())
        }
        Commands::Search { terms, names_only } => {
            let aur = aur_client(&config)?;
            let mut results = aur.search_all(&terms[..], names_only).await?;
            // Most voted and most popular first
            results.sort_by(|a, b| {
                let rank = |pkg: &aurum::aur::AurPackage| {
                    (pkg.num_votes as f64 + 1.0) * (pkg.popularity + 1.0)
                };
                rank(b).total_cmp(&rank(a)).then_with(|| a.name.cmp(&b.name))
            });

            for pkg in &results {
                println!("aur/{} {}", pkg.name, pkg.version);
                if let Some(description) = &pkg.description {
                    println!("    {}", description);
                }
            }
            Ok(())
        }
        Commands::Catalog => {
            let aur = aur_client(&config)?;
            let catalog = aur.list_catalog().await?;
            println!("{} packages in the AUR", catalog.len());
            Ok(())
        }
        Commands::Conflicts { repo, aur: aur_names } => {
            let db = PacmanDatabase::open(&config.pacman)?;
            let aur = aur_client(&config)?;

            let mut repo_packages = Vec::with_capacity(repo.len());
            for name in &repo {
                let pkg = db
                    .repo_packages()
                    .get(name)
                    .with_context(|| format!("Package {} not found in any repository", name))?;
                repo_packages.push(pkg.clone());
            }

            let conflicts = resolver::find_conflicts(&db, &aur, &repo_packages, &aur_names).await?;
            info!("{} packages have conflicts", conflicts.len());
            if conflicts.is_empty() {
                println!("No conflicts");
            } else {
                print_map(&conflicts, "conflicts with");
            }
            Ok(())
        }
        Commands::Replacements => {
            let db = PacmanDatabase::open(&config.pacman)?;
            let replacements = resolver::find_replacements(&db)?;
            if replacements.is_empty() {
                println!("No replacements");
            } else {
                print_map(&replacements, "replaces");
            }
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}
