use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use starfeed::config::{default_config_path, Config};
use starfeed::feed::{opml, osmos};

#[derive(Parser, Debug)]
#[command(
    name = "starfeed",
    version,
    about = "Generate release feeds for your GitHub starred repositories"
)]
#[command(group(ArgGroup::new("format").required(true).args(["osmos", "opml"])))]
struct Args {
    /// Write an osmosfeed config (osmosfeed.yaml)
    #[arg(long)]
    osmos: bool,

    /// Write an OPML file (feed.opml)
    #[arg(long)]
    opml: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Config file (default: ~/.config/starfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file (default depends on the format)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Requests per second, overrides the config file
    #[arg(long, value_name = "R")]
    rate_limit: Option<f64>,

    /// Don't read or write the on-disk response cache
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --debug; logs go to stderr
    let default_filter = if args.debug {
        "warn,starfeed=debug"
    } else {
        "warn,starfeed=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match args.config.clone() {
        Some(path) => Some(path),
        None => default_config_path(),
    };
    let mut config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => Config::default(),
    };

    if let Some(rate) = args.rate_limit {
        config.rate_limit = rate;
    }
    if args.no_cache {
        config.cache_enabled = false;
    }
    tracing::debug!(?config, "Effective configuration");

    let token = config.resolve_token();
    let records = starfeed::run(&config, token).await?;

    if args.osmos {
        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(osmos::DEFAULT_OSMOS_FILE));
        osmos::export_to_file(&records, &path)?;
        println!("Wrote {} feeds to {}", records.len(), path.display());
    } else {
        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(opml::DEFAULT_OPML_FILE));
        opml::export_to_file(&records, &path)?;
        println!("Wrote {} feeds to {}", records.len(), path.display());
    }

    Ok(())
}
