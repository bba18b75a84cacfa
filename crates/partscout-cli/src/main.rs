use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use partscout_client::{ReqwestFetcher, VendorAdapter, build_aggregator};
use partscout_core::models::ComponentQuery;
use partscout_core::pacing::{IdentityPolicy, PacingConfig, PacingController};
use partscout_core::{AggregateResult, Aggregator, QueryResponder};

#[derive(Parser)]
#[command(name = "partscout", version, about = "Look up component prices across vendors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every vendor for a part and print the reply blocks
    Search {
        /// Part name or model number (e.g. "M12-5P")
        query: String,

        /// Maximum characters per reply block
        #[arg(
            long,
            env = "PARTSCOUT_MAX_BLOCK_CHARS",
            default_value_t = partscout_core::DEFAULT_MAX_BLOCK_CHARS
        )]
        max_block_size: usize,

        /// Minimum pause between vendor requests, in milliseconds
        #[arg(long, env = "PARTSCOUT_DELAY_MIN_MS", default_value_t = 2000)]
        delay_min_ms: u64,

        /// Maximum pause between vendor requests, in milliseconds
        #[arg(long, env = "PARTSCOUT_DELAY_MAX_MS", default_value_t = 5000)]
        delay_max_ms: u64,

        /// Skip the pauses between vendors
        #[arg(long, default_value_t = false)]
        no_delay: bool,

        /// Use a different browser identity for every vendor
        #[arg(long, default_value_t = false)]
        rotate_identity: bool,

        /// Seed for identity and delay selection (reproducible runs)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the raw results as JSON instead of reply blocks
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the configured vendors in query order
    Vendors,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("partscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            max_block_size,
            delay_min_ms,
            delay_max_ms,
            no_delay,
            rotate_identity,
            seed,
            json,
        } => {
            let mut pacing = if no_delay {
                PacingConfig::disabled()
            } else {
                PacingConfig::new(
                    Duration::from_millis(delay_min_ms),
                    Duration::from_millis(delay_max_ms),
                )
            };
            if rotate_identity {
                pacing = pacing.with_identity(IdentityPolicy::PerCall);
            }
            if let Some(seed) = seed {
                pacing = pacing.with_seed(seed);
            }
            pacing.validate().map_err(|e| anyhow::anyhow!(e))?;

            if max_block_size == 0 {
                anyhow::bail!("--max-block-size must be at least 1");
            }

            cmd_search(&query, pacing, max_block_size, json).await?;
        }
        Commands::Vendors => cmd_vendors()?,
    }

    Ok(())
}

async fn cmd_search(raw: &str, pacing: PacingConfig, max_block_size: usize, json: bool) -> Result<()> {
    if json {
        let Ok(query) = ComponentQuery::parse(raw) else {
            println!("{}", partscout_core::QUERY_PROMPT);
            return Ok(());
        };
        let aggregator = aggregator(pacing)?;
        tracing::info!("Searching {} vendors for \"{}\"", aggregator.vendors().len(), query);

        let result = aggregator.search(&query).await;
        print_summary(&result);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let blocks = search_blocks(raw, pacing, max_block_size).await?;
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            println!("\n{}\n", "-".repeat(40));
        }
        println!("{block}");
    }

    Ok(())
}

/// Reply blocks for `raw`, exactly as a chat user would receive them.
async fn search_blocks(raw: &str, pacing: PacingConfig, max_block_size: usize) -> Result<Vec<String>> {
    let responder = QueryResponder::new(aggregator(pacing)?).with_max_block_size(max_block_size);
    Ok(responder.respond(raw).await)
}

fn aggregator(pacing: PacingConfig) -> Result<Aggregator<VendorAdapter<ReqwestFetcher>>> {
    let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
    build_aggregator(fetcher, PacingController::new(pacing)).map_err(|e| anyhow::anyhow!(e))
}

fn print_summary(result: &AggregateResult) {
    let failures = result.len() - result.listing_count();
    tracing::info!(
        "{} listing(s), {} vendor failure(s) for \"{}\"",
        result.listing_count(),
        failures,
        result.query
    );
}

fn cmd_vendors() -> Result<()> {
    let aggregator = aggregator(PacingConfig::default())?;

    for (i, vendor) in aggregator.vendors().iter().enumerate() {
        println!("{:>2}. {vendor}", i + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "partscout",
            "search",
            "M12-5P",
            "--no-delay",
            "--seed",
            "7",
            "--max-block-size",
            "500",
        ])
        .unwrap();

        let Commands::Search {
            query,
            no_delay,
            seed,
            max_block_size,
            json,
            ..
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(query, "M12-5P");
        assert!(no_delay);
        assert_eq!(seed, Some(7));
        assert_eq!(max_block_size, 500);
        assert!(!json);
    }

    #[tokio::test]
    async fn blank_query_prints_prompt() {
        let blocks = search_blocks("   ", PacingConfig::disabled(), 1800).await.unwrap();
        assert_eq!(blocks, vec![partscout_core::QUERY_PROMPT.to_string()]);
    }

    #[test]
    fn search_requires_query() {
        assert!(Cli::try_parse_from(["partscout", "search"]).is_err());
    }
}
