use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use server::{database::init_redis, seeds::Category};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use wiki::{WikiClient, Walker, article::DEFAULT_ARTICLE_BASE, models::DEFAULT_API_URL};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of walks to attempt.
    count: u32,

    #[arg(long, default_value_t = Category::Random)]
    category: Category,

    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    #[arg(long, env = "WIKI_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "WIKI_ARTICLE_BASE", default_value = DEFAULT_ARTICLE_BASE)]
    article_base: String,

    #[arg(long, env = "WIKI_HTTP_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,

    #[arg(long, default_value_t = 3)]
    min_steps: u32,

    #[arg(long, default_value_t = 5)]
    max_steps: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let store = init_redis(&args.redis_url).await?;
    let client = WikiClient::new(
        &args.api_url,
        &args.article_base,
        Duration::from_millis(args.timeout_ms),
    )?;
    let walker = Walker::new(Arc::new(client)).with_steps(args.min_steps, args.max_steps);

    let stored = seeder::load_seeds(&walker, &store, args.count, args.category).await?;
    info!("Stored {stored} of {} seeded games", args.count);

    Ok(())
}
