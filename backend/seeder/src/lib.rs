//! # Seeding
//!
//! Fills the seeded game pool ahead of time so players can start a known game
//! without waiting on a live walk.
//!
//! 1. Walk the live link graph `count` times with the same walker the server uses.
//! 2. Store every finished walk as a seeded game under the chosen category.
//! 3. A failed walk is logged and skipped. The run reports how many seeds landed.
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use server::{
    database::Store,
    seeds::{Category, create_seeded_game},
};
use tracing::warn;
use wiki::Walker;

pub async fn load_seeds(
    walker: &Walker,
    store: &dyn Store,
    count: u32,
    category: Category,
) -> Result<u32> {
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut stored = 0;

    for _ in 0..count {
        pb.set_message(format!("Walking, {stored} stored"));

        match walker.generate().await {
            Ok(spec) => {
                let seed = create_seeded_game(store, spec, category).await?;
                pb.println(format!(
                    "{} -> {} ({} steps)",
                    seed.starting_article_url, seed.ending_article_url, seed.min_steps
                ));
                stored += 1;
            }
            Err(e) => warn!("Walk failed, skipping: {e}"),
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok(stored)
}
