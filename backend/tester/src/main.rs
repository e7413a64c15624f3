use std::{fs, sync::Arc, time::Duration};

use anyhow::Result;
use serde_json::json;
use wiki::{PathValidator, WikiClient, Walker};

/// Walks the live graph once, checks the walk, and writes a `validateWin` body to
/// `../claim.json` for poking at a running server.
#[tokio::main]
async fn main() -> Result<()> {
    let client = Arc::new(WikiClient::wikipedia(Duration::from_secs(10))?);
    let walker = Walker::new(client.clone());

    let walk = walker.walk().await?;
    for (index, article) in walk.path.iter().enumerate() {
        println!("{index}: {article}");
    }

    let verdict = PathValidator::new(client)
        .validate(&walk.claim(), &walk.spec)
        .await?;
    println!("Verdict: {verdict:?}");

    let body = json!({ "id": "<active game id>", "visitedUrls": walk.claim() });
    fs::write("../claim.json", serde_json::to_string_pretty(&body)?)?;

    Ok(())
}
