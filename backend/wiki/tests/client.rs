use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiki::{ArticleRef, LinkFilter, LinkSource, WikiClient, WikiError};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn fake_api(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().unwrap().push(params.clone());

    if params.get("list").map(String::as_str) == Some("random") {
        return Json(json!({
            "batchcomplete": true,
            "query": { "random": [{ "id": 1, "ns": 0, "title": "Albert Einstein" }] }
        }));
    }

    let title = params.get("titles").cloned().unwrap_or_default();
    let continued = params.contains_key("plcontinue");

    let body = match (title.as_str(), continued) {
        ("Photon", false) => json!({
            "continue": { "plcontinue": "23535|0|Light", "continue": "||" },
            "query": { "pages": [{
                "pageid": 23535, "ns": 0, "title": "Photon",
                "links": [
                    { "ns": 0, "title": "Electron" },
                    { "ns": 0, "title": "List of particles" },
                    { "ns": 14, "title": "Category:Physics" }
                ]
            }]}
        }),
        ("Photon", true) => json!({
            "batchcomplete": true,
            "query": { "pages": [{
                "pageid": 23535, "ns": 0, "title": "Photon",
                "links": [
                    { "ns": 0, "title": "Light" },
                    { "ns": 10, "title": "Template:Physics" }
                ]
            }]}
        }),
        ("Loop", _) => json!({
            "continue": { "plcontinue": "1|0|Same", "continue": "||" },
            "query": { "pages": [{ "ns": 0, "title": "Loop", "links": [] }] }
        }),
        ("Nowhere", _) => json!({
            "batchcomplete": true,
            "query": { "pages": [{ "ns": 0, "title": "Nowhere", "missing": true }] }
        }),
        ("Bad[title]", _) => json!({
            "query": { "pages": [{ "title": "Bad[title]", "invalid": true }] }
        }),
        _ => json!({
            "error": { "code": "internal_api_error", "info": "Something broke" }
        }),
    };

    Json(body)
}

async fn spawn_fake() -> (WikiClient, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/w/api.php", get(fake_api))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = WikiClient::new(
        &format!("http://{address}/w/api.php"),
        "https://en.wikipedia.org",
        Duration::from_secs(5),
    )
    .unwrap();

    (client, seen)
}

#[tokio::test]
async fn test_links_union_every_page() {
    let (client, seen) = spawn_fake().await;

    let links = client
        .outgoing_links(&ArticleRef::wikipedia("Photon"))
        .await
        .unwrap();

    let titles: Vec<String> = links.iter().map(|l| l.title().unwrap()).collect();
    assert_eq!(
        titles,
        [
            "Electron",
            "List of particles",
            "Category:Physics",
            "Light",
            "Template:Physics"
        ]
    );

    let filter = LinkFilter::default();
    let allowed: Vec<String> = links
        .iter()
        .filter(|l| filter.allows(l))
        .map(|l| l.title().unwrap())
        .collect();
    assert_eq!(allowed, ["Electron", "Light"]);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].get("titles").unwrap(), "Photon");
    assert!(!seen[0].contains_key("plcontinue"));
    assert_eq!(seen[1].get("plcontinue").unwrap(), "23535|0|Light");
    assert_eq!(seen[1].get("continue").unwrap(), "||");
    assert_eq!(seen[1].get("pllimit").unwrap(), "max");
}

#[tokio::test]
async fn test_random_article() {
    let (client, _) = spawn_fake().await;

    let article = client.random_article().await.unwrap();

    assert_eq!(
        article.as_str(),
        "https://en.wikipedia.org/wiki/Albert_Einstein"
    );
}

#[tokio::test]
async fn test_missing_page_has_no_links() {
    let (client, _) = spawn_fake().await;

    let links = client
        .outgoing_links(&ArticleRef::wikipedia("Nowhere"))
        .await
        .unwrap();

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_repeated_continuation_is_an_error() {
    let (client, seen) = spawn_fake().await;

    let result = client.outgoing_links(&ArticleRef::wikipedia("Loop")).await;

    assert!(matches!(result, Err(WikiError::UpstreamUnavailable(_))));
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_api_errors_surface() {
    let (client, _) = spawn_fake().await;

    let broken = client.outgoing_links(&ArticleRef::wikipedia("Broken")).await;
    let invalid = client
        .outgoing_links(&ArticleRef::wikipedia("Bad[title]"))
        .await;
    let malformed = client
        .outgoing_links(&ArticleRef::new("https://en.wikipedia.org/"))
        .await;

    assert!(matches!(broken, Err(WikiError::UpstreamUnavailable(_))));
    assert!(matches!(invalid, Err(WikiError::MalformedReference(_))));
    assert!(matches!(malformed, Err(WikiError::MalformedReference(_))));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let client = WikiClient::new(
        "http://127.0.0.1:9/w/api.php",
        "https://en.wikipedia.org",
        Duration::from_secs(2),
    )
    .unwrap();

    let result = client.random_article().await;

    assert!(matches!(
        result,
        Err(WikiError::UpstreamUnavailable(_) | WikiError::Timeout(_))
    ));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let app = Router::new().route(
        "/w/api.php",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "batchcomplete": true }))
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = WikiClient::new(
        &format!("http://{address}/w/api.php"),
        "https://en.wikipedia.org",
        Duration::from_millis(200),
    )
    .unwrap();

    let result = client.outgoing_links(&ArticleRef::wikipedia("Photon")).await;

    assert!(matches!(result, Err(WikiError::Timeout(_))));
}
