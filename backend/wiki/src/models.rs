use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

pub const LINKS_PARAMS: [(&str, &str); 7] = [
    ("action", "query"),
    ("format", "json"),
    ("formatversion", "2"),
    ("prop", "links"),
    ("pllimit", "max"),
    ("redirects", "1"),
    ("origin", "*"),
];

pub const RANDOM_PARAMS: [(&str, &str); 6] = [
    ("action", "query"),
    ("format", "json"),
    ("formatversion", "2"),
    ("list", "random"),
    ("rnnamespace", "0"),
    ("rnlimit", "1"),
];

#[derive(Deserialize)]
pub struct Response<Q> {
    #[serde(rename = "continue")]
    pub continuation: Option<BTreeMap<String, Value>>,
    pub query: Option<Q>,
    pub error: Option<ApiError>,
}

#[derive(Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Deserialize)]
pub struct LinksQuery {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Deserialize)]
pub struct Page {
    pub title: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
}

#[derive(Deserialize)]
pub struct Link {
    pub title: String,
}

#[derive(Deserialize)]
pub struct RandomQuery {
    #[serde(default)]
    pub random: Vec<RandomPage>,
}

#[derive(Deserialize)]
pub struct RandomPage {
    pub title: String,
}

/// Continuation values are echoed back verbatim as query parameters.
pub fn continuation_params(continuation: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    continuation
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
