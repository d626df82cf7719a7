//! Shapes the raw search-API payload into the response the front-end renders.

use crate::types::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Build the formatted response for `query`/`country` from the upstream JSON.
pub fn format_results(query: &str, country: &str, raw: Value) -> OsintResults {
    let mut organic_results: Vec<OrganicResult> = items(&raw, "organic_results");
    for result in organic_results.iter_mut() {
        result.source_info = SourceInfo {
            domain: domain_of(&result.link),
            favicon: result.favicon.clone(),
        };
    }

    OsintResults {
        query: query.to_string(),
        country: country.to_string(),
        search_information: object_field(&raw, "search_information"),
        organic_results,
        news_results: items(&raw, "news_results"),
        image_results: items(&raw, "images_results"),
        video_results: items(&raw, "video_results"),
        people_also_ask: items(&raw, "people_also_ask"),
        related_searches: items(&raw, "related_searches"),
        local_results: items(&raw, "local_results"),
        shopping_results: items(&raw, "shopping_results"),
        scholarly_articles: items(&raw, "scholarly_articles"),
        knowledge_graph: object_field(&raw, "knowledge_graph"),
        answer_box: object_field(&raw, "answer_box"),
        top_stories: items(&raw, "top_stories"),
        raw_data: raw,
    }
}

/// Number of organic results, recorded in the search log.
pub fn result_count(results: &OsintResults) -> usize {
    results.organic_results.len()
}

/// `search_information.total_results` when the upstream reports it as a number.
pub fn total_results(results: &OsintResults) -> Option<i64> {
    results
        .search_information
        .as_ref()
        .and_then(|info| info.get("total_results"))
        .and_then(Value::as_i64)
}

/// `search_information.time_taken_displayed`, in seconds.
pub fn search_time(results: &OsintResults) -> Option<f64> {
    results
        .search_information
        .as_ref()
        .and_then(|info| info.get("time_taken_displayed"))
        .and_then(Value::as_f64)
}

/// Host part of an `http(s)` link; empty for anything else.
pub fn domain_of(link: &str) -> String {
    if !link.starts_with("http") {
        return String::new();
    }
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

fn object_field(raw: &Value, key: &str) -> Option<Value> {
    raw.get(key).filter(|v| !v.is_null()).cloned()
}

fn items<T: DeserializeOwned>(raw: &Value, key: &str) -> Vec<T> {
    let Some(list) = raw.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping malformed {} item: {}", key, e);
                None
            }
        })
        .collect()
}
