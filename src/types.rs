use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_country() -> String {
    "us".to_string()
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Tolerant field readers for upstream payloads: wrong-typed or null values
/// fall back to the field default instead of rejecting the whole item.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            // e.g. news `source` arrives as {"name": ..., "icon": ...}
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
    }

    pub fn position<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_country")]
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub serpapi_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Formatted search response consumed by the browser front-end.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OsintResults {
    pub query: String,
    pub country: String,
    pub search_information: Option<Value>,
    pub organic_results: Vec<OrganicResult>,
    pub news_results: Vec<NewsResult>,
    pub image_results: Vec<ImageResult>,
    pub video_results: Vec<VideoResult>,
    pub people_also_ask: Vec<PeopleAlsoAsk>,
    pub related_searches: Vec<RelatedSearch>,
    pub local_results: Vec<LocalResult>,
    pub shopping_results: Vec<ShoppingResult>,
    pub scholarly_articles: Vec<ScholarlyArticle>,
    pub knowledge_graph: Option<Value>,
    pub answer_box: Option<Value>,
    pub top_stories: Vec<TopStory>,
    /// Full upstream payload for advanced users.
    pub raw_data: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SourceInfo {
    pub domain: String,
    pub favicon: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrganicResult {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub displayed_link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub cached_page_link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub related_pages_link: String,
    /// Filled in by the formatter from `link` and `favicon`.
    #[serde(default, skip_deserializing)]
    pub source_info: SourceInfo,
    #[serde(default, skip_serializing)]
    pub favicon: Option<Value>,
    #[serde(default)]
    pub rich_snippet: Option<Value>,
    #[serde(default = "empty_array")]
    pub sitelinks: Value,
    #[serde(default)]
    pub thumbnail: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewsResult {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default)]
    pub thumbnail: Option<Value>,
    #[serde(default = "empty_array")]
    pub stories: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageResult {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub original: String,
    #[serde(default)]
    pub original_width: Option<Value>,
    #[serde(default)]
    pub original_height: Option<Value>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_product: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoResult {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub displayed_link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub platform: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PeopleAlsoAsk {
    #[serde(default, deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub displayed_link: String,
    #[serde(default)]
    pub thumbnail: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelatedSearch {
    #[serde(default, deserialize_with = "lenient::string")]
    pub query: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalResult {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub place_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub data_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub data_cid: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub reviews_link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub photos_link: String,
    #[serde(default = "empty_object")]
    pub gps_coordinates: Value,
    #[serde(default, deserialize_with = "lenient::string")]
    pub place_id_search: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub provider_id: String,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub reviews: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default = "empty_array")]
    pub types: Value,
    #[serde(default, deserialize_with = "lenient::string")]
    pub type_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub open_state: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub hours: String,
    #[serde(default = "empty_object")]
    pub operating_hours: Value,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub website: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default = "empty_object")]
    pub service_options: Value,
    #[serde(default)]
    pub thumbnail: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShoppingResult {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub product_link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub serpapi_product_api: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price: String,
    #[serde(default)]
    pub extracted_price: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub reviews: Option<Value>,
    #[serde(default = "empty_array")]
    pub extensions: Value,
    #[serde(default)]
    pub thumbnail: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub delivery: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScholarlyArticle {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub snippet: String,
    #[serde(default = "empty_object")]
    pub publication_info: Value,
    #[serde(default = "empty_array")]
    pub resources: Value,
    #[serde(default = "empty_object")]
    pub inline_links: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopStory {
    #[serde(default, deserialize_with = "lenient::position")]
    pub position: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(default)]
    pub thumbnail: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_request_defaults_country_to_us() {
        let req: SearchRequest = serde_json::from_value(json!({ "query": "acme" })).unwrap();
        assert_eq!(req.query, "acme");
        assert_eq!(req.country, "us");
    }

    #[test]
    fn search_request_tolerates_missing_query() {
        let req: SearchRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.query.is_empty());
    }

    #[test]
    fn news_source_object_is_flattened_to_name() {
        let item: NewsResult = serde_json::from_value(json!({
            "title": "Breach disclosed",
            "source": { "name": "Example Times", "icon": "https://x/icon.png" },
            "date": null
        }))
        .unwrap();
        assert_eq!(item.source, "Example Times");
        assert_eq!(item.date, "");
        assert_eq!(item.position, 0);
        assert_eq!(item.stories, json!([]));
    }

    #[test]
    fn local_result_renames_type_and_defaults_maps() {
        let item: LocalResult = serde_json::from_value(json!({
            "position": "3",
            "type": "Coffee shop",
            "rating": 4.6
        }))
        .unwrap();
        assert_eq!(item.position, 3);
        assert_eq!(item.kind, "Coffee shop");
        assert_eq!(item.gps_coordinates, json!({}));
        assert_eq!(item.operating_hours, json!({}));

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["type"], "Coffee shop");
        assert_eq!(out["rating"], json!(4.6));
        assert_eq!(out["thumbnail"], Value::Null);
    }

    #[test]
    fn organic_favicon_is_not_serialized_top_level() {
        let item: OrganicResult = serde_json::from_value(json!({
            "link": "https://example.com/a",
            "favicon": "https://example.com/favicon.ico"
        }))
        .unwrap();
        let out = serde_json::to_value(&item).unwrap();
        assert!(out.get("favicon").is_none());
        assert!(out.get("source_info").is_some());
    }
}
