use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::data_models::{SearchOutput, SearchResult};
use crate::error::FetchError;

pub const SITE_HEADER: &str = "X-Site";
pub const NO_CACHE_HEADER: &str = "X-No-Cache";
pub const RESPOND_WITH_HEADER: &str = "X-Respond-With";

/// Candidate keys per logical field, tried in order.
pub struct FieldKeys {
    pub url: &'static [&'static str],
    pub title: &'static [&'static str],
    pub snippet: &'static [&'static str],
    pub site: &'static [&'static str],
}

/// Keys used by the current `data` response shape.
pub const DATA_KEYS: FieldKeys = FieldKeys {
    url: &["url"],
    title: &["title", "name"],
    snippet: &["description", "snippet"],
    site: &["site", "domain"],
};

/// Keys used by the older `results` response shape.
pub const LEGACY_KEYS: FieldKeys = FieldKeys {
    url: &["url"],
    title: &["title"],
    snippet: &["snippet"],
    site: &["site"],
};

pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    site: Option<String>,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(config: &Config, site: Option<String>) -> Result<SearchClient, FetchError> {
        Self::with_client(reqwest::Client::new(), config, site)
    }

    /// Fails only when the token or site can't be carried in a header.
    pub fn with_client(
        client: reqwest::Client,
        config: &Config,
        site: Option<String>,
    ) -> Result<SearchClient, FetchError> {
        if config.has_placeholder_token() {
            log::warn!("Jina.ai API token not set, search may be limited");
        }
        let site = site.filter(|s| !s.is_empty());
        let headers = request_headers(&config.api_token, site.as_deref())?;

        Ok(SearchClient {
            client,
            base_url: config.search_url.clone(),
            headers,
            site,
            timeout: config.timeout,
        })
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    /// Run a search. Every failure is logged and degrades to an empty list.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        page: u32,
        site_search: bool,
    ) -> Vec<SearchResult> {
        if site_search {
            if let Some(site) = &self.site {
                log::info!("Performing site search: {site}");
            }
        }

        match self.fetch_body(query, max_results, page).await {
            Ok(body) => {
                let results = parse_search_response(&body);
                if results.is_empty() {
                    log::warn!("Unable to extract valid search results from Jina.ai response");
                } else {
                    log::info!("Successfully retrieved {} results from Jina.ai", results.len());
                }
                results
            }
            Err(e) => {
                log::error!("Jina.ai search request failed: {e}");
                Vec::new()
            }
        }
    }

    async fn fetch_body(
        &self,
        query: &str,
        max_results: usize,
        page: u32,
    ) -> Result<String, FetchError> {
        let params = query_params(query, max_results, page);
        log::info!("Searching Jina.ai: {query}");
        log::debug!("Request URL: {}, parameters: {:?}", self.base_url, params);

        let resp = self
            .client
            .get(&self.base_url)
            .headers(self.headers.clone())
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        log::debug!("Jina.ai response status: {status}");
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        log::debug!(
            "Jina.ai response content: {}",
            body.chars().take(1000).collect::<String>()
        );
        Ok(body)
    }
}

fn request_headers(api_token: &str, site: Option<&str>) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_token}"))?);
    headers.insert(NO_CACHE_HEADER, HeaderValue::from_static("true"));
    // metadata only, no page content
    headers.insert(RESPOND_WITH_HEADER, HeaderValue::from_static("no-content"));
    if let Some(site) = site {
        headers.insert(SITE_HEADER, header_value(site)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader(e.to_string()))
}

/// `q` and `num` always; `page` only past the first page.
pub fn query_params(query: &str, max_results: usize, page: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.to_string()), ("num", max_results.to_string())];
    if page > 1 {
        params.push(("page", page.to_string()));
    }
    params
}

/// Normalize a search response body. Anything unrecognised yields an empty list.
pub fn parse_search_response(body: &str) -> Vec<SearchResult> {
    let data: Value = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(e) => {
            log::error!("Unable to parse JSON data returned by Jina.ai: {e}");
            log::error!(
                "Raw response content: {}",
                body.chars().take(500).collect::<String>()
            );
            return Vec::new();
        }
    };

    let Some(object) = data.as_object() else {
        log::warn!("Jina.ai returned data is not a JSON object");
        return Vec::new();
    };

    if let Some(items) = object.get("data").and_then(Value::as_array) {
        log::info!("Parsing data field from Jina.ai response, found {} results", items.len());
        return map_items(items, &DATA_KEYS);
    }

    if let Some(results) = object.get("results") {
        log::info!("Using legacy format (results field) to parse Jina.ai response");
        return match results.as_array() {
            Some(items) => map_items(items, &LEGACY_KEYS),
            None => {
                log::warn!("Jina.ai results field is not a list");
                Vec::new()
            }
        };
    }

    log::warn!(
        "Jina.ai returned data does not contain data or results fields: {:?}",
        object.keys().collect::<Vec<_>>()
    );
    Vec::new()
}

fn map_items(items: &[Value], keys: &FieldKeys) -> Vec<SearchResult> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| item.as_object().map(|obj| map_item(obj, keys, idx + 1)))
        .collect()
}

pub fn map_item(item: &Map<String, Value>, keys: &FieldKeys, position: usize) -> SearchResult {
    let field = |candidates: &[&str]| first_value(item, candidates).unwrap_or_default();
    SearchResult {
        url: field(keys.url),
        title: field(keys.title),
        snippet: field(keys.snippet),
        position,
        site: first_value(item, keys.site).filter(|s| !s.is_empty()),
    }
}

/// First candidate key holding a scalar; strings as-is, numbers and bools stringified.
fn first_value(item: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

pub fn format_results(query: &str, results: Vec<SearchResult>) -> SearchOutput {
    SearchOutput {
        query: query.to_string(),
        results,
    }
}

/// Human-readable listing printed by the `search` command.
pub fn render_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results found".to_string();
    }

    let mut lines = Vec::new();
    for (i, result) in results.iter().enumerate() {
        lines.push(format!("\n--- Result {} ---", i + 1));
        lines.push(format!("URL: {}", result.url));
        lines.push(format!("Title: {}", result.title));
        lines.push(format!("Snippet: {}", result.snippet));
        if let Some(site) = &result.site {
            lines.push(format!("Site: {site}"));
        }
    }
    lines.push(format!("\nTotal results: {}", results.len()));
    lines.join("\n")
}

/// Link the user can open to run the same search by hand.
pub fn fallback_search_url(base_url: &str, query: &str) -> String {
    match Url::parse_with_params(base_url, &[("q", query)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{base_url}?q={query}"),
    }
}

pub async fn search_web(
    config: &Config,
    query: &str,
    max_results: usize,
    site: Option<String>,
    site_search: bool,
) -> Vec<SearchResult> {
    match SearchClient::new(config, site) {
        Ok(client) => client.search(query, max_results, 1, site_search).await,
        Err(e) => {
            log::error!("Error occurred during Jina.ai search: {e}");
            Vec::new()
        }
    }
}
