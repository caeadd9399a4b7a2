use std::time::Duration;

use reqwest::Url;

use crate::config::Config;
use crate::data_models::PageContent;
use crate::error::FetchError;

pub const LINKS_SUMMARY_HEADER: &str = "X-With-Links-Summary";

/// Client for the reader endpoint, which turns any page into cleaned markdown-ish text.
pub struct PageReader {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl PageReader {
    pub fn new(config: &Config) -> PageReader {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &Config) -> PageReader {
        if config.has_placeholder_token() {
            log::warn!("Jina.ai API token not set, reading will likely fail");
        }
        PageReader {
            client,
            base_url: config.reader_url.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// The reader endpoint takes the target URL verbatim as its path.
    pub fn request_url(&self, url: &str) -> String {
        format!("{}{}", self.base_url, url)
    }

    pub async fn fetch(
        &self,
        url: &str,
        extract_links: bool,
        timeout: Duration,
    ) -> Result<PageContent, FetchError> {
        let request_url = self.request_url(url);
        log::info!("Reading web page through Jina.ai: {url}");
        log::debug!("Request URL: {request_url}, links summary: {extract_links}");

        let mut request = self
            .client
            .get(&request_url)
            .bearer_auth(&self.api_token)
            .timeout(timeout);
        if extract_links {
            request = request.header(LINKS_SUMMARY_HEADER, "true");
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let title = extract_title_from_content(&body).unwrap_or_else(|| title_from_url(url));

        Ok(PageContent::new(url.to_string(), title, body))
    }
}

/// Fetch a page and return `(title, body)`, or `None` after logging the failure.
pub async fn read_webpage(
    config: &Config,
    url: &str,
    extract_links: bool,
) -> Option<(String, String)> {
    let reader = PageReader::new(config);
    match reader.fetch(url, extract_links, config.timeout).await {
        Ok(page) => Some((page.title, page.body)),
        Err(e) => {
            log::error!("Request failed: {e}");
            None
        }
    }
}

/// First `# Heading`, else the first non-empty line that isn't a `---`/`===` rule.
pub fn extract_title_from_content(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if let Some(heading) = line.strip_prefix("# ") {
            return Some(heading.trim().to_string());
        }
        if !line.is_empty() && !line.starts_with("---") && !line.starts_with("===") {
            return Some(line.to_string());
        }
    }
    None
}

/// Last path segment, de-slugged and title-cased; the host when the path is empty.
/// Scheme-less input like `example.com/page` is read as https.
pub fn title_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url).or_else(|_| Url::parse(&format!("https://{url}"))) else {
        return url.to_string();
    };

    let path = parsed.path().trim_matches('/');
    if let Some(last) = path.rsplit('/').next().filter(|s| !s.is_empty()) {
        return title_case(&last.replace(['-', '_'], " "));
    }

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
