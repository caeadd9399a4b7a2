use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Cleaned page text returned by the reader endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub body: String,
}

impl PageContent {
    pub fn new(url: String, title: String, body: String) -> PageContent {
        PageContent { url, title, body }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// 1-based index of the item in the upstream list.
    pub position: usize,
    /// Written as `""` when absent.
    #[serde(default, serialize_with = "empty_if_none", deserialize_with = "none_if_empty")]
    pub site: Option<String>,
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

fn none_if_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// Document printed by `search --json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchOutput {
    pub query: String,
    pub results: Vec<SearchResult>,
}
