pub mod cli;
pub mod config;
pub mod data_models;
pub mod error;
pub mod reader;
pub mod search;

pub use config::Config;
pub use data_models::{PageContent, SearchOutput, SearchResult};
pub use error::{ConfigError, FetchError};
pub use reader::{PageReader, read_webpage};
pub use search::{SearchClient, search_web};
