use crate::domain::model::BibliographicRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Replaces `path` in full; readers never observe a partial write.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn lookup_endpoint(&self) -> &str;
    fn throttle(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn catalogue_path(&self) -> &str;
    fn inventory_path(&self) -> &str;
    fn inventory_delimiter(&self) -> u8;
    fn inventory_column(&self) -> &str;
    fn single_template(&self) -> &str;
    fn two_column_template(&self) -> &str;
    fn output_dir(&self) -> &str;
}

/// Why a lookup produced no record. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    Transport(String),
    Status(u16),
    Malformed(String),
    NoMatch,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::Transport(reason) => write!(f, "transport error: {}", reason),
            LookupFailure::Status(code) => write!(f, "lookup service answered HTTP {}", code),
            LookupFailure::Malformed(reason) => write!(f, "unreadable response: {}", reason),
            LookupFailure::NoMatch => f.write_str("no matching volume"),
        }
    }
}

#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(
        &self,
        identifier: &str,
    ) -> std::result::Result<BibliographicRecord, LookupFailure>;
}
