use crate::domain::model::BibliographicRecord;
use crate::domain::ports::{ConfigProvider, LookupFailure, MetadataResolver};
use crate::utils::error::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::Instrument;

/// Response projection requested from the volumes endpoint.
pub const FIELD_PROJECTION: &str = "items/volumeInfo(authors,title,subtitle,publishedDate)";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    authors: Option<Vec<String>>,
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
}

impl From<VolumeInfo> for BibliographicRecord {
    fn from(info: VolumeInfo) -> Self {
        Self {
            authors: info.authors.unwrap_or_default(),
            title: info.title.unwrap_or_default(),
            subtitle: info.subtitle,
            published_date: info.published_date,
        }
    }
}

/// Looks identifiers up on the Google Books volumes API, one throttled
/// request at a time.
pub struct GoogleBooksResolver {
    client: Client,
    endpoint: String,
    api_key: String,
    throttle: Duration,
    span: tracing::Span,
}

impl GoogleBooksResolver {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.lookup_endpoint().to_string(),
            api_key: config.api_key().to_string(),
            throttle: config.throttle(),
            span: tracing::info_span!("resolver"),
        })
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    async fn lookup(&self, identifier: &str) -> std::result::Result<BibliographicRecord, LookupFailure> {
        // 外部服務有速率限制，每次請求前都必須等待
        if !self.throttle.is_zero() {
            tracing::debug!("Throttling {:?} before looking up {}", self.throttle, identifier);
            tokio::time::sleep(self.throttle).await;
        }

        let query = format!("isbn:{}", identifier);
        tracing::debug!("Making lookup request to: {} (q={})", self.endpoint, query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query.as_str()),
                ("fields", FIELD_PROJECTION),
            ])
            .send()
            .await
            .map_err(|e| LookupFailure::Transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!("Lookup response status: {}", status);
        if !status.is_success() {
            return Err(LookupFailure::Status(status.as_u16()));
        }

        let body: VolumesResponse = response
            .json()
            .await
            .map_err(|e| LookupFailure::Malformed(e.to_string()))?;

        let first = body
            .items
            .into_iter()
            .next()
            .ok_or(LookupFailure::NoMatch)?;

        let record = BibliographicRecord::from(first.volume_info);
        if record.title.is_empty() || record.published_date.is_none() {
            tracing::warn!("Partial metadata for {}: {:?}", identifier, record);
        }
        Ok(record)
    }
}

#[async_trait::async_trait]
impl MetadataResolver for GoogleBooksResolver {
    async fn resolve(
        &self,
        identifier: &str,
    ) -> std::result::Result<BibliographicRecord, LookupFailure> {
        let span = self.span.clone();
        async move {
            let outcome = self.lookup(identifier).await;
            match &outcome {
                Ok(record) => tracing::info!("📚 {} -> {}", identifier, record.title),
                Err(failure) => tracing::warn!("Lookup of {} failed: {}", identifier, failure),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
