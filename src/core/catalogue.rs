use crate::domain::model::BibliographicRecord;
use crate::domain::ports::{MetadataResolver, Storage};
use crate::utils::error::{CardError, Result};
use std::collections::{BTreeMap, HashSet};
use tracing::Instrument;

/// Outcome counts of one `populate` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub requested: usize,
    pub cached: usize,
    pub resolved: usize,
    /// Identifiers that could not be resolved this run, in input order.
    pub missing: Vec<String>,
}

/// Durable identifier -> record cache.
///
/// The whole mapping is rewritten on every persist; unresolved identifiers are
/// never recorded, so the next run retries them.
pub struct Catalogue<S: Storage> {
    storage: S,
    path: String,
    items: BTreeMap<String, BibliographicRecord>,
    span: tracing::Span,
}

impl<S: Storage> Catalogue<S> {
    pub fn empty(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
            items: BTreeMap::new(),
            span: tracing::info_span!("catalogue"),
        }
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Reads the stored mapping. A missing file starts an empty catalogue; an
    /// unparseable one is an error rather than being silently discarded.
    pub async fn load(storage: S, path: impl Into<String>) -> Result<Self> {
        let mut catalogue = Self::empty(storage, path);
        catalogue.reload().await?;
        Ok(catalogue)
    }

    pub async fn reload(&mut self) -> Result<()> {
        let span = self.span.clone();
        async {
            let bytes = match self.storage.read_file(&self.path).await {
                Ok(bytes) => bytes,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        "No catalogue at {}, starting with an empty cache",
                        self.path
                    );
                    self.items.clear();
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            self.items = serde_json::from_slice(&bytes).map_err(|source| {
                CardError::CorruptCatalogue {
                    path: self.path.clone(),
                    source,
                }
            })?;
            tracing::info!("Loaded {} catalogue entries from {}", self.items.len(), self.path);
            Ok::<(), CardError>(())
        }
        .instrument(span)
        .await
    }

    /// Resolves every identifier not yet in the catalogue, in input order,
    /// at most once per call. Lookup failures leave the key absent.
    pub async fn populate<R>(
        &mut self,
        identifiers: &[String],
        resolver: &R,
        persist: bool,
    ) -> Result<PopulateReport>
    where
        R: MetadataResolver + ?Sized,
    {
        let span = self.span.clone();
        let report = async {
            let mut report = PopulateReport::default();
            let mut attempted = HashSet::new();

            for identifier in identifiers {
                let identifier = identifier.trim();
                if identifier.is_empty() || !attempted.insert(identifier.to_string()) {
                    continue;
                }
                report.requested += 1;

                if self.items.contains_key(identifier) {
                    tracing::debug!("Cache hit for {}", identifier);
                    report.cached += 1;
                    continue;
                }

                match resolver.resolve(identifier).await {
                    Ok(record) => {
                        self.items.insert(identifier.to_string(), record);
                        report.resolved += 1;
                    }
                    Err(failure) => {
                        tracing::warn!("Skipping {}: {}", identifier, failure);
                        report.missing.push(identifier.to_string());
                    }
                }
            }

            tracing::info!(
                "Populate finished: {} requested, {} cached, {} resolved, {} missing",
                report.requested,
                report.cached,
                report.resolved,
                report.missing.len()
            );
            report
        }
        .instrument(span)
        .await;

        if persist {
            self.persist().await?;
        }
        Ok(report)
    }

    /// Writes the full mapping as pretty JSON, replacing the stored file.
    pub async fn persist(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.items)?;
        self.storage
            .write_file(&self.path, &data)
            .instrument(self.span.clone())
            .await?;
        tracing::info!(parent: &self.span, "💾 Persisted {} entries to {}", self.items.len(), self.path);
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&BibliographicRecord> {
        self.items.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.items.contains_key(identifier)
    }

    pub fn insert(&mut self, identifier: impl Into<String>, record: BibliographicRecord) {
        self.items.insert(identifier.into(), record);
    }

    /// Entries in identifier order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &BibliographicRecord)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
