use crate::adapters::LocalStorage;
use crate::core::card::{pair_file_name, unique_file_name, CardRenderer};
use crate::core::catalogue::{Catalogue, PopulateReport};
use crate::core::inventory::read_identifiers_from_path;
use crate::domain::model::{BibliographicRecord, CardFields, CardLayout};
use crate::domain::ports::{ConfigProvider, MetadataResolver};
use crate::utils::error::{CardError, Result};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Default)]
pub struct RenderReport {
    pub written: Vec<String>,
    pub failed: Vec<(String, CardError)>,
}

impl RenderReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the whole workflow: load the cache, look up new identifiers, fill
/// templates. Everything happens sequentially on the calling task.
pub struct CardDriver<C: ConfigProvider, R: MetadataResolver> {
    config: C,
    resolver: R,
    span: tracing::Span,
}

impl<C: ConfigProvider, R: MetadataResolver> CardDriver<C, R> {
    pub fn new(config: C, resolver: R) -> Self {
        Self {
            config,
            resolver,
            span: tracing::info_span!("driver"),
        }
    }

    /// Events of the driver, and of the catalogue and renderer it creates,
    /// are emitted inside `span` (the latter two as `catalogue` / `renderer`
    /// child spans). The resolver carries its own span, see
    /// `GoogleBooksResolver::with_span`.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub async fn load_catalogue(&self) -> Result<Catalogue<LocalStorage>> {
        let storage = LocalStorage::new(".");
        let mut catalogue = Catalogue::empty(storage, self.config.catalogue_path())
            .with_span(tracing::info_span!(parent: &self.span, "catalogue"));
        catalogue.reload().await?;
        Ok(catalogue)
    }

    /// Reads the inventory and resolves every identifier missing from the
    /// cache, persisting the merged catalogue afterwards.
    pub async fn populate(
        &self,
        catalogue: &mut Catalogue<LocalStorage>,
    ) -> Result<PopulateReport> {
        let identifiers = self.span.in_scope(|| {
            read_identifiers_from_path(
                self.config.inventory_path(),
                self.config.inventory_delimiter(),
                self.config.inventory_column(),
            )
        })?;
        tracing::info!(
            parent: &self.span,
            "🔎 {} identifiers in inventory, {} already cached",
            identifiers.len(),
            identifiers.iter().filter(|id| catalogue.contains(id)).count()
        );
        catalogue.populate(&identifiers, &self.resolver, true).await
    }

    /// Renders every catalogue entry in identifier order. A failing card is
    /// logged and recorded; the remaining cards are still attempted.
    pub async fn render(
        &self,
        catalogue: &Catalogue<LocalStorage>,
        layout: CardLayout,
    ) -> Result<RenderReport> {
        let output_dir = self.config.output_dir();
        std::fs::create_dir_all(output_dir)?;

        let renderer = CardRenderer::new(
            LocalStorage::new(output_dir),
            self.config.single_template(),
            self.config.two_column_template(),
        )
        .with_span(tracing::info_span!(parent: &self.span, "renderer"));
        let records: Vec<&BibliographicRecord> = catalogue.items().map(|(_, r)| r).collect();
        let mut report = RenderReport::default();

        match layout {
            CardLayout::Single => {
                let mut taken = HashSet::new();
                for record in records {
                    let name = unique_file_name(&mut taken, &CardFields::from_record(record).slug());
                    let outcome = renderer.render_single(record, Some(name.as_str())).await;
                    self.record_outcome(&mut report, output_dir, name, outcome);
                }
            }
            CardLayout::TwoColumn => {
                for (chunk_index, pair) in records.chunks(2).enumerate() {
                    let index = chunk_index * 2;
                    let right = pair.get(1).copied();
                    let name = pair_file_name(index, right.is_some());
                    let outcome = renderer.render_pair(pair[0], right, &name).await;
                    self.record_outcome(&mut report, output_dir, name, outcome);
                }
            }
        }

        tracing::info!(
            parent: &self.span,
            "🖨️ Rendered {} card file(s), {} failed",
            report.written.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn record_outcome(
        &self,
        report: &mut RenderReport,
        output_dir: &str,
        name: String,
        outcome: Result<String>,
    ) {
        match outcome {
            Ok(written) => {
                let path = Path::new(output_dir).join(written);
                report.written.push(path.display().to_string());
            }
            Err(e) => {
                tracing::error!(parent: &self.span, "❌ Card {} failed: {}", name, e);
                report.failed.push((name, e));
            }
        }
    }

    /// `populate` (unless skipped) followed by `render`.
    pub async fn run(&self, layout: CardLayout, populate: bool) -> Result<RenderReport> {
        let mut catalogue = self.load_catalogue().await?;
        if populate {
            self.populate(&mut catalogue).await?;
        }
        self.render(&catalogue, layout).await
    }
}

/// One `Author: Title (Year)` line per catalogue entry.
pub fn describe(catalogue: &Catalogue<LocalStorage>) -> Vec<String> {
    catalogue
        .items()
        .map(|(id, record)| format!("{}  {}", id, CardFields::from_record(record)))
        .collect()
}
