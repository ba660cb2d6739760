//! Checkout card rendering.
//!
//! Templates are ordinary `.docx` files. Editable positions are marked with
//! placeholder tokens inside `word/document.xml`:
//!
//! | layout     | tokens                                                        |
//! |------------|---------------------------------------------------------------|
//! | single     | `{{author}}` `{{title}}` `{{year}}`                           |
//! | two-column | `{{left_author}}` ... `{{right_year}}` (same three per side)  |
//!
//! Each token must sit inside a single text run; Word splits runs when a
//! token is typed with mixed formatting, which makes it invisible here.

use crate::domain::model::{BibliographicRecord, CardFields};
use crate::domain::ports::Storage;
use crate::utils::error::{CardError, Result};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::Instrument;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// A `.docx` template held in memory.
#[derive(Debug, Clone)]
pub struct Template {
    path: String,
    bytes: Vec<u8>,
}

impl Template {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let display = path.as_ref().display().to_string();
        let bytes = std::fs::read(&path).map_err(|e| CardError::TemplateError {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(display, bytes)
    }

    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let template = Self {
            path: path.into(),
            bytes,
        };
        template.document_xml()?;
        Ok(template)
    }

    fn template_error(&self, reason: impl ToString) -> CardError {
        CardError::TemplateError {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn document_xml(&self) -> Result<String> {
        let mut archive =
            ZipArchive::new(Cursor::new(&self.bytes)).map_err(|e| self.template_error(e))?;
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|_| self.template_error(format!("no {} part", DOCUMENT_PART)))?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)?;
        Ok(xml)
    }

    /// Returns a new document with every `{{name}}` token replaced in a single
    /// pass, so substituted text is never scanned for tokens again. Unknown
    /// tokens are left as they are. All other archive entries are copied byte
    /// for byte.
    pub fn fill(&self, values: &[(&str, &str)]) -> Result<Vec<u8>> {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("static regex is valid"));

        let source = self.document_xml()?;
        let mut filled = HashSet::new();
        let xml = re
            .replace_all(&source, |caps: &Captures| {
                let name = &caps[1];
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => {
                        filled.insert(name.to_string());
                        escape_xml(value)
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned();

        for (name, _) in values {
            if !filled.contains(*name) {
                tracing::debug!("Template {} has no {{{{{}}}}} placeholder", self.path, name);
            }
        }

        let mut archive =
            ZipArchive::new(Cursor::new(&self.bytes)).map_err(|e| self.template_error(e))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.name() == DOCUMENT_PART {
                writer.start_file(DOCUMENT_PART, SimpleFileOptions::default())?;
                writer.write_all(xml.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Writes filled templates through a `Storage` rooted at the output directory.
pub struct CardRenderer<S: Storage> {
    storage: S,
    single_template: PathBuf,
    two_column_template: PathBuf,
    span: tracing::Span,
}

impl<S: Storage> CardRenderer<S> {
    pub fn new(
        storage: S,
        single_template: impl Into<PathBuf>,
        two_column_template: impl Into<PathBuf>,
    ) -> Self {
        Self {
            storage,
            single_template: single_template.into(),
            two_column_template: two_column_template.into(),
            span: tracing::info_span!("renderer"),
        }
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Renders one record; the template is read per card so a broken asset
    /// only fails the cards that use it. Returns the written file name.
    pub async fn render_single(
        &self,
        record: &BibliographicRecord,
        file_name: Option<&str>,
    ) -> Result<String> {
        let fields = CardFields::from_record(record);
        let file_name = file_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.docx", fields.slug()));

        async {
            let template = Template::open(&self.single_template)?;
            let document = template.fill(&[
                ("author", fields.author.as_str()),
                ("title", fields.title.as_str()),
                ("year", fields.year.as_str()),
            ])?;
            self.storage.write_file(&file_name, &document).await?;
            tracing::debug!("Wrote {} ({})", file_name, fields);
            Ok::<_, CardError>(file_name)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Renders two records side by side. A missing right-hand record leaves
    /// that column blank.
    pub async fn render_pair(
        &self,
        left: &BibliographicRecord,
        right: Option<&BibliographicRecord>,
        file_name: &str,
    ) -> Result<String> {
        let left = CardFields::from_record(left);
        let right = right.map(CardFields::from_record).unwrap_or_default();

        async {
            let template = Template::open(&self.two_column_template)?;
            let document = template.fill(&[
                ("left_author", left.author.as_str()),
                ("left_title", left.title.as_str()),
                ("left_year", left.year.as_str()),
                ("right_author", right.author.as_str()),
                ("right_title", right.title.as_str()),
                ("right_year", right.year.as_str()),
            ])?;
            self.storage.write_file(file_name, &document).await?;
            tracing::debug!("Wrote {} ({} | {})", file_name, left, right);
            Ok::<_, CardError>(file_name.to_string())
        }
        .instrument(self.span.clone())
        .await
    }
}

/// `two-cards-{i}_and_{i+1}.docx`, or `two-cards-{i}.docx` for a lone tail.
pub fn pair_file_name(index: usize, has_right: bool) -> String {
    if has_right {
        format!("two-cards-{}_and_{}.docx", index, index + 1)
    } else {
        format!("two-cards-{}.docx", index)
    }
}

/// Slug-based file name, suffixed `-2`, `-3`, ... when already taken.
pub fn unique_file_name(taken: &mut HashSet<String>, slug: &str) -> String {
    let mut candidate = format!("{}.docx", slug);
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}-{}.docx", slug, n);
        n += 1;
    }
    candidate
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal `.docx`-shaped archive with the given document body.
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        write!(
            writer,
            r#"<w:document><w:body>{}</w:body></w:document>"#,
            body
        )
        .unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut out = String::new();
        part.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_fill_replaces_tokens_and_keeps_other_parts() {
        let template = Template::from_bytes(
            "single.docx",
            docx_with_body("<w:p><w:r><w:t>{{author}}</w:t></w:r></w:p><w:p><w:r><w:t>{{title}} ({{year}})</w:t></w:r></w:p>"),
        )
        .unwrap();

        let filled = template
            .fill(&[("author", "Smith, Jane"), ("title", "Tools & <Tactics>"), ("year", "2020")])
            .unwrap();

        let xml = read_part(&filled, DOCUMENT_PART);
        assert!(xml.contains("<w:t>Smith, Jane</w:t>"));
        assert!(xml.contains("<w:t>Tools &amp; &lt;Tactics&gt; (2020)</w:t>"));
        assert!(!xml.contains("{{"));
        assert_eq!(read_part(&filled, "[Content_Types].xml"), "<Types/>");
    }

    #[test]
    fn test_values_containing_tokens_are_not_rescanned() {
        let template = Template::from_bytes(
            "single.docx",
            docx_with_body("<w:p><w:r><w:t>{{author}}</w:t></w:r></w:p><w:p><w:r><w:t>{{title}}</w:t></w:r></w:p><w:p><w:r><w:t>{{year}}</w:t></w:r></w:p>"),
        )
        .unwrap();

        let filled = template
            .fill(&[("author", "A"), ("title", "Notes on {{year}}"), ("year", "2020")])
            .unwrap();

        let xml = read_part(&filled, DOCUMENT_PART);
        assert!(xml.contains("<w:t>Notes on {{year}}</w:t>"));
        assert!(xml.contains("<w:t>2020</w:t>"));
    }

    #[test]
    fn test_left_column_cannot_pull_right_column_data() {
        let template = Template::from_bytes(
            "two.docx",
            docx_with_body("<w:t>{{left_title}}</w:t><w:t>{{right_title}}</w:t><w:t>{{unknown}}</w:t>"),
        )
        .unwrap();

        let filled = template
            .fill(&[("left_title", "See {{right_title}}"), ("right_title", "Right")])
            .unwrap();

        let xml = read_part(&filled, DOCUMENT_PART);
        assert!(xml.contains("<w:t>See {{right_title}}</w:t><w:t>Right</w:t>"));
        assert!(xml.contains("<w:t>{{unknown}}</w:t>"));
    }

    #[test]
    fn test_template_without_document_part_is_rejected() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = Template::from_bytes("broken.docx", bytes).unwrap_err();
        assert!(matches!(err, CardError::TemplateError { .. }));
    }

    #[test]
    fn test_not_a_zip_is_rejected() {
        let err = Template::from_bytes("plain.docx", b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, CardError::TemplateError { .. }));
    }

    #[test]
    fn test_missing_template_file() {
        let err = Template::open("/no/such/template.docx").unwrap_err();
        assert!(matches!(err, CardError::TemplateError { .. }));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(pair_file_name(0, true), "two-cards-0_and_1.docx");
        assert_eq!(pair_file_name(4, false), "two-cards-4.docx");

        let mut taken = HashSet::new();
        assert_eq!(unique_file_name(&mut taken, "a-b-2020"), "a-b-2020.docx");
        assert_eq!(unique_file_name(&mut taken, "a-b-2020"), "a-b-2020-2.docx");
        assert_eq!(unique_file_name(&mut taken, "a-b-2020"), "a-b-2020-3.docx");
    }

    #[test]
    fn test_two_column_author_field() {
        let record = BibliographicRecord {
            authors: vec!["Smith, Jane".to_string(), "Doe, John".to_string()],
            title: "Pairs".to_string(),
            ..BibliographicRecord::default()
        };
        assert_eq!(CardFields::from_record(&record).author, "Smith, Jane, Doe, John");
    }
}
