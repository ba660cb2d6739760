#![allow(dead_code)]

use checkout_cards::AppConfig;
use httpmock::MockServer;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const SINGLE_BODY: &str = "<w:p><w:r><w:t>{{author}}</w:t></w:r></w:p>\
<w:p><w:r><w:t>{{title}}</w:t></w:r></w:p>\
<w:p><w:r><w:t>{{year}}</w:t></w:r></w:p>";

pub const TWO_COLUMN_BODY: &str = "<w:tbl><w:tr>\
<w:tc><w:p><w:r><w:t>{{left_author}}|{{left_title}}|{{left_year}}</w:t></w:r></w:p></w:tc>\
<w:tc><w:p><w:r><w:t>{{right_author}}|{{right_title}}|{{right_year}}</w:t></w:r></w:p></w:tc>\
</w:tr></w:tbl>";

pub fn write_docx(path: &Path, body: &str) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    write!(writer, "<w:document><w:body>{}</w:body></w:document>", body).unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

pub fn document_xml(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name("word/document.xml").unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

/// Config rooted in `dir` with templates in place and the given inventory.
pub fn workspace_config(dir: &Path, server: &MockServer, inventory: &str) -> AppConfig {
    let templates = dir.join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    write_docx(&templates.join("single.docx"), SINGLE_BODY);
    write_docx(&templates.join("two.docx"), TWO_COLUMN_BODY);

    let inventory_path = dir.join("library.csv");
    std::fs::write(&inventory_path, inventory).unwrap();

    let mut config = AppConfig::default();
    config.google_books.api_key = "test-key".to_string();
    config.google_books.endpoint = server.url("/books/v1/volumes");
    config.google_books.throttle_seconds = 0.0;
    config.google_books.timeout_seconds = 0.5;
    config.inventory.path = inventory_path.display().to_string();
    config.catalogue.path = dir.join("data/catalogue.json").display().to_string();
    config.cards.single_template = templates.join("single.docx").display().to_string();
    config.cards.two_column_template = templates.join("two.docx").display().to_string();
    config.cards.output_dir = dir.join("output").display().to_string();
    config
}

pub fn volume(authors: &[&str], title: &str, published: Option<&str>) -> serde_json::Value {
    let mut info = serde_json::json!({ "authors": authors, "title": title });
    if let Some(date) = published {
        info["publishedDate"] = serde_json::Value::String(date.to_string());
    }
    serde_json::json!({ "items": [{ "volumeInfo": info }] })
}
