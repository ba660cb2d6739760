mod common;

use anyhow::Result;
use checkout_cards::{CardDriver, CardLayout, GoogleBooksResolver};
use common::{document_xml, volume, workspace_config};
use httpmock::prelude::*;
use std::path::Path;
use tempfile::TempDir;

async fn mock_three_books(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("q", "isbn:001");
            then.status(200).json_body(volume(
                &["Smith, Jane", "Doe, John"],
                "Field Notes",
                Some("2020-05-01"),
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("q", "isbn:002");
            then.status(200)
                .json_body(volume(&["Latour, Bruno"], "Laboratory Life", Some("1979")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("q", "isbn:003");
            then.status(200).json_body(volume(&["Anonymous"], "Undated Pamphlet", None));
        })
        .await;
}

#[tokio::test]
async fn test_single_cards_named_by_slug() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    mock_three_books(&server).await;

    let config = workspace_config(temp_dir.path(), &server, "Barcode\n001\n002\n003\n");
    let resolver = GoogleBooksResolver::new(&config)?;
    let driver = CardDriver::new(config, resolver);

    let report = driver.run(CardLayout::Single, true).await?;
    assert!(report.is_complete());
    assert_eq!(report.written.len(), 3);

    let output = temp_dir.path().join("output");
    let first = output.join("smith,_jane,_doe,_john-field_notes-2020.docx");
    assert!(first.exists());
    let xml = document_xml(&first);
    assert!(xml.contains("<w:t>Smith, Jane, Doe, John</w:t>"));
    assert!(xml.contains("<w:t>Field Notes</w:t>"));
    assert!(xml.contains("<w:t>2020</w:t>"));

    let undated = output.join("anonymous-undated_pamphlet.docx");
    assert!(undated.exists());
    assert!(document_xml(&undated).contains("<w:t> </w:t>"));
    Ok(())
}

#[tokio::test]
async fn test_two_column_cards_pair_items() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    mock_three_books(&server).await;

    let config = workspace_config(temp_dir.path(), &server, "Barcode\n001\n002\n003\n");
    let resolver = GoogleBooksResolver::new(&config)?;
    let driver = CardDriver::new(config, resolver);

    let report = driver.run(CardLayout::TwoColumn, true).await?;
    assert!(report.is_complete());

    let output = temp_dir.path().join("output");
    let pair = document_xml(&output.join("two-cards-0_and_1.docx"));
    assert!(pair.contains("Smith, Jane, Doe, John|Field Notes|2020"));
    assert!(pair.contains("Latour, Bruno|Laboratory Life|1979"));

    let tail = document_xml(&output.join("two-cards-2.docx"));
    assert!(tail.contains("Anonymous|Undated Pamphlet| "));
    assert!(tail.contains("<w:t>||</w:t>"));
    assert_eq!(report.written.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_template_fails_cards_not_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    mock_three_books(&server).await;

    let mut config = workspace_config(temp_dir.path(), &server, "Barcode\n001\n002\n");
    config.cards.single_template = temp_dir
        .path()
        .join("templates/missing.docx")
        .display()
        .to_string();
    let catalogue_path = config.catalogue.path.clone();
    let resolver = GoogleBooksResolver::new(&config)?;
    let driver = CardDriver::new(config, resolver);

    let report = driver.run(CardLayout::Single, true).await?;

    assert!(report.written.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .all(|(_, e)| matches!(e, checkout_cards::CardError::TemplateError { .. })));
    // the cache is persisted before rendering starts
    assert!(Path::new(&catalogue_path).exists());
    Ok(())
}

#[tokio::test]
async fn test_render_from_cache_without_lookups() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(500);
        })
        .await;

    let config = workspace_config(temp_dir.path(), &server, "Barcode\n999\n");
    std::fs::create_dir_all(temp_dir.path().join("data"))?;
    std::fs::write(
        &config.catalogue.path,
        r#"{"42": {"authors": ["Le Guin, Ursula K."], "title": "The Dispossessed", "publishedDate": "1974"}}"#,
    )?;
    let resolver = GoogleBooksResolver::new(&config)?;
    let driver = CardDriver::new(config, resolver);

    let report = driver.run(CardLayout::Single, false).await?;

    assert_eq!(lookup.hits_async().await, 0);
    assert_eq!(report.written.len(), 1);
    assert!(temp_dir
        .path()
        .join("output/le_guin,_ursula_k.-the_dispossessed-1974.docx")
        .exists());
    Ok(())
}
