pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::LocalStorage;
pub use config::AppConfig;
pub use crate::core::{
    card::CardRenderer,
    catalogue::{Catalogue, PopulateReport},
    driver::{CardDriver, RenderReport},
    resolver::GoogleBooksResolver,
};
pub use domain::model::{BibliographicRecord, CardLayout, Year};
pub use utils::error::{CardError, Result};
