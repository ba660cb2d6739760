pub mod card;
pub mod catalogue;
pub mod driver;
pub mod inventory;
pub mod resolver;

pub use crate::domain::model::{BibliographicRecord, CardFields, CardLayout, Year};
pub use crate::domain::ports::{ConfigProvider, LookupFailure, MetadataResolver, Storage};
pub use crate::utils::error::Result;
