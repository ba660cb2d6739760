use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CardError, Result};
use crate::utils::validation::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub google_books: GoogleBooksConfig,
    pub inventory: InventoryConfig,
    pub catalogue: CatalogueConfig,
    pub cards: CardsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleBooksConfig {
    pub api_key: String,
    pub endpoint: String,
    /// 每次查詢前的強制等待秒數
    pub throttle_seconds: f64,
    pub timeout_seconds: f64,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            throttle_seconds: 2.0,
            timeout_seconds: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub path: String,
    pub delimiter: String,
    pub column: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: "data/library.csv".to_string(),
            delimiter: ",".to_string(),
            column: "Barcode".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    pub path: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            path: "data/catalogue.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardsConfig {
    pub single_template: String,
    pub two_column_template: String,
    pub output_dir: String,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            single_template: "templates/checkout-card.docx".to_string(),
            two_column_template: "templates/checkout-card-two-columns.docx".to_string(),
            output_dir: "output".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CardError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CardError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GOOGLE_BOOKS_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_REF: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REF.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}

impl AppConfig {
    /// Checks the credentials only commands that reach the lookup service need.
    pub fn validate_lookup(&self) -> Result<()> {
        let key = &self.google_books.api_key;
        if key.trim().is_empty() {
            return Err(CardError::MissingConfigError {
                field: "google_books.api_key".to_string(),
            });
        }
        if key.starts_with("${") {
            return Err(CardError::ConfigError {
                message: format!("environment variable {} is not set", key),
            });
        }
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        let gb = &self.google_books;
        validate_url("google_books.endpoint", &gb.endpoint)?;
        validate_range("google_books.throttle_seconds", gb.throttle_seconds, 0.0, 60.0)?;
        validate_range("google_books.timeout_seconds", gb.timeout_seconds, 0.001, 600.0)?;

        validate_path("inventory.path", &self.inventory.path)?;
        validate_delimiter("inventory.delimiter", &self.inventory.delimiter)?;
        validate_non_empty_string("inventory.column", &self.inventory.column)?;

        validate_path("catalogue.path", &self.catalogue.path)?;

        validate_path("cards.single_template", &self.cards.single_template)?;
        validate_file_extension("cards.single_template", &self.cards.single_template, &["docx"])?;
        validate_path("cards.two_column_template", &self.cards.two_column_template)?;
        validate_file_extension(
            "cards.two_column_template",
            &self.cards.two_column_template,
            &["docx"],
        )?;
        validate_path("cards.output_dir", &self.cards.output_dir)?;

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn api_key(&self) -> &str {
        &self.google_books.api_key
    }

    fn lookup_endpoint(&self) -> &str {
        &self.google_books.endpoint
    }

    fn throttle(&self) -> Duration {
        Duration::from_secs_f64(self.google_books.throttle_seconds.max(0.0))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.google_books.timeout_seconds.max(0.001))
    }

    fn catalogue_path(&self) -> &str {
        &self.catalogue.path
    }

    fn inventory_path(&self) -> &str {
        &self.inventory.path
    }

    fn inventory_delimiter(&self) -> u8 {
        self.inventory.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    fn inventory_column(&self) -> &str {
        &self.inventory.column
    }

    fn single_template(&self) -> &str {
        &self.cards.single_template
    }

    fn two_column_template(&self) -> &str {
        &self.cards.two_column_template
    }

    fn output_dir(&self) -> &str {
        &self.cards.output_dir
    }
}
