pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, ObjectKind};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_file_extension, validate_path, validate_positive_number,
    validate_url, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_TOKEN_ENV: &str = "CRM_ACCESS_TOKEN";
pub const INPUT_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Reads the bearer token from `var`. Call `dotenvy::dotenv()` first to pick up `.env`.
pub fn access_token_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(EtlError::MissingConfigError {
            field: var.to_string(),
        }),
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "crm-property-etl")]
#[command(about = "Bulk-create CRM custom properties from a CSV file and report the outcome")]
pub struct CliConfig {
    #[arg(long, default_value = "properties.csv", help = "Input CSV file")]
    pub input: String,

    #[arg(long, default_value = ".", help = "Directory the PDF report is written to")]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, default_value = ",")]
    pub delimiter: char,

    #[arg(long, default_value = "5")]
    pub concurrent_requests: usize,

    #[arg(long, help = "TOML configuration file; replaces the options above")]
    pub config: Option<String>,

    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn delimiter(&self) -> u8 {
        self.delimiter as u8
    }

    fn endpoint(&self, kind: ObjectKind) -> String {
        kind.default_endpoint(&self.base_url)
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        None
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, &INPUT_EXTENSIONS)?;
        validate_path("output_path", &self.output_path)?;
        validate_url("base_url", &self.base_url)?;
        validate_delimiter("delimiter", self.delimiter)?;
        validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        Ok(())
    }
}
