use crate::config::{DEFAULT_BASE_URL, DEFAULT_TOKEN_ENV, INPUT_EXTENSIONS};
use crate::core::{ConfigProvider, ObjectKind};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_file_extension, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: RunConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    pub delimiter: Option<char>,
    pub concurrent_requests: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub token_env: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub endpoints: Option<EndpointsConfig>,
}

/// Per-kind URL overrides; kinds left out use `<base_url>/crm/v3/properties/<kind>s`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub contact: Option<String>,
    pub deal: Option<String>,
    pub ticket: Option<String>,
}

fn default_output_path() -> String {
    ".".to_string()
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with its environment value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn token_env(&self) -> &str {
        self.api.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }

    fn endpoint_override(&self, kind: ObjectKind) -> Option<&str> {
        let endpoints = self.api.endpoints.as_ref()?;
        match kind {
            ObjectKind::Contact => endpoints.contact.as_deref(),
            ObjectKind::Deal => endpoints.deal.as_deref(),
            ObjectKind::Ticket => endpoints.ticket.as_deref(),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("run.input", &self.run.input)?;
        validate_file_extension("run.input", &self.run.input, &INPUT_EXTENSIONS)?;
        validate_path("run.output_path", &self.run.output_path)?;

        if let Some(delimiter) = self.run.delimiter {
            validate_delimiter("run.delimiter", delimiter)?;
        }

        if let Some(concurrent) = self.run.concurrent_requests {
            validate_positive_number("run.concurrent_requests", concurrent, 1)?;
        }

        validate_url("api.base_url", self.base_url())?;

        for kind in ObjectKind::ALL {
            if let Some(url) = self.endpoint_override(kind) {
                validate_url(&format!("api.endpoints.{}", kind), url)?;
            }
        }

        if let Some(timeout) = self.api.request_timeout_seconds {
            validate_range("api.request_timeout_seconds", timeout, 1, 300)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.run.input
    }

    fn output_path(&self) -> &str {
        &self.run.output_path
    }

    fn delimiter(&self) -> u8 {
        self.run.delimiter.map(|c| c as u8).unwrap_or(b',')
    }

    fn endpoint(&self, kind: ObjectKind) -> String {
        match self.endpoint_override(kind) {
            Some(url) => url.to_string(),
            None => kind.default_endpoint(self.base_url()),
        }
    }

    fn concurrent_requests(&self) -> usize {
        self.run.concurrent_requests.unwrap_or(5)
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.api.request_timeout_seconds
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_toml_config() {
        let toml_content = r#"
[run]
input = "properties.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input_path(), "properties.csv");
        assert_eq!(config.output_path(), ".");
        assert_eq!(config.delimiter(), b',');
        assert_eq!(config.concurrent_requests(), 5);
        assert_eq!(config.token_env(), "CRM_ACCESS_TOKEN");
        assert_eq!(
            config.endpoint(ObjectKind::Deal),
            "https://api.hubapi.com/crm/v3/properties/deals"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_overrides() {
        let toml_content = r#"
[run]
input = "properties.csv"
output_path = "./reports"
delimiter = ";"
concurrent_requests = 2

[api]
base_url = "https://sandbox.example.com"
request_timeout_seconds = 30

[api.endpoints]
ticket = "https://tickets.example.com/properties"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.delimiter(), b';');
        assert_eq!(config.concurrent_requests(), 2);
        assert_eq!(config.request_timeout_seconds(), Some(30));
        assert_eq!(
            config.endpoint(ObjectKind::Ticket),
            "https://tickets.example.com/properties"
        );
        assert_eq!(
            config.endpoint(ObjectKind::Contact),
            "https://sandbox.example.com/crm/v3/properties/contacts"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_REPORT_DIR", "/tmp/property-reports");

        let toml_content = r#"
[run]
input = "properties.csv"
output_path = "${TEST_REPORT_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), "/tmp/property-reports");

        std::env::remove_var("TEST_REPORT_DIR");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[run]
input = "properties.csv"
concurrent_requests = 0

[api.endpoints]
deal = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[run]
input = "properties.csv"

[api]
request_timeout_seconds = 0
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_run_section_is_error() {
        let err = TomlConfig::from_toml_str("[api]\nbase_url = \"https://x.com\"\n").unwrap_err();
        assert!(matches!(err, EtlError::TomlError(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[run]
input = "file-test.csv"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "file-test.csv");
    }
}
