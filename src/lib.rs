pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{etl::EtlEngine, pipeline::PropertyPipeline, report::PdfReport};
pub use domain::model::{ObjectKind, ResultRecord, ResultStatus, RunSummary};
pub use utils::error::{EtlError, Result};
