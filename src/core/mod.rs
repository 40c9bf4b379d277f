pub mod etl;
pub mod mapper;
pub mod pipeline;
pub mod report;
pub mod submitter;

pub use crate::domain::model::{
    ExtractedRow, ExtractedRows, InputRow, MappedProperty, ObjectKind, PropertyDefinition, PropertyOption,
    ResultRecord, ResultStatus, RunSummary,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
