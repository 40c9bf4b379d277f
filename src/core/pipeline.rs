use crate::core::mapper::map_row;
use crate::core::report::PdfReport;
use crate::core::submitter::{PropertyEndpoints, PropertySubmitter};
use crate::core::{
    ConfigProvider, ExtractedRow, ExtractedRows, InputRow, Pipeline, Result, ResultRecord,
    RunSummary, Storage,
};
use crate::utils::error::EtlError;
use csv::{ByteRecord, StringRecord};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;

pub struct PropertyPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    submitter: PropertySubmitter,
}

impl<S: Storage, C: ConfigProvider> PropertyPipeline<S, C> {
    pub fn new(storage: S, config: C, access_token: impl Into<String>) -> Self {
        let endpoints = PropertyEndpoints::resolve(|kind| config.endpoint(kind));
        let timeout = config.request_timeout_seconds().map(Duration::from_secs);

        Self {
            storage,
            submitter: PropertySubmitter::new(Client::new(), access_token, endpoints, timeout),
            config,
        }
    }

    async fn process_row(&self, extracted: &ExtractedRow) -> ResultRecord {
        let row = &extracted.row;

        if let Some(error) = &extracted.decode_error {
            tracing::warn!("⚠️ Line {} skipped: {}", extracted.line, error);
            return ResultRecord::invalid_object(row, error.clone());
        }

        match map_row(row) {
            Ok(mapped) => {
                self.submitter
                    .submit(mapped.kind, &mapped.definition)
                    .await
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Line {} ('{}') skipped: {}",
                    extracted.line,
                    row.name.trim(),
                    e
                );
                ResultRecord::invalid_object(row, e.to_string())
            }
        }
    }
}

/// Parses every data row. A row that fails to decode is kept with its error; only a
/// failure of the reader itself (or an unreadable header) ends the stream.
pub fn read_rows(data: &[u8], delimiter: u8) -> ExtractedRows {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let mut extracted = ExtractedRows::default();

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            extracted.stream_error = Some(format!("Input stream error: {}", EtlError::from(e)));
            return extracted;
        }
    };

    for result in reader.byte_records() {
        match result {
            Ok(record) => extracted.rows.push(decode_row(&record, &headers)),
            Err(e) => {
                extracted.stream_error =
                    Some(format!("Input stream error: {}", EtlError::from(e)));
                break;
            }
        }
    }
    extracted
}

fn decode_row(record: &ByteRecord, headers: &StringRecord) -> ExtractedRow {
    let line = record.position().map(|p| p.line()).unwrap_or_default();

    let (fields, mut decode_error) = match StringRecord::from_byte_record(record.clone()) {
        Ok(fields) => (fields, None),
        Err(e) => (
            StringRecord::from_byte_record_lossy(record.clone()),
            Some(format!(
                "Invalid UTF-8 in field {} on line {}; save the file as UTF-8",
                e.utf8_error().field() + 1,
                line
            )),
        ),
    };

    let row = match fields.deserialize::<InputRow>(Some(headers)) {
        Ok(row) => row,
        Err(e) => {
            if decode_error.is_none() {
                decode_error = Some(EtlError::from(e).to_string());
            }
            InputRow::default()
        }
    };

    ExtractedRow {
        line,
        row,
        decode_error,
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PropertyPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedRows> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input file: {}", input_path);

        let data = match self.storage.read_file(input_path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("❌ Could not read input file '{}': {}", input_path, e);
                return Ok(ExtractedRows {
                    rows: Vec::new(),
                    stream_error: Some(format!(
                        "Failed to read input file '{}': {}",
                        input_path, e
                    )),
                });
            }
        };

        let extracted = read_rows(&data, self.config.delimiter());
        if let Some(error) = &extracted.stream_error {
            tracing::error!(
                "❌ Input stopped after {} rows: {}",
                extracted.rows.len(),
                error
            );
        }

        Ok(extracted)
    }

    async fn transform(&self, data: ExtractedRows) -> Result<Vec<ResultRecord>> {
        let limit = self.config.concurrent_requests().max(1);
        tracing::debug!(
            "Submitting {} rows with up to {} requests in flight",
            data.rows.len(),
            limit
        );

        let ExtractedRows { rows, stream_error } = data;

        let mut results: Vec<ResultRecord> = stream::iter(rows)
            .map(|row| async move { self.process_row(&row).await })
            .buffered(limit)
            .collect()
            .await;

        if let Some(error) = stream_error {
            results.push(ResultRecord::critical(error));
        }

        Ok(results)
    }

    async fn load(&self, results: Vec<ResultRecord>) -> Result<RunSummary> {
        let file_name = PdfReport::write(&self.storage, &results).await?;
        let report_path = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            file_name
        );

        tracing::debug!("Report saved successfully");
        Ok(RunSummary {
            report_path,
            results,
        })
    }
}
