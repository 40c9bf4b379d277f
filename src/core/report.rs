//! PDF report of property creation outcomes.
//!
//! Pages are A4 with the base-14 Helvetica fonts, so no font files are embedded.
//! Text outside printable ASCII is replaced with `?` because the fonts use WinAnsi
//! encoding and the content stream writes raw bytes.

use crate::core::{ResultRecord, ResultStatus, Result, Storage};
use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const REPORT_TITLE: &str = "CRM Property Creation Report";
pub const EMPTY_PLACEHOLDER: &str = "No property results to report.";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: f32 = 50.0;
const LINE_HEIGHT: f32 = 14.0;
const BODY_SIZE: i64 = 10;
const TITLE_SIZE: i64 = 18;
const WRAP_COLUMNS: usize = 90;

type Rgb = (f32, f32, f32);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const GREY: Rgb = (0.4, 0.4, 0.4);

fn status_color(status: ResultStatus) -> Rgb {
    match status {
        ResultStatus::Success => (0.0, 0.5, 0.0),
        ResultStatus::Failure => (0.8, 0.0, 0.0),
        ResultStatus::InvalidObject => (0.9, 0.5, 0.0),
        ResultStatus::CriticalError => (0.5, 0.0, 0.0),
    }
}

/// `property_report_20261019_142501_123.pdf`; milliseconds keep back-to-back runs apart.
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("property_report_{}.pdf", at.format("%Y%m%d_%H%M%S_%3f"))
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageWriter {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT as f32 - MARGIN,
        }
    }

    fn remaining_lines(&self) -> usize {
        let space = self.y - MARGIN - LINE_HEIGHT;
        if space <= 0.0 {
            0
        } else {
            (space / LINE_HEIGHT) as usize
        }
    }

    fn ensure_lines(&mut self, lines: usize) {
        if lines > self.remaining_lines() && !self.current.is_empty() {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT as f32 - MARGIN;
    }

    fn text(&mut self, font: Font, size: i64, color: Rgb, indent: f32, text: &str) {
        if self.remaining_lines() == 0 {
            self.new_page();
        }
        self.current.extend(text_operations(
            font,
            size,
            color,
            MARGIN + indent,
            self.y,
            text,
        ));
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self, lines: f32) {
        self.y -= LINE_HEIGHT * lines;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

fn text_operations(font: Font, size: i64, color: Rgb, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.resource_name().into(), size.into()]),
        Operation::new("rg", vec![real(color.0), real(color.1), real(color.2)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new("Tj", vec![Object::string_literal(pdf_text(text))]),
        Operation::new("ET", vec![]),
    ]
}

fn record_lines(record: &ResultRecord) -> Vec<(Font, Rgb, String)> {
    let mut lines = vec![
        (Font::Bold, BLACK, format!("Object: {}", record.object_type)),
        (Font::Regular, BLACK, format!("Name: {}", record.name)),
        (Font::Regular, BLACK, format!("Label: {}", record.label)),
        (
            Font::Bold,
            status_color(record.status),
            format!("Status: {}", record.status),
        ),
    ];

    if let Some(message) = &record.error_message {
        for (i, line) in wrap_text(message, WRAP_COLUMNS).into_iter().enumerate() {
            let text = if i == 0 {
                format!("Error: {}", line)
            } else {
                format!("       {}", line)
            };
            lines.push((Font::Regular, status_color(record.status), text));
        }
    }

    lines.push((
        Font::Regular,
        GREY,
        format!(
            "Timestamp: {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC")
        ),
    ));
    lines
}

fn summary_line(records: &[ResultRecord]) -> String {
    let count = |status: ResultStatus| records.iter().filter(|r| r.status == status).count();
    format!(
        "Total: {}   Success: {}   Failure: {}   Invalid Object: {}   Critical Error: {}",
        records.len(),
        count(ResultStatus::Success),
        count(ResultStatus::Failure),
        count(ResultStatus::InvalidObject),
        count(ResultStatus::CriticalError),
    )
}

pub struct PdfReport;

impl PdfReport {
    pub fn render(records: &[ResultRecord], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut writer = PageWriter::new();

        writer.text(Font::Bold, TITLE_SIZE, BLACK, 0.0, REPORT_TITLE);
        writer.gap(0.5);
        writer.text(
            Font::Regular,
            BODY_SIZE,
            GREY,
            0.0,
            &format!(
                "Generated: {}",
                generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        );
        writer.text(Font::Regular, BODY_SIZE, BLACK, 0.0, &summary_line(records));
        writer.gap(1.0);

        if records.is_empty() {
            writer.text(Font::Regular, BODY_SIZE, GREY, 0.0, EMPTY_PLACEHOLDER);
        }

        for record in records {
            let lines = record_lines(record);
            writer.ensure_lines(lines.len());
            for (font, color, text) in &lines {
                writer.text(*font, BODY_SIZE, *color, 0.0, text);
            }
            writer.gap(1.0);
        }

        Self::assemble(writer.finish())
    }

    fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let total = pages.len();
        let mut kids: Vec<Object> = Vec::with_capacity(total);
        for (index, mut operations) in pages.into_iter().enumerate() {
            let footer = format!("Page {} of {}", index + 1, total);
            operations.extend(text_operations(
                Font::Regular,
                8,
                GREY,
                PAGE_WIDTH as f32 - MARGIN - 60.0,
                MARGIN / 2.0,
                &footer,
            ));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => total as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Renders the report and stores it under a timestamped name; returns that name.
    pub async fn write<S: Storage>(storage: &S, records: &[ResultRecord]) -> Result<String> {
        let generated_at = Utc::now();
        let file_name = report_file_name(generated_at);
        let pdf = Self::render(records, generated_at)?;

        tracing::debug!("Writing report ({} bytes) as {}", pdf.len(), file_name);
        storage.write_file(&file_name, &pdf).await?;
        Ok(file_name)
    }
}
