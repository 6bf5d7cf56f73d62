//! # XLSX Export Module
//!
//! Renders credential records into a single-sheet workbook held in memory.
//!
//! The layout is fixed: a styled `UID | PASSWORD | COOKIE` header, one row per
//! record in submission order, a frozen header row and an autofilter over the
//! populated range. Only the cookie column wraps its text.

use chrono::{Local, NaiveDateTime};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use tracing::{debug, info};

use crate::credential_parser::{CredentialRecord, CredentialTriple};
use crate::credential_patterns::FILENAME_REGEX;
use crate::errors::{Field, RenderError, ValidationError};

pub const HEADERS: [&str; 3] = [
    Field::Uid.header(),
    Field::Password.header(),
    Field::Cookie.header(),
];

pub const DOCUMENT_SHEET_NAME: &str = "DATA";
pub const INVENTORY_SHEET_NAME: &str = "INVENTORY";
pub const DOCUMENT_FILENAME_PREFIX: &str = "facebook_accounts";
pub const INVENTORY_FILENAME_PREFIX: &str = "inventory_export";

/// Visual settings for the rendered sheet
#[derive(Debug, Clone)]
pub struct SheetStyle {
    pub font_name: String,
    pub header_font_size: f64,
    pub data_font_size: f64,
    /// RGB fill behind the header cells
    pub header_fill: u32,
    pub header_row_height: f64,
    /// UID, PASSWORD, COOKIE widths in character units
    pub column_widths: [f64; 3],
}

impl Default for SheetStyle {
    fn default() -> Self {
        Self {
            font_name: "Calibri".to_string(),
            header_font_size: 13.0,
            data_font_size: 11.0,
            header_fill: 0x1F4E78,
            header_row_height: 24.0,
            column_widths: [22.0, 25.0, 80.0],
        }
    }
}

/// A rendered workbook and the name it should be sent under
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The cell grid written to the sheet: header row followed by one row per record
pub fn sheet_rows(records: &[CredentialRecord]) -> Vec<[&str; 3]> {
    std::iter::once(HEADERS)
        .chain(
            records
                .iter()
                .map(|r| [r.uid.as_str(), r.password.as_str(), r.cookie.as_str()]),
        )
        .collect()
}

/// Render a validated triple into the `DATA` sheet
pub fn render_triple(triple: &CredentialTriple) -> Result<Vec<u8>, RenderError> {
    render_records(DOCUMENT_SHEET_NAME, &triple.records(), &SheetStyle::default())
}

/// Render arbitrary records with the shared layout
pub fn render_records(
    sheet_name: &str,
    records: &[CredentialRecord],
    style: &SheetStyle,
) -> Result<Vec<u8>, RenderError> {
    debug!(sheet = sheet_name, records = records.len(), "Rendering workbook");

    let header_format = Format::new()
        .set_font_name(style.font_name.as_str())
        .set_font_size(style.header_font_size)
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(style.header_fill))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Medium)
        .set_border_color(Color::Black);

    let data_format = Format::new()
        .set_font_name(style.font_name.as_str())
        .set_font_size(style.data_font_size)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Medium)
        .set_border_color(Color::Black);
    let wrapped_data_format = data_format.clone().set_text_wrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let last_row = row_index(records.len())?;
    for (row, cells) in sheet_rows(records).iter().enumerate() {
        let row = row_index(row)?;
        for (col, value) in cells.iter().enumerate() {
            let format = match (row, col) {
                (0, _) => &header_format,
                (_, 2) => &wrapped_data_format,
                _ => &data_format,
            };
            worksheet.write_string_with_format(row, col as u16, *value, format)?;
        }
    }

    for (col, width) in style.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    worksheet.set_row_height(0, style.header_row_height)?;
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, last_row, 2)?;

    let buffer = workbook.save_to_buffer()?;
    info!(
        sheet = sheet_name,
        records = records.len(),
        bytes = buffer.len(),
        "Workbook rendered"
    );
    Ok(buffer)
}

fn row_index(row: usize) -> Result<u32, RenderError> {
    u32::try_from(row).map_err(|_| RenderError::RenderFailure("too many rows".to_string()))
}

/// Empty input is allowed and means "use a timestamped name"
pub fn validate_filename(raw: &str) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || FILENAME_REGEX.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFilename)
    }
}

/// `<name>.xlsx`, or `<prefix>_<YYYYMMDD_HHMMSS>.xlsx` from local time when `raw` is blank
pub fn build_filename(raw: &str, prefix: &str) -> String {
    build_filename_at(raw, prefix, Local::now().naive_local())
}

pub fn build_filename_at(raw: &str, prefix: &str, now: NaiveDateTime) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("{prefix}_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
    } else {
        format!("{trimmed}.xlsx")
    }
}

/// Validate the requested name, render the records and bundle both for sending
pub fn export_records(
    raw_filename: &str,
    prefix: &str,
    sheet_name: &str,
    records: &[CredentialRecord],
) -> Result<ExportDocument, ExportError> {
    validate_filename(raw_filename)?;
    let bytes = render_records(sheet_name, records, &SheetStyle::default())?;
    Ok(ExportDocument {
        filename: build_filename(raw_filename, prefix),
        bytes,
    })
}

/// Either the requested file name was rejected or rendering failed
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_filename_validation() {
        assert!(validate_filename("").is_ok());
        assert!(validate_filename("   ").is_ok());
        assert!(validate_filename("batch_01-final").is_ok());
        assert!(validate_filename("bad name").is_err());
        assert!(validate_filename("report.xlsx").is_err());
        assert!(validate_filename(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_build_filename() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(
            build_filename_at("", DOCUMENT_FILENAME_PREFIX, now),
            "facebook_accounts_20240309_070501.xlsx"
        );
        assert_eq!(
            build_filename_at(" batch ", DOCUMENT_FILENAME_PREFIX, now),
            "batch.xlsx"
        );
    }

    #[test]
    fn test_sheet_rows_header_first() {
        let records = vec![CredentialRecord {
            uid: "12345678".to_string(),
            password: "Secret1".to_string(),
            cookie: "c_user=12345678;xs=abcdef;".to_string(),
        }];
        let rows = sheet_rows(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["UID", "PASSWORD", "COOKIE"]);
        assert_eq!(rows[1][0], "12345678");
    }

    #[test]
    fn test_row_index_is_checked() {
        assert_eq!(row_index(0).unwrap(), 0);
        assert_eq!(row_index(1_048_575).unwrap(), 1_048_575);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            row_index(usize::MAX),
            Err(RenderError::RenderFailure(_))
        ));
    }
}
