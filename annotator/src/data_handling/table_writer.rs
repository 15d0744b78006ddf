use polars::prelude::*;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use std::path::Path;
use tracing::info;

use crate::error::AnnotatorError;
use crate::helper_functions::dataframe_to_csv;
use crate::models::MOLECULAR_WEIGHT;

/// Writes `df` with a header row. The format follows the extension: `.xlsx`
/// workbook, `.tsv` tab-separated, anything else comma-separated.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<(), AnnotatorError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("xlsx") => write_xlsx(df, path)?,
        Some("tsv") => dataframe_to_csv(df, path, b'\t')?,
        _ => dataframe_to_csv(df, path, b',')?,
    }

    info!("Saved {} rows as {}", df.height(), path.display());
    Ok(())
}

fn write_xlsx(df: &DataFrame, path: &Path) -> Result<(), AnnotatorError> {
    let mut workbook = Workbook::new();
    // Fixed creation time keeps reruns byte-identical.
    let properties = DocProperties::new().set_creation_datetime(&ExcelDateTime::from_ymd(2024, 1, 1)?);
    workbook.set_properties(&properties);

    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col = col_idx as u16;
        let name = column.name().as_str();
        worksheet.write_string_with_format(0, col, name, &header)?;

        let values = column.cast(&DataType::String)?;
        for (row_idx, value) in values.str()?.into_iter().enumerate() {
            let row = row_idx as u32 + 1;
            let Some(value) = value else {
                continue;
            };
            match value.parse::<f64>() {
                Ok(number) if name == MOLECULAR_WEIGHT => {
                    worksheet.write_number(row, col, number)?;
                }
                _ => {
                    worksheet.write_string(row, col, value)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
