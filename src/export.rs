//! スキャン履歴のエクスポート（Excel / JSON）

use crate::error::{EcoScanError, Result};
use crate::store::average_score;
use eco_scan_common::{rating_label, ImpactTier, ScanResult};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Excel,
    Json,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "json" => Ok(ExportFormat::Json),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use excel, json, or both", s)),
        }
    }
}

/// 出力先がディレクトリ（または拡張子なし）ならファイル名を補う
fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.with_extension(extension)
    }
}

fn xlsx_error(e: XlsxError) -> EcoScanError {
    EcoScanError::ExcelGeneration(e.to_string())
}

/// 履歴をExcelに出力（Scans / Items の2シート）
pub fn write_excel(history: &[ScanResult], output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let scans = workbook.add_worksheet();
    scans.set_name("Scans").map_err(xlsx_error)?;
    for (col, title) in ["Date", "Scan ID", "Score", "Rating", "Items", "High impact"]
        .iter()
        .enumerate()
    {
        scans
            .write_string_with_format(0, col as u16, *title, &header)
            .map_err(xlsx_error)?;
    }
    for (i, scan) in history.iter().enumerate() {
        let row = i as u32 + 1;
        let high = scan
            .items
            .iter()
            .filter(|item| item.impact == ImpactTier::High)
            .count();
        scans
            .write_string(row, 0, scan.created_at.format("%Y-%m-%d %H:%M").to_string())
            .map_err(xlsx_error)?;
        scans.write_string(row, 1, &scan.id).map_err(xlsx_error)?;
        scans
            .write_number(row, 2, f64::from(scan.total_score))
            .map_err(xlsx_error)?;
        scans
            .write_string(row, 3, rating_label(scan.total_score))
            .map_err(xlsx_error)?;
        scans
            .write_number(row, 4, scan.items.len() as f64)
            .map_err(xlsx_error)?;
        scans.write_number(row, 5, high as f64).map_err(xlsx_error)?;
    }
    let summary_row = history.len() as u32 + 2;
    scans
        .write_string_with_format(summary_row, 1, "Average", &header)
        .map_err(xlsx_error)?;
    scans
        .write_number(summary_row, 2, f64::from(average_score(history)))
        .map_err(xlsx_error)?;
    scans.set_column_width(0, 18).map_err(xlsx_error)?;
    scans.set_column_width(1, 20).map_err(xlsx_error)?;

    let items = workbook.add_worksheet();
    items.set_name("Items").map_err(xlsx_error)?;
    for (col, title) in ["Scan ID", "Item", "Score", "Impact", "Alternatives"]
        .iter()
        .enumerate()
    {
        items
            .write_string_with_format(0, col as u16, *title, &header)
            .map_err(xlsx_error)?;
    }
    let mut row = 1u32;
    for scan in history {
        for item in &scan.items {
            items.write_string(row, 0, &scan.id).map_err(xlsx_error)?;
            items.write_string(row, 1, &item.name).map_err(xlsx_error)?;
            items
                .write_number(row, 2, f64::from(item.score))
                .map_err(xlsx_error)?;
            items
                .write_string(row, 3, item.impact.as_str())
                .map_err(xlsx_error)?;
            items
                .write_string(row, 4, item.alternatives.join(", "))
                .map_err(xlsx_error)?;
            row += 1;
        }
    }
    items.set_column_width(0, 20).map_err(xlsx_error)?;
    items.set_column_width(1, 28).map_err(xlsx_error)?;
    items.set_column_width(4, 40).map_err(xlsx_error)?;

    workbook.save(output_path).map_err(xlsx_error)?;
    Ok(())
}

pub fn write_json(history: &[ScanResult], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(history)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// 履歴をエクスポートし、書き出したパスを返す
pub fn export_history(
    history: &[ScanResult],
    format: &ExportFormat,
    output: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_path_for_format(output, title, "xlsx");
        write_excel(history, &path)?;
        written.push(path);
    }
    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let path = output_path_for_format(output, title, "json");
        write_json(history, &path)?;
        written.push(path);
    }

    tracing::info!(scans = history.len(), files = written.len(), "history exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_output_path_for_format() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path_for_format(dir.path(), "history", "xlsx"),
            dir.path().join("history.xlsx")
        );
        assert_eq!(
            output_path_for_format(Path::new("out/report.xlsx"), "history", "json"),
            PathBuf::from("out/report.json")
        );
    }
}
