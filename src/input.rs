//! 入力ファイル読み込みモジュール
//!
//! 抽出済みテキスト(.txt)、CSV、スプレッドシート(.xlsx/.xls)を
//! パイプラインの入力形式（RawText / StructuredTable）へ変換する。
//! OCRやPDF解析はここでは扱わない（外部サービスの責務）。

use crate::error::{Result, RubricAiError};
use calamine::{open_workbook_auto, Data, Reader};
use rubric_ai_common::{RubricInput, SheetTable};
use std::path::Path;

/// ファイルを読み込んでパイプライン入力へ変換する
pub fn read_input(path: &Path) -> Result<RubricInput> {
    if !path.exists() {
        return Err(RubricAiError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "text" => {
            let text = std::fs::read_to_string(path)?;
            Ok(RubricInput::Text(text))
        }
        "csv" => {
            let content = std::fs::read_to_string(path)?;
            let name = path
                .file_stem()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(RubricInput::Table(vec![sheet_from_csv(&name, &content)]))
        }
        "xlsx" | "xls" | "xlsm" => Ok(RubricInput::Table(read_spreadsheet(path)?)),
        other => Err(RubricAiError::UnsupportedFormat(other.to_string())),
    }
}

/// スプレッドシートを全シート分のSheetTableへ読み込む
pub fn read_spreadsheet(path: &Path) -> Result<Vec<SheetTable>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| RubricAiError::Spreadsheet(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::new();

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| RubricAiError::Spreadsheet(e.to_string()))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        sheets.push(SheetTable { sheet_name, rows });
    }

    Ok(sheets)
}

/// セル値を文字列へ変換
///
/// 整数値の小数表記（"2.0"）は裸の整数として扱えるように丸める。
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// CSV文字列を1シート分のSheetTableへ変換する
pub fn sheet_from_csv(name: &str, content: &str) -> SheetTable {
    let rows = content
        .lines()
        .map(parse_csv_line)
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .collect();

    SheetTable {
        sheet_name: name.to_string(),
        rows,
    }
}

/// CSV行をパース（ダブルクォート対応）
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_input_missing_file() {
        let result = read_input(Path::new("/nonexistent/rubric.txt"));
        assert!(matches!(result, Err(RubricAiError::FileNotFound(_))));
    }

    #[test]
    fn test_read_input_unsupported_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rubric.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-")
            .unwrap();

        let result = read_input(&path);
        assert!(matches!(result, Err(RubricAiError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_read_input_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rubric.txt");
        std::fs::write(&path, "1. History Taking (10 points)").unwrap();

        let input = read_input(&path).unwrap();
        match input {
            RubricInput::Text(text) => assert!(text.contains("History Taking")),
            _ => panic!("expected text input"),
        }
    }

    #[test]
    fn test_read_input_csv_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rubric.csv");
        std::fs::write(&path, "HISTORY TAKING,,10\n\"asks, open ended\",detail,2\n").unwrap();

        let input = read_input(&path).unwrap();
        match input {
            RubricInput::Table(sheets) => {
                assert_eq!(sheets.len(), 1);
                assert_eq!(sheets[0].sheet_name, "rubric");
                assert_eq!(sheets[0].rows.len(), 2);
                // クォート内のカンマは区切りにならない
                assert_eq!(sheets[0].rows[1][0], "asks, open ended");
            }
            _ => panic!("expected table input"),
        }
    }

    #[test]
    fn test_parse_csv_line_quotes() {
        let fields = parse_csv_line(r#""a, b",c,"d""#);
        assert_eq!(fields, vec!["a, b".to_string(), "c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_parse_csv_line_empty_fields() {
        let fields = parse_csv_line("a,,c");
        assert_eq!(fields, vec!["a".to_string(), "".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_sheet_from_csv_skips_blank_rows() {
        let sheet = sheet_from_csv("test", "a,b\n,,\nc,d\n");
        assert_eq!(sheet.rows.len(), 2);
    }
}
