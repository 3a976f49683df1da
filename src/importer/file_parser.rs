// ==========================================
// Sustain 4.0 BioEngine - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析 → Workbook
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls/.ods) / CSV 目录（每个工作表一个 .csv）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::lci_importer_trait::FileParser;
use crate::importer::workbook::{Sheet, Workbook};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开工作簿（按扩展名自动选择格式）
        let mut excel = open_workbook_auto(path)?;

        let mut workbook = Workbook::new();
        for sheet_name in excel.sheet_names() {
            let range = excel.worksheet_range(&sheet_name)?;

            // Range 从第一个非空单元格开始,补齐偏移以保持行号与列位置
            let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
            let mut sheet = Sheet::new(sheet_name.trim());
            for _ in 0..row_offset {
                sheet.rows.push(Vec::new());
            }

            for data_row in range.rows() {
                let mut cells: Vec<String> = vec![String::new(); col_offset as usize];
                cells.extend(data_row.iter().map(|cell| cell.to_string().trim().to_string()));
                sheet.rows.push(cells);
            }

            debug!(sheet = %sheet.name, rows = sheet.rows.len(), "工作表读取完成");
            workbook.add_sheet(sheet);
        }

        if workbook.sheets().is_empty() {
            return Err(ImportError::ExcelParseError(
                "workbook has no worksheets".to_string(),
            ));
        }

        Ok(workbook)
    }
}

// ==========================================
// CSV 目录 Parser 实现
// ==========================================
// 目录中每个 `<工作表名>.csv` 对应一个工作表
pub struct CsvDirectoryParser;

impl FileParser for CsvDirectoryParser {
    fn parse_workbook(&self, dir_path: &Path) -> ImportResult<Workbook> {
        if !dir_path.exists() {
            return Err(ImportError::FileNotFound(dir_path.display().to_string()));
        }
        if !dir_path.is_dir() {
            return Err(ImportError::UnsupportedFormat(format!(
                "{} is not a directory",
                dir_path.display()
            )));
        }

        // 按文件名排序,保证工作表顺序稳定
        let mut csv_files = Vec::new();
        for entry in fs::read_dir(dir_path)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if path.is_file() && is_csv {
                csv_files.push(path);
            }
        }
        csv_files.sort();

        let mut workbook = Workbook::new();
        for path in csv_files {
            let sheet_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let file = File::open(&path)?;
            let mut reader = ReaderBuilder::new()
                .has_headers(false) // 表头作为第 1 行保留
                .flexible(true) // 允许行长度不一致
                .from_reader(file);

            let mut sheet = Sheet::new(sheet_name);
            for result in reader.records() {
                let record = result?;
                sheet.push_row(record.iter());
            }

            debug!(sheet = %sheet.name, rows = sheet.rows.len(), "CSV 工作表读取完成");
            workbook.add_sheet(sheet);
        }

        if workbook.sheets().is_empty() {
            return Err(ImportError::CsvParseError(format!(
                "no .csv sheets found in {}",
                dir_path.display()
            )));
        }

        Ok(workbook)
    }
}

// ==========================================
// 通用文件解析器（根据路径自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_workbook(&self, file_path: &Path) -> ImportResult<Workbook> {
        if file_path.is_dir() {
            return CsvDirectoryParser.parse_workbook(file_path);
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            ExcelParser.parse_workbook(file_path)
        } else if !file_path.exists() {
            Err(ImportError::FileNotFound(file_path.display().to_string()))
        } else {
            Err(ImportError::UnsupportedFormat(ext))
        }
    }
}
