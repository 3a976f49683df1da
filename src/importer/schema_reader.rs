// ==========================================
// Sustain 4.0 BioEngine - Schema Reader 实现
// ==========================================
// 阶段 1: 工作簿 → 强类型表（元数据/活动/交换/流映射）
// 职责: 列定位（含别名）+ 类型转换 + 行级错误收集
// 红线: 单元格错误只丢弃该行并记录,不中断后续行
// ==========================================

use crate::domain::inventory::{Activity, Exchange, LciTables, ProjectMetadata};
use crate::domain::issue::ImportIssue;
use crate::domain::types::{ExchangeKind, IssueKind};
use crate::importer::lci_importer_trait::SchemaReader as SchemaReaderTrait;
use crate::importer::workbook::{Sheet, Workbook};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

// ==========================================
// 工作表名称
// ==========================================
pub const SHEET_METADATA: &str = "Project Metadata";
pub const SHEET_ACTIVITIES: &str = "Process Activities";
pub const SHEET_EXCHANGES: &str = "Exchanges";
pub const SHEET_FLOW_MAPPING: &str = "Biosphere Flows Mapping";

/// 必需工作表
pub const REQUIRED_SHEETS: [&str; 3] = [SHEET_METADATA, SHEET_ACTIVITIES, SHEET_EXCHANGES];

// ==========================================
// 列名
// ==========================================
pub mod columns {
    pub const ACTIVITY_CODE: &str = "Activity Code";
    pub const ACTIVITY_NAME: &str = "Activity Name";
    pub const UNIT: &str = "Unit";
    pub const LOCATION: &str = "Location";
    pub const REFERENCE_PRODUCTION: &str = "Reference Production";

    pub const EXCHANGE_TYPE: &str = "Exchange Type";
    pub const FLOW_NAME: &str = "Flow Name";
    pub const AMOUNT: &str = "Amount";
    pub const CATEGORY: &str = "Category";
    pub const UNCERTAINTY: &str = "Uncertainty";
    pub const LINKED_ACTIVITY_CODE: &str = "Linked Activity Code";

    pub const USER_FLOW_NAME: &str = "User Flow Name";
    pub const BIOSPHERE_FLOW_NAME: &str = "Biosphere Flow Name";
}

/// 列名别名（模板历史版本的表头）
fn column_aliases(column: &str) -> &'static [&'static str] {
    match column {
        columns::BIOSPHERE_FLOW_NAME => &[
            "Biosphere Flow Name",
            "Biosphere3 Flow Name (Brightway)",
            "Canonical Flow Name",
        ],
        columns::LINKED_ACTIVITY_CODE => &["Linked Activity Code", "Input Activity Code"],
        columns::REFERENCE_PRODUCTION => &["Reference Production", "Reference Production Amount"],
        _ => &[],
    }
}

// ==========================================
// ColumnIndex - 表头定位
// ==========================================
struct ColumnIndex<'a> {
    header: &'a [String],
}

impl<'a> ColumnIndex<'a> {
    fn new(header: &'a [String]) -> Self {
        Self { header }
    }

    /// 定位列（先精确,再别名）
    fn find(&self, column: &str) -> Option<usize> {
        let aliases = column_aliases(column);
        std::iter::once(column)
            .chain(aliases.iter().copied())
            .find_map(|name| self.header.iter().position(|h| h.trim() == name))
    }

    /// 定位必需列;缺失列名追加到 missing
    fn require(&self, column: &'static str, missing: &mut Vec<&'static str>) -> usize {
        match self.find(column) {
            Some(idx) => idx,
            None => {
                missing.push(column);
                usize::MAX
            }
        }
    }
}

/// 读取单元格（越界视为空）
fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn optional_cell(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.map(|i| cell(row, i))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// 解析有限浮点数（拒绝 NaN/inf）
fn parse_number(value: &str) -> Result<f64, String> {
    if value.is_empty() {
        return Err("value is required".to_string());
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("cannot parse '{}' as a number", value)),
    }
}

/// 解析 "±X" 形式的不确定性
///
/// 不含 "±"、无法解析或为负时返回 None（缺失而非 0）。
pub fn parse_uncertainty(value: &str) -> Option<f64> {
    if !value.contains('±') {
        return None;
    }
    let stripped = value.replace('±', "");
    match stripped.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => None,
    }
}

// ==========================================
// RowErrors - 单行错误收集器
// ==========================================
struct RowErrors<'a> {
    sheet: &'a str,
    row: usize,
    issues: Vec<ImportIssue>,
}

impl<'a> RowErrors<'a> {
    fn new(sheet: &'a str, row: usize) -> Self {
        Self {
            sheet,
            row,
            issues: Vec::new(),
        }
    }

    fn text(&mut self, row: &[String], idx: usize, column: &str) -> String {
        let value = cell(row, idx);
        if value.is_empty() {
            self.issues.push(ImportIssue::at_cell(
                IssueKind::Parse,
                self.sheet,
                self.row,
                column,
                "value is required",
            ));
        }
        value.to_string()
    }

    fn number(&mut self, row: &[String], idx: usize, column: &str) -> f64 {
        match parse_number(cell(row, idx)) {
            Ok(v) => v,
            Err(message) => {
                self.issues.push(ImportIssue::at_cell(
                    IssueKind::Parse,
                    self.sheet,
                    self.row,
                    column,
                    message,
                ));
                0.0
            }
        }
    }

    fn push(&mut self, column: &str, message: impl Into<String>) {
        self.issues.push(ImportIssue::at_cell(
            IssueKind::Parse,
            self.sheet,
            self.row,
            column,
            message,
        ));
    }

    fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

// ==========================================
// SchemaReader - 默认实现
// ==========================================
pub struct SchemaReader;

impl SchemaReaderTrait for SchemaReader {
    fn read_tables(&self, workbook: &Workbook) -> (LciTables, Vec<ImportIssue>) {
        let mut issues = Vec::new();

        // 必需工作表缺失 → 整本工作簿不再继续解析
        let missing: Vec<&str> = REQUIRED_SHEETS
            .iter()
            .copied()
            .filter(|name| !workbook.has_sheet(name))
            .collect();
        if !missing.is_empty() {
            for name in missing {
                issues.push(ImportIssue::new(
                    IssueKind::Schema,
                    format!("Missing required sheet: {}", name),
                ));
            }
            return (LciTables::default(), issues);
        }

        let mut tables = LciTables::default();

        if let Some(sheet) = workbook.sheet(SHEET_METADATA) {
            tables.metadata = self.read_metadata(sheet);
        }
        if let Some(sheet) = workbook.sheet(SHEET_ACTIVITIES) {
            tables.activities = self.read_activities(sheet, &mut issues);
        }
        if let Some(sheet) = workbook.sheet(SHEET_EXCHANGES) {
            tables.exchanges = self.read_exchanges(sheet, &mut issues);
        }
        if let Some(sheet) = workbook.sheet(SHEET_FLOW_MAPPING) {
            tables.flow_mapping = self.read_flow_mapping(sheet, &mut issues);
        }

        debug!(
            metadata = tables.metadata.len(),
            activities = tables.activities.len(),
            exchanges = tables.exchanges.len(),
            mappings = tables.flow_mapping.len(),
            issues = issues.len(),
            "工作表解析完成"
        );

        (tables, issues)
    }
}

impl SchemaReader {
    /// 元数据: 无表头的两列键值表,键值均非空才保留
    fn read_metadata(&self, sheet: &Sheet) -> ProjectMetadata {
        let mut metadata = ProjectMetadata::new();
        for (_, row) in sheet.all_rows() {
            let key = cell(row, 0);
            let value = cell(row, 1);
            if !key.is_empty() && !value.is_empty() {
                metadata.insert(key, value);
            }
        }
        metadata
    }

    fn read_activities(&self, sheet: &Sheet, issues: &mut Vec<ImportIssue>) -> Vec<Activity> {
        let header = sheet.header().unwrap_or(&[]);
        let index = ColumnIndex::new(header);

        let mut missing = Vec::new();
        let code_idx = index.require(columns::ACTIVITY_CODE, &mut missing);
        let name_idx = index.require(columns::ACTIVITY_NAME, &mut missing);
        let unit_idx = index.require(columns::UNIT, &mut missing);
        let location_idx = index.require(columns::LOCATION, &mut missing);
        let production_idx = index.require(columns::REFERENCE_PRODUCTION, &mut missing);
        if !missing.is_empty() {
            issues.push(missing_columns_issue(&sheet.name, &missing));
            return Vec::new();
        }

        let mut activities = Vec::new();
        let mut seen_codes = HashSet::new();

        for (row_number, row) in sheet.data_rows() {
            let code = cell(row, code_idx);
            if code.is_empty() {
                continue; // 空白/填充行
            }

            let mut errors = RowErrors::new(&sheet.name, row_number);
            let name = errors.text(row, name_idx, columns::ACTIVITY_NAME);
            let unit = errors.text(row, unit_idx, columns::UNIT);
            let location = cell(row, location_idx).to_string();
            let reference_production =
                errors.number(row, production_idx, columns::REFERENCE_PRODUCTION);
            if errors.is_clean() && reference_production <= 0.0 {
                errors.push(
                    columns::REFERENCE_PRODUCTION,
                    format!("must be positive, got {}", reference_production),
                );
            }

            if !errors.is_clean() {
                issues.extend(errors.issues);
                continue;
            }

            if !seen_codes.insert(code.to_string()) {
                issues.push(
                    ImportIssue::new(
                        IssueKind::DuplicateActivityCode,
                        format!("Duplicate activity code '{}' (row {})", code, row_number),
                    )
                    .in_sheet(&sheet.name),
                );
                continue;
            }

            activities.push(Activity {
                code: code.to_string(),
                name,
                unit,
                location,
                reference_production,
                row: row_number,
            });
        }

        activities
    }

    fn read_exchanges(&self, sheet: &Sheet, issues: &mut Vec<ImportIssue>) -> Vec<Exchange> {
        let header = sheet.header().unwrap_or(&[]);
        let index = ColumnIndex::new(header);

        let mut missing = Vec::new();
        let code_idx = index.require(columns::ACTIVITY_CODE, &mut missing);
        let type_idx = index.require(columns::EXCHANGE_TYPE, &mut missing);
        let flow_idx = index.require(columns::FLOW_NAME, &mut missing);
        let amount_idx = index.require(columns::AMOUNT, &mut missing);
        let unit_idx = index.require(columns::UNIT, &mut missing);
        if !missing.is_empty() {
            issues.push(missing_columns_issue(&sheet.name, &missing));
            return Vec::new();
        }
        let category_idx = index.find(columns::CATEGORY);
        let uncertainty_idx = index.find(columns::UNCERTAINTY);
        let linked_idx = index.find(columns::LINKED_ACTIVITY_CODE);

        let mut exchanges = Vec::new();

        for (row_number, row) in sheet.data_rows() {
            let activity_code = cell(row, code_idx);
            if activity_code.is_empty() {
                continue;
            }

            let mut errors = RowErrors::new(&sheet.name, row_number);
            let raw_type = errors.text(row, type_idx, columns::EXCHANGE_TYPE);
            let kind = if raw_type.is_empty() {
                None
            } else {
                match raw_type.parse::<ExchangeKind>() {
                    Ok(kind) => Some(kind),
                    Err(message) => {
                        errors.push(columns::EXCHANGE_TYPE, message);
                        None
                    }
                }
            };
            let flow_name = errors.text(row, flow_idx, columns::FLOW_NAME);
            let amount = errors.number(row, amount_idx, columns::AMOUNT);
            let unit = errors.text(row, unit_idx, columns::UNIT);

            let kind = match kind {
                Some(kind) if errors.is_clean() => kind,
                _ => {
                    issues.extend(errors.issues);
                    continue;
                }
            };

            let uncertainty = optional_cell(row, uncertainty_idx)
                .and_then(|raw| {
                    let parsed = parse_uncertainty(&raw);
                    if parsed.is_none() {
                        debug!(row = row_number, value = %raw, "不确定性无法解析,忽略");
                    }
                    parsed
                });

            exchanges.push(Exchange {
                activity_code: activity_code.to_string(),
                kind,
                flow_name,
                amount,
                unit,
                category: optional_cell(row, category_idx),
                uncertainty,
                linked_activity_code: optional_cell(row, linked_idx),
                row: row_number,
            });
        }

        exchanges
    }

    fn read_flow_mapping(
        &self,
        sheet: &Sheet,
        issues: &mut Vec<ImportIssue>,
    ) -> BTreeMap<String, String> {
        let header = sheet.header().unwrap_or(&[]);
        let index = ColumnIndex::new(header);

        let mut missing = Vec::new();
        let user_idx = index.require(columns::USER_FLOW_NAME, &mut missing);
        let canonical_idx = index.require(columns::BIOSPHERE_FLOW_NAME, &mut missing);
        if !missing.is_empty() {
            issues.push(missing_columns_issue(&sheet.name, &missing));
            return BTreeMap::new();
        }

        let mut mapping = BTreeMap::new();
        for (_, row) in sheet.data_rows() {
            let user_name = cell(row, user_idx);
            let canonical = cell(row, canonical_idx);
            if !user_name.is_empty() && !canonical.is_empty() {
                mapping.insert(user_name.to_string(), canonical.to_string());
            }
        }
        mapping
    }
}

fn missing_columns_issue(sheet: &str, missing: &[&str]) -> ImportIssue {
    ImportIssue::new(
        IssueKind::Schema,
        format!("Sheet '{}' is missing required columns: {}", sheet, missing.join(", ")),
    )
    .in_sheet(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activities_sheet() -> Sheet {
        Sheet::new(SHEET_ACTIVITIES)
            .with_row(["Activity Code", "Activity Name", "Unit", "Location", "Reference Production"])
            .with_row(["FERM_01", "Fermentation", "kg", "BR", "1.0"])
    }

    fn exchanges_sheet(rows: &[[&str; 7]]) -> Sheet {
        let mut sheet = Sheet::new(SHEET_EXCHANGES).with_row([
            "Activity Code",
            "Exchange Type",
            "Flow Name",
            "Amount",
            "Unit",
            "Category",
            "Uncertainty",
        ]);
        for row in rows {
            sheet.push_row(row.iter());
        }
        sheet
    }

    fn workbook(exchanges: Sheet) -> Workbook {
        Workbook::new()
            .with_sheet(
                Sheet::new(SHEET_METADATA)
                    .with_row(["Project Name", "Bioethanol"])
                    .with_row(["Scale", ""]),
            )
            .with_sheet(activities_sheet())
            .with_sheet(exchanges)
    }

    #[test]
    fn test_parse_uncertainty() {
        assert_eq!(parse_uncertainty("±0.1"), Some(0.1));
        assert_eq!(parse_uncertainty(" ± 0.05 "), Some(0.05));
        assert_eq!(parse_uncertainty("0.1"), None);
        assert_eq!(parse_uncertainty("±abc"), None);
        assert_eq!(parse_uncertainty("±-0.1"), None);
        assert_eq!(parse_uncertainty(""), None);
    }

    #[test]
    fn test_missing_required_sheets_reported_together() {
        let workbook = Workbook::new().with_sheet(activities_sheet());
        let (tables, issues) = SchemaReader.read_tables(&workbook);

        assert!(tables.activities.is_empty());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Schema));
        assert!(issues[0].message.contains(SHEET_METADATA));
        assert!(issues[1].message.contains(SHEET_EXCHANGES));
    }

    #[test]
    fn test_table_below_blank_rows_is_read() {
        let mut activities = Sheet::new(SHEET_ACTIVITIES);
        activities.rows.push(Vec::new());
        activities.push_row(["Activity Code", "Activity Name", "Unit", "Location", "Reference Production"]);
        activities.push_row(["FERM_01", "Fermentation", "kg", "BR", "1.0"]);
        activities.push_row(["DIST_01", "Distillation", "L", "BR", "zero"]);

        let workbook = Workbook::new()
            .with_sheet(Sheet::new(SHEET_METADATA).with_row(["Project Name", "Bioethanol"]))
            .with_sheet(activities)
            .with_sheet(exchanges_sheet(&[[
                "FERM_01", "production", "Fermented mass", "1.0", "kg", "", "",
            ]]));
        let (tables, issues) = SchemaReader.read_tables(&workbook);

        assert_eq!(tables.activities.len(), 1);
        assert_eq!(tables.activities[0].code, "FERM_01");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Parse);
        assert_eq!(issues[0].row, Some(4));
        assert_eq!(issues[0].column.as_deref(), Some("Reference Production"));
    }

    #[test]
    fn test_read_metadata_skips_empty_values() {
        let (tables, issues) = SchemaReader.read_tables(&workbook(exchanges_sheet(&[])));
        assert!(issues.is_empty());
        assert_eq!(tables.metadata.len(), 1);
        assert_eq!(tables.metadata.get("Project Name"), Some("Bioethanol"));
    }

    #[test]
    fn test_read_exchanges_normalizes_kind_and_optional_fields() {
        let sheet = exchanges_sheet(&[
            ["FERM_01", "Production", "Fermented mass", "1.0", "kg", "", ""],
            ["FERM_01", "EMISSION", "CO2, biogenic", "0.9", "kg", "air", "±0.05"],
            ["", "input", "filler", "x", "kg", "", ""],
        ]);
        let (tables, issues) = SchemaReader.read_tables(&workbook(sheet));

        assert!(issues.is_empty());
        assert_eq!(tables.exchanges.len(), 2);
        assert_eq!(tables.exchanges[0].kind, ExchangeKind::Production);
        assert_eq!(tables.exchanges[0].category, None);
        assert_eq!(tables.exchanges[0].uncertainty, None);
        assert_eq!(tables.exchanges[1].kind, ExchangeKind::Emission);
        assert_eq!(tables.exchanges[1].category.as_deref(), Some("air"));
        assert_eq!(tables.exchanges[1].uncertainty, Some(0.05));
        assert_eq!(tables.exchanges[1].row, 3);
    }

    #[test]
    fn test_bad_cell_drops_row_and_continues() {
        let sheet = exchanges_sheet(&[
            ["FERM_01", "production", "Fermented mass", "abc", "kg", "", ""],
            ["FERM_01", "output", "Something", "1.0", "kg", "", ""],
            ["FERM_01", "input", "Water", "5.0", "kg", "material", ""],
        ]);
        let (tables, issues) = SchemaReader.read_tables(&workbook(sheet));

        assert_eq!(tables.exchanges.len(), 1);
        assert_eq!(tables.exchanges[0].flow_name, "Water");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::Parse);
        assert_eq!(issues[0].row, Some(2));
        assert_eq!(issues[0].column.as_deref(), Some(columns::AMOUNT));
        assert_eq!(issues[1].column.as_deref(), Some(columns::EXCHANGE_TYPE));
    }

    #[test]
    fn test_nan_amount_is_rejected() {
        let sheet = exchanges_sheet(&[["FERM_01", "production", "Product", "NaN", "kg", "", ""]]);
        let (tables, issues) = SchemaReader.read_tables(&workbook(sheet));

        assert!(tables.exchanges.is_empty());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("NaN"));
    }

    #[test]
    fn test_activity_validation_rules() {
        let sheet = Sheet::new(SHEET_ACTIVITIES)
            .with_row(["Activity Code", "Activity Name", "Unit", "Location", "Reference Production"])
            .with_row(["A", "Alpha", "kg", "", "1"])
            .with_row(["B", "Beta", "kg", "BR", "0"])
            .with_row(["C", "", "kg", "BR", "1"])
            .with_row(["A", "Alpha again", "kg", "BR", "2"]);
        let workbook = Workbook::new()
            .with_sheet(Sheet::new(SHEET_METADATA))
            .with_sheet(sheet)
            .with_sheet(exchanges_sheet(&[]));

        let (tables, issues) = SchemaReader.read_tables(&workbook);

        assert_eq!(tables.activities.len(), 1);
        assert_eq!(tables.activities[0].location, "");
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::Parse, IssueKind::Parse, IssueKind::DuplicateActivityCode]
        );
    }

    #[test]
    fn test_missing_required_column() {
        let sheet = Sheet::new(SHEET_EXCHANGES).with_row(["Activity Code", "Exchange Type", "Flow Name", "Unit"]);
        let (tables, issues) = SchemaReader.read_tables(&workbook(sheet));

        assert!(tables.exchanges.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Schema);
        assert!(issues[0].message.contains("Amount"));
    }

    #[test]
    fn test_flow_mapping_accepts_template_header_alias() {
        let mapping = Sheet::new(SHEET_FLOW_MAPPING)
            .with_row(["User Flow Name", "Biosphere3 Flow Name (Brightway)"])
            .with_row(["CO2, biogenic", "Carbon dioxide, non-fossil"])
            .with_row(["Wastewater", ""]);
        let workbook = workbook(exchanges_sheet(&[])).with_sheet(mapping);

        let (tables, issues) = SchemaReader.read_tables(&workbook);

        assert!(issues.is_empty());
        assert_eq!(tables.flow_mapping.len(), 1);
        assert_eq!(
            tables.flow_mapping.get("CO2, biogenic").map(String::as_str),
            Some("Carbon dioxide, non-fossil")
        );
    }

    #[test]
    fn test_linked_activity_code_column() {
        let sheet = Sheet::new(SHEET_EXCHANGES)
            .with_row(["Activity Code", "Exchange Type", "Flow Name", "Amount", "Unit", "Input Activity Code"])
            .with_row(["FERM_01", "input", "Juice", "1.8", "kg", "PRESS_01"]);
        let (tables, _) = SchemaReader.read_tables(&workbook(sheet));

        assert_eq!(tables.exchanges[0].linked_activity_code.as_deref(), Some("PRESS_01"));
        assert_eq!(tables.exchanges[0].category, None);
    }
}
