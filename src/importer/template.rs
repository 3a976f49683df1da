// ==========================================
// Sustain 4.0 BioEngine - 模板生成器
// ==========================================
// 职责: 生成空白模板 / 示例工作簿,并导出为 CSV 目录
// 说明: 输出可被 CsvDirectoryParser 原样读回
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema_reader::{
    SHEET_ACTIVITIES, SHEET_EXCHANGES, SHEET_FLOW_MAPPING, SHEET_METADATA,
};
use crate::importer::workbook::{Sheet, Workbook};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const ACTIVITY_HEADER: [&str; 5] = [
    "Activity Code",
    "Activity Name",
    "Unit",
    "Location",
    "Reference Production",
];

const EXCHANGE_HEADER: [&str; 7] = [
    "Activity Code",
    "Exchange Type",
    "Flow Name",
    "Amount",
    "Unit",
    "Category",
    "Uncertainty",
];

const MAPPING_HEADER: [&str; 2] = ["User Flow Name", "Biosphere3 Flow Name (Brightway)"];

/// 模板所需的项目信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub reference_flow_unit: String,
    pub region: String,
    pub scale: String,
    pub system_boundaries: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            reference_flow_unit: "kg".to_string(),
            region: "BR".to_string(),
            scale: "pilot".to_string(),
            system_boundaries: "gate-to-gate".to_string(),
        }
    }
}

fn metadata_sheet(rows: [(&str, String); 5]) -> Sheet {
    let mut sheet = Sheet::new(SHEET_METADATA);
    for (key, value) in rows {
        sheet.push_row([key, value.as_str()]);
    }
    sheet
}

fn sheet_with<const N: usize>(name: &str, header: [&str; N], rows: &[[&str; N]]) -> Sheet {
    let mut sheet = Sheet::new(name).with_row(header);
    for row in rows {
        sheet.push_row(row.iter());
    }
    sheet
}

/// 空白模板: 四张工作表 + 占位示例行
pub fn blank_template(project: &ProjectInfo) -> Workbook {
    let region = project.region.as_str();

    Workbook::new()
        .with_sheet(metadata_sheet([
            ("Project Name", project.name.clone()),
            ("Functional Unit", format!("1 {}", project.reference_flow_unit)),
            ("Location", project.region.clone()),
            ("Scale", project.scale.clone()),
            ("System Boundaries", project.system_boundaries.clone()),
        ]))
        .with_sheet(sheet_with(
            SHEET_ACTIVITIES,
            ACTIVITY_HEADER,
            &[
                ["PROC_001", "Your Process 1", "kg", region, "1.0"],
                ["PROC_002", "Your Process 2", "L", region, "1.0"],
            ],
        ))
        .with_sheet(sheet_with(
            SHEET_EXCHANGES,
            EXCHANGE_HEADER,
            &[
                ["PROC_001", "production", "Product 1", "1.0", "kg", "", ""],
                ["PROC_001", "input", "Raw material", "2.0", "kg", "material", "±0.1"],
                ["PROC_001", "input", "Electricity", "1.5", "kWh", "energy", "±0.1"],
                ["PROC_001", "emission", "CO2", "0.5", "kg", "air", "±0.05"],
            ],
        ))
        .with_sheet(sheet_with(
            SHEET_FLOW_MAPPING,
            MAPPING_HEADER,
            &[
                ["CO2", "Carbon dioxide, fossil"],
                ["CH4", "Methane, fossil"],
                ["Water", "Water, unspecified natural origin"],
            ],
        ))
}

/// 示例工作簿: 甘蔗乙醇（发酵 + 蒸馏）
pub fn example_workbook() -> Workbook {
    Workbook::new()
        .with_sheet(metadata_sheet([
            ("Project Name", "Bioethanol from Sugarcane - Example".to_string()),
            ("Functional Unit", "1 L".to_string()),
            ("Location", "BR".to_string()),
            ("Scale", "pilot".to_string()),
            ("System Boundaries", "gate-to-gate".to_string()),
        ]))
        .with_sheet(sheet_with(
            SHEET_ACTIVITIES,
            ACTIVITY_HEADER,
            &[
                ["FERM_01", "Fermentation", "kg", "BR", "1.0"],
                ["DIST_01", "Distillation", "L", "BR", "1.0"],
            ],
        ))
        .with_sheet(sheet_with(
            SHEET_EXCHANGES,
            EXCHANGE_HEADER,
            &[
                ["FERM_01", "production", "Fermented mass", "1.0", "kg", "", ""],
                ["FERM_01", "input", "Sugarcane juice", "1.8", "kg", "material", "±0.1"],
                ["FERM_01", "input", "Yeast", "0.05", "kg", "material", "±0.005"],
                ["FERM_01", "input", "Water", "5.0", "kg", "material", "±0.25"],
                ["FERM_01", "input", "Electricity", "2.5", "kWh", "energy", "±0.15"],
                ["FERM_01", "emission", "CO2, biogenic", "0.9", "kg", "air", "±0.05"],
                ["FERM_01", "emission", "Wastewater", "4.5", "kg", "water", "±0.3"],
                ["DIST_01", "production", "Crude ethanol", "1.0", "L", "", ""],
                ["DIST_01", "input", "Fermented mass", "1.2", "kg", "material", "±0.08"],
                ["DIST_01", "input", "Heat (steam)", "15.0", "MJ", "energy", "±1.0"],
                ["DIST_01", "emission", "Ethanol vapor", "0.02", "kg", "air", "±0.003"],
            ],
        ))
        .with_sheet(sheet_with(
            SHEET_FLOW_MAPPING,
            MAPPING_HEADER,
            &[
                ["CO2, biogenic", "Carbon dioxide, non-fossil"],
                ["Wastewater", "Water, unspecified natural origin"],
                ["Ethanol vapor", "Ethanol"],
            ],
        ))
}

/// 将工作簿写为 CSV 目录（每个工作表一个 `<工作表名>.csv`）
///
/// # 返回
/// - Ok(Vec<PathBuf>): 已写出的文件（工作表顺序）
pub fn write_csv_workbook(dir: &Path, workbook: &Workbook) -> ImportResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| ImportError::FileWriteError(format!("{}: {}", dir.display(), e)))?;

    let mut written = Vec::with_capacity(workbook.sheets().len());
    for sheet in workbook.sheets() {
        let path = dir.join(format!("{}.csv", sheet.name));
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;

        for row in &sheet.rows {
            writer
                .write_record(row)
                .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
        }
        writer
            .flush()
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;

        written.push(path);
    }

    info!(dir = %dir.display(), sheets = written.len(), "CSV 工作簿已写出");
    Ok(written)
}
