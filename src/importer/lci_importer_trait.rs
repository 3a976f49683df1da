// ==========================================
// Sustain 4.0 BioEngine - LCI 导入 Trait
// ==========================================
// 职责: 定义导入管道接口（不包含实现）
// ==========================================

use crate::domain::inventory::LciTables;
use crate::domain::issue::ImportIssue;
use crate::importer::error::ImportResult;
use crate::importer::outcome::ImportOutcome;
use crate::importer::workbook::Workbook;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 批量导入的单个请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub path: PathBuf,
    pub namespace: String,
}

impl ImportRequest {
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
        }
    }
}

// ==========================================
// LciImporter Trait
// ==========================================
// 用途: LCI 导入主接口
// 实现者: LciImporterImpl
#[async_trait]
pub trait LciImporter: Send + Sync {
    /// 从 Excel 工作簿导入
    ///
    /// # 参数
    /// - file_path: 工作簿路径（.xlsx/.xlsm/.xlsb/.xls/.ods）
    /// - namespace: 目标清单库名
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 导入结果;数据质量问题在 report 中,不作为 Err
    /// - Err: 文件无法读取、配置读取失败
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. Schema Reader → LciTables
    /// 3. 校验（阻断错误 → 停止,不组装）
    /// 4. 生物圈流链接
    /// 5. 清单组装
    async fn import_from_excel<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        namespace: &str,
    ) -> ImportResult<ImportOutcome>;

    /// 从 CSV 目录导入（每个工作表一个 .csv）
    async fn import_from_csv_dir<P: AsRef<Path> + Send>(
        &self,
        dir_path: P,
        namespace: &str,
    ) -> ImportResult<ImportOutcome>;

    /// 批量导入（并发执行）
    ///
    /// # 说明
    /// - 每个请求的导入是独立的，互不影响
    /// - 某个请求失败不影响其他请求
    async fn batch_import(
        &self,
        requests: Vec<ImportRequest>,
    ) -> ImportResult<Vec<Result<ImportOutcome, String>>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: ExcelParser, CsvDirectoryParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析数据源为内存工作簿
    fn parse_workbook(&self, path: &Path) -> ImportResult<Workbook>;
}

// ==========================================
// SchemaReader Trait
// ==========================================
// 用途: 工作簿 → 类型化导入表（阶段 1）
// 实现者: schema_reader::SchemaReader
pub trait SchemaReader: Send + Sync {
    /// 解析四张工作表;结构/行级问题以 ImportIssue 返回,不中断
    fn read_tables(&self, workbook: &Workbook) -> (LciTables, Vec<ImportIssue>);
}
