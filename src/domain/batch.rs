// ==========================================
// Sustain 4.0 BioEngine - 导入批次
// ==========================================
// 用途: 一次导入运行的审计信息（来源、计数、耗时）
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 数据源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    Excel,
    CsvDirectory,
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                   // 批次 ID（UUID）
    pub namespace: String,                  // 目标清单库名
    pub source: ImportSource,
    pub file_name: Option<String>,          // 源文件名
    pub file_path: Option<String>,          // 源文件路径
    pub activity_count: usize,
    pub exchange_count: usize,
    pub error_count: usize,                 // 阻断问题数
    pub warning_count: usize,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}
