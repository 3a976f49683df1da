// ==========================================
// Sustain 4.0 BioEngine - 核心库
// ==========================================
// 职责: LCI 工作簿导入 → 校验 → 生物圈链接 → 清单组装
// 技术栈: Rust + SQLite
// 红线: 数据质量问题只进报告,不抛错;阻断错误时不组装
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 清单库与参考流
pub mod repository;

// 引擎层 - 校验 / 链接 / 组装
pub mod engine;

// 导入层 - 外部工作簿
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EdgeType, ExchangeKind, IssueKind, IssueLevel};

// 领域实体
pub use domain::{
    ImportBatch, ImportIssue, InventoryModel, LciLevel, LciStage, LciTables, ProcessKey,
    ValidationReport,
};

// 引擎
pub use engine::{
    BiosphereLinker, InMemoryReferenceDatabase, InventoryAssembler, LciValidator, LinkReport,
    ProcessNetwork, ReferenceFlowDatabase,
};

// 导入
pub use importer::{ImportError, ImportOutcome, ImportResult, LciImporter, LciImporterImpl};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Sustain 4.0 BioEngine";
