// ==========================================
// Sustain 4.0 BioEngine - 领域模型层
// ==========================================
// 职责: 定义清单实体、类型、校验报告、项目进度
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod inventory;
pub mod issue;
pub mod project;
pub mod types;

// 重导出核心类型
pub use batch::{ImportBatch, ImportSource};
pub use inventory::{
    Activity, EdgeTarget, Exchange, ExchangeEdge, FlowCandidate, FlowMapping, InventoryModel,
    LciTables, LinkedFlow, PlaceholderKind, PlaceholderNode, ProcessKey, ProcessNode,
    ProjectMetadata, UncertaintySpec,
};
pub use issue::{ImportIssue, ValidationReport};
pub use project::{LciLevel, LciStage, StageTransitionError};
pub use types::{EdgeType, ExchangeKind, IssueKind, IssueLevel};
