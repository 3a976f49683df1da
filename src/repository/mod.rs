// ==========================================
// Sustain 4.0 BioEngine - 数据仓储层
// ==========================================
// 职责: 清单库落库 / 参考流检索,屏蔽数据库细节
// 约束: 所有查询使用参数化;Repository 不含业务逻辑
// ==========================================

pub mod error;
pub mod inventory_repo;
pub mod inventory_repo_impl;
pub mod reference_flow_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::{InventoryDatabaseInfo, InventoryRepository, WriteMode, WriteSummary};
pub use inventory_repo_impl::InventoryRepositoryImpl;
pub use reference_flow_repo::SqliteReferenceDatabase;
