// ==========================================
// Sustain 4.0 BioEngine - 清单库 Repository Trait
// ==========================================
// 职责: 定义组装结果的持久化接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::inventory::{InventoryModel, ProcessKey, ProjectMetadata};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 同名清单库已存在时的写入策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    /// 在同一事务内删除旧库后写入
    #[default]
    Replace,
    /// 拒绝写入（AlreadyExists）
    FailIfExists,
}

/// 写入统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteSummary {
    pub processes: usize,
    pub placeholders: usize,
    pub exchanges: usize,
    pub replaced: bool,
}

/// 已存清单库概要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDatabaseInfo {
    pub name: String,
    pub metadata: ProjectMetadata,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// InventoryRepository Trait
// ==========================================
// 实现者: InventoryRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// 写入整张清单图（事务化）
    ///
    /// # 返回
    /// - Ok(WriteSummary): 写入统计
    /// - Err(AlreadyExists): FailIfExists 且同名库存在
    async fn write_database(
        &self,
        model: &InventoryModel,
        mode: WriteMode,
    ) -> RepositoryResult<WriteSummary>;

    async fn database_exists(&self, name: &str) -> RepositoryResult<bool>;

    /// 按名称排序列出已存清单库
    async fn list_databases(&self) -> RepositoryResult<Vec<InventoryDatabaseInfo>>;

    /// 读取库内全部节点键（活动 + 占位,按代码排序）
    async fn load_process_keys(&self, name: &str) -> RepositoryResult<Vec<ProcessKey>>;

    async fn count_exchanges(&self, name: &str) -> RepositoryResult<usize>;

    /// 删除清单库
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 不存在
    async fn delete_database(&self, name: &str) -> RepositoryResult<bool>;
}
