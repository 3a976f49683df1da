// ==========================================
// Sustain 4.0 BioEngine - 清单库 Repository 实现
// ==========================================
// 职责: 将 InventoryModel 落库到 inventory_database / process / exchange（rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::inventory::{EdgeTarget, InventoryModel, ProcessKey, ProjectMetadata, UncertaintySpec};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::{
    InventoryDatabaseInfo, InventoryRepository, WriteMode, WriteSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const NODE_TYPE_PROCESS: &str = "process";

fn target_kind(target: &EdgeTarget) -> &'static str {
    match target {
        EdgeTarget::Production(_) => "production",
        EdgeTarget::Internal(_) => "internal",
        EdgeTarget::GenericTechnosphere(_) => "generic_technosphere",
        EdgeTarget::Biosphere(_) => "biosphere",
        EdgeTarget::GenericBiosphere(_) => "generic_biosphere",
    }
}

// ==========================================
// InventoryRepositoryImpl
// ==========================================
pub struct InventoryRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepositoryImpl {
    /// 创建新的 Repository 实例（表不存在时自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn exists_tx(tx: &Transaction, name: &str) -> RepositoryResult<bool> {
        let found = tx
            .query_row(
                "SELECT 1 FROM inventory_database WHERE name = ?1",
                params![name],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    /// 在事务中删除整库（交换 → 节点 → 库记录）
    fn delete_tx(tx: &Transaction, name: &str) -> RepositoryResult<bool> {
        tx.execute("DELETE FROM exchange WHERE database = ?1", params![name])?;
        tx.execute("DELETE FROM process WHERE database = ?1", params![name])?;
        let removed = tx.execute("DELETE FROM inventory_database WHERE name = ?1", params![name])?;
        Ok(removed > 0)
    }

    fn insert_model_tx(tx: &Transaction, model: &InventoryModel) -> RepositoryResult<WriteSummary> {
        tx.execute(
            "INSERT INTO inventory_database (name, metadata_json, created_at) VALUES (?1, ?2, ?3)",
            params![
                model.namespace,
                serde_json::to_string(&model.metadata)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let mut summary = WriteSummary::default();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO process (database, code, name, unit, location, production_amount, node_type)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for node in &model.nodes {
                stmt.execute(params![
                    node.key.database,
                    node.key.code,
                    node.name,
                    node.unit,
                    node.location,
                    node.production_amount,
                    NODE_TYPE_PROCESS,
                ])?;
                summary.processes += 1;
            }
        }

        {
            // 占位代码与活动代码冲突时保留活动节点
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO process (database, code, name, unit, location, production_amount, node_type)
                VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5)
                "#,
            )?;
            for placeholder in &model.placeholders {
                summary.placeholders += stmt.execute(params![
                    placeholder.key.database,
                    placeholder.key.code,
                    placeholder.name,
                    placeholder.unit,
                    placeholder.kind.as_str(),
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO exchange (
                    database, output_code, input_database, input_code, target_kind,
                    edge_type, amount, unit, name, category, uncertainty_type, loc, scale
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;
            for node in &model.nodes {
                for edge in &node.exchanges {
                    let input = edge.input.key();
                    let (uncertainty_type, loc, scale) = match &edge.uncertainty {
                        Some(spec) => match spec {
                            UncertaintySpec::Normal { loc, scale } => {
                                (Some(spec.type_id()), Some(*loc), Some(*scale))
                            }
                        },
                        None => (None, None, None),
                    };
                    stmt.execute(params![
                        node.key.database,
                        node.key.code,
                        input.database,
                        input.code,
                        target_kind(&edge.input),
                        edge.edge_type.as_str(),
                        edge.amount,
                        edge.unit,
                        edge.name,
                        edge.categories.as_ref().map(|(c,)| c.as_str()),
                        uncertainty_type,
                        loc,
                        scale,
                    ])?;
                    summary.exchanges += 1;
                }
            }
        }

        Ok(summary)
    }
}

#[async_trait]
impl InventoryRepository for InventoryRepositoryImpl {
    async fn write_database(
        &self,
        model: &InventoryModel,
        mode: WriteMode,
    ) -> RepositoryResult<WriteSummary> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let existed = Self::exists_tx(&tx, &model.namespace)?;
        if existed {
            match mode {
                WriteMode::FailIfExists => {
                    return Err(RepositoryError::AlreadyExists {
                        entity: "inventory database".to_string(),
                        id: model.namespace.clone(),
                    });
                }
                WriteMode::Replace => {
                    debug!(database = %model.namespace, "删除同名清单库");
                    Self::delete_tx(&tx, &model.namespace)?;
                }
            }
        }

        let mut summary = Self::insert_model_tx(&tx, model)?;
        summary.replaced = existed;

        tx.commit()?;

        info!(
            database = %model.namespace,
            processes = summary.processes,
            placeholders = summary.placeholders,
            exchanges = summary.exchanges,
            replaced = summary.replaced,
            "清单库写入完成"
        );

        Ok(summary)
    }

    async fn database_exists(&self, name: &str) -> RepositoryResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM inventory_database WHERE name = ?1",
                params![name],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    async fn list_databases(&self) -> RepositoryResult<Vec<InventoryDatabaseInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, metadata_json, created_at FROM inventory_database ORDER BY name",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, metadata_json, created_at)| {
                let metadata: ProjectMetadata = serde_json::from_str(&metadata_json)?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(InventoryDatabaseInfo {
                    name,
                    metadata,
                    created_at,
                })
            })
            .collect()
    }

    async fn load_process_keys(&self, name: &str) -> RepositoryResult<Vec<ProcessKey>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT database, code FROM process WHERE database = ?1 ORDER BY code")?;

        let keys = stmt
            .query_map(params![name], |row| {
                Ok(ProcessKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(keys)
    }

    async fn count_exchanges(&self, name: &str) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exchange WHERE database = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn delete_database(&self, name: &str) -> RepositoryResult<bool> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let removed = Self::delete_tx(&tx, name)?;
        tx.commit()?;

        if removed {
            info!(database = %name, "清单库已删除");
        }
        Ok(removed)
    }
}
