// ==========================================
// Sustain 4.0 BioEngine - 参考流 Repository
// ==========================================
// 职责: reference_flow 表的导入与检索（SQLite 版 ReferenceFlowDatabase）
// 红线: 检索只读;排序规则与内存实现一致
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::inventory::FlowCandidate;
use crate::engine::biosphere_linker::{rank_candidates, ReferenceFlowDatabase, ReferenceLookupError};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteReferenceDatabase {
    conn: Arc<Mutex<Connection>>,
    name: String,
}

impl SqliteReferenceDatabase {
    /// 打开（表不存在时自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - name: 参考库名称（如 "biosphere3"）
    pub fn new(db_path: &str, name: impl Into<String>) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            name: name.into(),
        })
    }

    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        name: impl Into<String>,
    ) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self {
            conn,
            name: name.into(),
        })
    }

    /// 按配置项 `reference_database_name` 打开参考库
    pub async fn from_config<C>(conn: Arc<Mutex<Connection>>, config: &C) -> RepositoryResult<Self>
    where
        C: ImportConfigReader + ?Sized,
    {
        let name = config.get_reference_database_name().await.map_err(|e| {
            RepositoryError::InternalError(format!("failed to read reference database name: {}", e))
        })?;
        Self::from_connection(conn, name)
    }

    /// 导入参考流（同代码覆盖）
    pub fn seed(&self, flows: &[FlowCandidate]) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO reference_flow (database, code, name, categories, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for flow in flows {
                count += stmt.execute(params![
                    self.name,
                    flow.code,
                    flow.name,
                    serde_json::to_string(&flow.categories)?,
                    flow.unit,
                ])?;
            }
        }

        tx.commit()?;
        info!(database = %self.name, count, "参考流导入完成");
        Ok(count)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reference_flow WHERE database = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn load_all(&self) -> RepositoryResult<Vec<FlowCandidate>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT code, name, categories, unit FROM reference_flow WHERE database = ?1",
        )?;

        let rows = stmt
            .query_map(params![self.name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(code, name, categories, unit)| {
                let categories: Vec<String> = if categories.is_empty() {
                    Vec::new()
                } else {
                    serde_json::from_str(&categories)?
                };
                Ok(FlowCandidate {
                    code,
                    name,
                    categories,
                    unit,
                    score: None,
                })
            })
            .collect()
    }
}

impl ReferenceFlowDatabase for SqliteReferenceDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_available(&self) -> Result<(), ReferenceLookupError> {
        match self.count() {
            Ok(0) => Err(ReferenceLookupError::DatabaseNotFound(self.name.clone())),
            Ok(_) => Ok(()),
            Err(e) => Err(ReferenceLookupError::LookupFailed(e.to_string())),
        }
    }

    fn search(&self, term: &str) -> Result<Vec<FlowCandidate>, ReferenceLookupError> {
        let flows = self
            .load_all()
            .map_err(|e| ReferenceLookupError::LookupFailed(e.to_string()))?;
        Ok(rank_candidates(term, flows))
    }
}
