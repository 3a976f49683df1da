// ==========================================
// Sustain 4.0 BioEngine - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入、快照
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigError, ImportConfigReader};
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::engine::biosphere_linker::DEFAULT_REFERENCE_DATABASE;
use crate::engine::validator::{
    DEFAULT_MASS_BALANCE_MAX_RATIO, DEFAULT_MASS_BALANCE_MIN_RATIO, DEFAULT_MASS_UNITS,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（表不存在时自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取浮点配置;格式错误时回退默认值
    fn get_f64_or_default(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => {
                warn!(config_key = key, raw_value = %value, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 读取可选浮点配置;缺失/空值为 None
    fn get_optional_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        let value = match self.get_config_value(key)? {
            Some(v) if !v.trim().is_empty() => v,
            _ => return Ok(None),
        };
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => {
                warn!(config_key = key, raw_value = %value, "配置格式错误，视为未设置");
                Ok(None)
            }
        }
    }

    /// 获取所有 global 配置的快照（JSON 格式,键有序）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖现有的同名 global 配置;以 `__meta_` 开头的键被忽略
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, ConfigError> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_mass_balance_min_ratio(&self) -> Result<f64, ConfigError> {
        self.get_f64_or_default(config_keys::MASS_BALANCE_MIN_RATIO, DEFAULT_MASS_BALANCE_MIN_RATIO)
    }

    async fn get_mass_balance_max_ratio(&self) -> Result<f64, ConfigError> {
        self.get_f64_or_default(config_keys::MASS_BALANCE_MAX_RATIO, DEFAULT_MASS_BALANCE_MAX_RATIO)
    }

    async fn get_mass_units(&self) -> Result<Vec<String>, ConfigError> {
        let value = self.get_config_or_default(config_keys::MASS_UNITS, &DEFAULT_MASS_UNITS.join(","))?;

        let units: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if units.is_empty() {
            Ok(DEFAULT_MASS_UNITS.iter().map(|u| u.to_string()).collect())
        } else {
            Ok(units)
        }
    }

    async fn get_reference_database_name(&self) -> Result<String, ConfigError> {
        let value =
            self.get_config_or_default(config_keys::REFERENCE_DATABASE_NAME, DEFAULT_REFERENCE_DATABASE)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_REFERENCE_DATABASE.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn get_min_match_score(&self) -> Result<Option<f64>, ConfigError> {
        self.get_optional_f64(config_keys::MIN_MATCH_SCORE)
    }

    async fn get_confirm_match_score(&self) -> Result<Option<f64>, ConfigError> {
        self.get_optional_f64(config_keys::CONFIRM_MATCH_SCORE)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 质量平衡
    pub const MASS_BALANCE_MIN_RATIO: &str = "mass_balance_min_ratio";
    pub const MASS_BALANCE_MAX_RATIO: &str = "mass_balance_max_ratio";
    pub const MASS_UNITS: &str = "mass_units"; // 逗号分隔

    // 生物圈链接
    pub const REFERENCE_DATABASE_NAME: &str = "reference_database_name";
    pub const MIN_MATCH_SCORE: &str = "min_match_score";
    pub const CONFIRM_MATCH_SCORE: &str = "confirm_match_score";
}
