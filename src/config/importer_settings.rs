use crate::config::import_config_trait::{ConfigError, ImportConfigReader};
use crate::engine::biosphere_linker::DEFAULT_REFERENCE_DATABASE;
use crate::engine::validator::{
    DEFAULT_MASS_BALANCE_MAX_RATIO, DEFAULT_MASS_BALANCE_MIN_RATIO, DEFAULT_MASS_UNITS,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 导入参数（内存对象,不落库）
///
/// 用于测试、CLI 与无需 config_kv 的嵌入场景;缺省字段取默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImporterSettings {
    /// 质量平衡比值下限
    #[serde(default = "default_min_ratio")]
    pub mass_balance_min_ratio: f64,

    /// 质量平衡比值上限
    #[serde(default = "default_max_ratio")]
    pub mass_balance_max_ratio: f64,

    /// 参与质量平衡的单位
    #[serde(default = "default_mass_units")]
    pub mass_units: Vec<String>,

    /// 参考流数据库名称
    #[serde(default = "default_reference_database")]
    pub reference_database_name: String,

    #[serde(default)]
    pub min_match_score: Option<f64>,

    #[serde(default)]
    pub confirm_match_score: Option<f64>,
}

fn default_min_ratio() -> f64 {
    DEFAULT_MASS_BALANCE_MIN_RATIO
}

fn default_max_ratio() -> f64 {
    DEFAULT_MASS_BALANCE_MAX_RATIO
}

fn default_mass_units() -> Vec<String> {
    DEFAULT_MASS_UNITS.iter().map(|u| u.to_string()).collect()
}

fn default_reference_database() -> String {
    DEFAULT_REFERENCE_DATABASE.to_string()
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            mass_balance_min_ratio: default_min_ratio(),
            mass_balance_max_ratio: default_max_ratio(),
            mass_units: default_mass_units(),
            reference_database_name: default_reference_database(),
            min_match_score: None,
            confirm_match_score: None,
        }
    }
}

#[async_trait]
impl ImportConfigReader for ImporterSettings {
    async fn get_mass_balance_min_ratio(&self) -> Result<f64, ConfigError> {
        Ok(self.mass_balance_min_ratio)
    }

    async fn get_mass_balance_max_ratio(&self) -> Result<f64, ConfigError> {
        Ok(self.mass_balance_max_ratio)
    }

    async fn get_mass_units(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.mass_units.clone())
    }

    async fn get_reference_database_name(&self) -> Result<String, ConfigError> {
        Ok(self.reference_database_name.clone())
    }

    async fn get_min_match_score(&self) -> Result<Option<f64>, ConfigError> {
        Ok(self.min_match_score)
    }

    async fn get_confirm_match_score(&self) -> Result<Option<f64>, ConfigError> {
        Ok(self.confirm_match_score)
    }
}
