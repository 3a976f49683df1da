// ==========================================
// Sustain 4.0 BioEngine - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::biosphere_linker::LinkerConfig;
use crate::engine::validator::ValidatorConfig;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取错误
pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（config_kv 表）, ImporterSettings（内存）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 质量平衡 =====

    /// 质量平衡比值下限（输出/输入）
    ///
    /// # 默认值
    /// - 0.3
    async fn get_mass_balance_min_ratio(&self) -> Result<f64, ConfigError>;

    /// 质量平衡比值上限
    ///
    /// # 默认值
    /// - 1.2
    async fn get_mass_balance_max_ratio(&self) -> Result<f64, ConfigError>;

    /// 参与质量平衡统计的单位
    ///
    /// # 默认值
    /// - ["kg", "g", "t", "ton"]
    async fn get_mass_units(&self) -> Result<Vec<String>, ConfigError>;

    // ===== 生物圈链接 =====

    /// 外部参考流数据库名称
    ///
    /// # 默认值
    /// - "biosphere3"
    async fn get_reference_database_name(&self) -> Result<String, ConfigError>;

    /// 最低接受分数（None = 首个结果即接受）
    async fn get_min_match_score(&self) -> Result<Option<f64>, ConfigError>;

    /// 需人工确认的分数阈值（None = 不要求确认）
    async fn get_confirm_match_score(&self) -> Result<Option<f64>, ConfigError>;

    // ===== 组合读取 =====

    /// 组装校验器配置
    async fn validator_config(&self) -> Result<ValidatorConfig, ConfigError> {
        Ok(ValidatorConfig {
            mass_balance_min_ratio: self.get_mass_balance_min_ratio().await?,
            mass_balance_max_ratio: self.get_mass_balance_max_ratio().await?,
            mass_units: self.get_mass_units().await?,
        })
    }

    /// 组装链接器配置
    async fn linker_config(&self) -> Result<LinkerConfig, ConfigError> {
        Ok(LinkerConfig {
            min_score: self.get_min_match_score().await?,
            confirm_score: self.get_confirm_match_score().await?,
        })
    }
}
