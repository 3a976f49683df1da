// ==========================================
// Sustain 4.0 BioEngine - 配置层
// ==========================================
// 职责: 导入管道参数（质量平衡阈值 / 参考库 / 匹配分数）
// 存储: config_kv 表;或内存 ImporterSettings
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod importer_settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ConfigError, ImportConfigReader};
pub use importer_settings::ImporterSettings;
