// ==========================================
// Sustain 4.0 BioEngine - 项目 LCI 进度状态机
// ==========================================
// 职责: NotStarted → LevelSelected → DataUploaded → Validated → Assembled
// 红线: 状态由调用方持有,转换为纯函数（返回新状态）
// ==========================================

use crate::domain::issue::ValidationReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 最高细节等级
pub const MAX_LCI_LEVEL: u8 = 3;

// ==========================================
// LciLevel - 清单细节等级 (0..=3)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LciLevel(u8);

impl LciLevel {
    pub fn new(level: u8) -> Result<Self, StageTransitionError> {
        if level > MAX_LCI_LEVEL {
            return Err(StageTransitionError::InvalidLevel(level));
        }
        Ok(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LciLevel {
    type Error = StageTransitionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LciLevel::new(value)
    }
}

impl From<LciLevel> for u8 {
    fn from(level: LciLevel) -> Self {
        level.0
    }
}

// ==========================================
// StageTransitionError
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("invalid LCI level {0} (expected 0..={})", MAX_LCI_LEVEL)]
    InvalidLevel(u8),

    #[error("invalid stage transition: {action} from {from}")]
    InvalidTransition { from: String, action: &'static str },
}

// ==========================================
// LciStage - 项目清单进度
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LciStage {
    NotStarted,
    LevelSelected { level: LciLevel },
    DataUploaded { level: LciLevel },
    Validated { level: LciLevel },
    Assembled { level: LciLevel, database: String },
}

impl Default for LciStage {
    fn default() -> Self {
        LciStage::NotStarted
    }
}

impl fmt::Display for LciStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LciStage::NotStarted => write!(f, "NOT_STARTED"),
            LciStage::LevelSelected { level } => write!(f, "LEVEL_SELECTED({})", level.value()),
            LciStage::DataUploaded { level } => write!(f, "DATA_UPLOADED({})", level.value()),
            LciStage::Validated { level } => write!(f, "VALIDATED({})", level.value()),
            LciStage::Assembled { level, database } => {
                write!(f, "ASSEMBLED({}, {})", level.value(), database)
            }
        }
    }
}

impl LciStage {
    pub fn level(&self) -> Option<LciLevel> {
        match self {
            LciStage::NotStarted => None,
            LciStage::LevelSelected { level }
            | LciStage::DataUploaded { level }
            | LciStage::Validated { level }
            | LciStage::Assembled { level, .. } => Some(*level),
        }
    }

    /// 选择细节等级（任意阶段均可重新选择,已上传数据随之作废）
    pub fn select_level(&self, level: LciLevel) -> LciStage {
        LciStage::LevelSelected { level }
    }

    /// 上传数据（需已选择等级;重新上传会回到 DataUploaded）
    pub fn upload_data(&self) -> Result<LciStage, StageTransitionError> {
        match self.level() {
            Some(level) => Ok(LciStage::DataUploaded { level }),
            None => Err(self.invalid("upload_data")),
        }
    }

    /// 记录校验结果: 无阻断错误 → Validated,否则停留 DataUploaded
    pub fn record_validation(
        &self,
        report: &ValidationReport,
    ) -> Result<LciStage, StageTransitionError> {
        match self {
            LciStage::DataUploaded { level } | LciStage::Validated { level } => {
                if report.is_valid() {
                    Ok(LciStage::Validated { level: *level })
                } else {
                    Ok(LciStage::DataUploaded { level: *level })
                }
            }
            _ => Err(self.invalid("record_validation")),
        }
    }

    /// 记录组装/落库完成
    pub fn record_assembly(
        &self,
        database: impl Into<String>,
    ) -> Result<LciStage, StageTransitionError> {
        match self {
            LciStage::Validated { level } | LciStage::Assembled { level, .. } => {
                Ok(LciStage::Assembled {
                    level: *level,
                    database: database.into(),
                })
            }
            _ => Err(self.invalid("record_assembly")),
        }
    }

    pub fn reset(&self) -> LciStage {
        LciStage::NotStarted
    }

    fn invalid(&self, action: &'static str) -> StageTransitionError {
        StageTransitionError::InvalidTransition {
            from: self.to_string(),
            action,
        }
    }
}
