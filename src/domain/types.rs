// ==========================================
// Sustain 4.0 BioEngine - 领域类型定义
// ==========================================
// 职责: 交换类型、边类型、问题级别等枚举
// 红线: 只做类型定义与格式化,不含校验逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 交换类型 (Exchange Kind)
// ==========================================
// 输入大小写不敏感,统一为小写
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Production, // 参考产品产出
    Input,      // 物料/能源输入
    Emission,   // 排放
    Resource,   // 资源消耗
}

impl ExchangeKind {
    /// 是否为生物圈流（排放/资源）
    pub fn is_biosphere(&self) -> bool {
        matches!(self, ExchangeKind::Emission | ExchangeKind::Resource)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Production => "production",
            ExchangeKind::Input => "input",
            ExchangeKind::Emission => "emission",
            ExchangeKind::Resource => "resource",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExchangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(ExchangeKind::Production),
            "input" => Ok(ExchangeKind::Input),
            "emission" => Ok(ExchangeKind::Emission),
            "resource" => Ok(ExchangeKind::Resource),
            other => Err(format!(
                "unknown exchange type '{}' (expected production, input, emission or resource)",
                other
            )),
        }
    }
}

// ==========================================
// 边类型 (Edge Type)
// ==========================================
// 序列化格式与外部 LCA 数据库一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Production,
    Technosphere,
    Biosphere,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Production => "production",
            EdgeType::Technosphere => "technosphere",
            EdgeType::Biosphere => "biosphere",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(EdgeType::Production),
            "technosphere" => Ok(EdgeType::Technosphere),
            "biosphere" => Ok(EdgeType::Biosphere),
            other => Err(format!("unknown edge type '{}'", other)),
        }
    }
}

// ==========================================
// 问题级别 (Issue Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueLevel {
    Error,   // 阻断（禁止进入组装）
    Warning, // 警告（允许继续）
}

// ==========================================
// 问题类型 (Issue Kind)
// ==========================================
// 级别由类型唯一决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    // ===== 阻断 =====
    Schema,
    Parse,
    ReferentialIntegrity,
    MissingProduction,
    DuplicateActivityCode,

    // ===== 警告 =====
    NegativeAmount,
    MassBalance,
    NameCollision,
    UnlinkedFlow,
    LinkerUnavailable,
    LowConfidenceMatch,
}

impl IssueKind {
    pub fn level(&self) -> IssueLevel {
        match self {
            IssueKind::Schema
            | IssueKind::Parse
            | IssueKind::ReferentialIntegrity
            | IssueKind::MissingProduction
            | IssueKind::DuplicateActivityCode => IssueLevel::Error,
            IssueKind::NegativeAmount
            | IssueKind::MassBalance
            | IssueKind::NameCollision
            | IssueKind::UnlinkedFlow
            | IssueKind::LinkerUnavailable
            | IssueKind::LowConfidenceMatch => IssueLevel::Warning,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.level() == IssueLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_kind_case_insensitive() {
        assert_eq!("Production".parse::<ExchangeKind>(), Ok(ExchangeKind::Production));
        assert_eq!(" EMISSION ".parse::<ExchangeKind>(), Ok(ExchangeKind::Emission));
        assert!("output".parse::<ExchangeKind>().is_err());
    }

    #[test]
    fn test_exchange_kind_biosphere() {
        assert!(ExchangeKind::Emission.is_biosphere());
        assert!(ExchangeKind::Resource.is_biosphere());
        assert!(!ExchangeKind::Input.is_biosphere());
        assert!(!ExchangeKind::Production.is_biosphere());
    }

    #[test]
    fn test_issue_kind_level() {
        assert!(IssueKind::Parse.is_blocking());
        assert!(IssueKind::MissingProduction.is_blocking());
        assert!(!IssueKind::MassBalance.is_blocking());
        assert_eq!(IssueKind::UnlinkedFlow.level(), IssueLevel::Warning);
    }
}
