// ==========================================
// Sustain 4.0 BioEngine - LCI 一致性校验器
// ==========================================
// 职责: 引用完整性 / 产出完整性 / 负值 / 质量平衡 + 显式外键 / 重名
// 红线: 所有检查都执行,顺序只影响消息顺序;纯函数,幂等
// ==========================================

use crate::domain::inventory::LciTables;
use crate::domain::issue::{ImportIssue, ValidationReport};
use crate::domain::types::{ExchangeKind, IssueKind};
use crate::importer::schema_reader::SHEET_EXCHANGES;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// 质量平衡默认下限
pub const DEFAULT_MASS_BALANCE_MIN_RATIO: f64 = 0.3;
/// 质量平衡默认上限
pub const DEFAULT_MASS_BALANCE_MAX_RATIO: f64 = 1.2;
/// 默认质量单位
pub const DEFAULT_MASS_UNITS: [&str; 4] = ["kg", "g", "t", "ton"];

// ==========================================
// ValidatorConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub mass_balance_min_ratio: f64,
    pub mass_balance_max_ratio: f64,
    pub mass_units: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            mass_balance_min_ratio: DEFAULT_MASS_BALANCE_MIN_RATIO,
            mass_balance_max_ratio: DEFAULT_MASS_BALANCE_MAX_RATIO,
            mass_units: DEFAULT_MASS_UNITS.iter().map(|u| u.to_string()).collect(),
        }
    }
}

// ==========================================
// LciValidator
// ==========================================
pub struct LciValidator {
    config: ValidatorConfig,
}

impl LciValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// 执行全部检查
    pub fn validate(&self, tables: &LciTables) -> ValidationReport {
        let mut report = ValidationReport::new();
        report.extend(self.check_referential_integrity(tables));
        report.extend(self.check_production_completeness(tables));
        report.extend(self.check_negative_amounts(tables));
        report.extend(self.check_mass_balance(tables));
        report.extend(self.check_linked_activities(tables));
        report.extend(self.check_name_collisions(tables));
        report
    }

    /// 1. 交换引用的活动代码必须存在（孤儿代码合并为一条错误）
    pub fn check_referential_integrity(&self, tables: &LciTables) -> Vec<ImportIssue> {
        let activity_codes: HashSet<&str> =
            tables.activities.iter().map(|a| a.code.as_str()).collect();

        let orphans: BTreeSet<&str> = tables
            .exchanges
            .iter()
            .map(|e| e.activity_code.as_str())
            .filter(|code| !activity_codes.contains(code))
            .collect();

        if orphans.is_empty() {
            return Vec::new();
        }

        let listed: Vec<&str> = orphans.into_iter().collect();
        vec![ImportIssue::new(
            IssueKind::ReferentialIntegrity,
            format!(
                "Exchanges reference non-existent activities: {{{}}}",
                listed.join(", ")
            ),
        )
        .in_sheet(SHEET_EXCHANGES)]
    }

    /// 2. 每个活动至少一条 production 交换
    pub fn check_production_completeness(&self, tables: &LciTables) -> Vec<ImportIssue> {
        let producing: HashSet<&str> = tables
            .exchanges
            .iter()
            .filter(|e| e.kind == ExchangeKind::Production)
            .map(|e| e.activity_code.as_str())
            .collect();

        tables
            .activities
            .iter()
            .filter(|a| !producing.contains(a.code.as_str()))
            .map(|a| {
                ImportIssue::new(
                    IssueKind::MissingProduction,
                    format!(
                        "Activity '{}' ({}) has no production exchange",
                        a.name, a.code
                    ),
                )
            })
            .collect()
    }

    /// 3. 负值只警告（部分 LCA 约定允许抵扣）
    pub fn check_negative_amounts(&self, tables: &LciTables) -> Vec<ImportIssue> {
        tables
            .exchanges
            .iter()
            .filter(|e| e.amount < 0.0)
            .map(|e| ImportIssue {
                kind: IssueKind::NegativeAmount,
                sheet: Some(SHEET_EXCHANGES.to_string()),
                row: Some(e.row),
                column: None,
                message: format!(
                    "Negative amount in {}: {} ({} {})",
                    e.activity_code, e.flow_name, e.amount, e.unit
                ),
            })
            .collect()
    }

    /// 4. 质量平衡启发式（仅质量单位,两侧均 > 0 时评估）
    pub fn check_mass_balance(&self, tables: &LciTables) -> Vec<ImportIssue> {
        let mut issues = Vec::new();

        for activity in &tables.activities {
            let mut input_mass = 0.0;
            let mut output_mass = 0.0;

            for exchange in tables.exchanges_of(&activity.code) {
                if !self.is_mass_unit(&exchange.unit) {
                    continue;
                }
                match exchange.kind {
                    ExchangeKind::Input => input_mass += exchange.amount,
                    ExchangeKind::Production | ExchangeKind::Emission => {
                        output_mass += exchange.amount
                    }
                    ExchangeKind::Resource => {}
                }
            }

            if input_mass <= 0.0 || output_mass <= 0.0 {
                continue;
            }

            let ratio = output_mass / input_mass;
            if ratio < self.config.mass_balance_min_ratio
                || ratio > self.config.mass_balance_max_ratio
            {
                issues.push(ImportIssue::new(
                    IssueKind::MassBalance,
                    format!(
                        "Suspicious mass balance in '{}': Input={:.2}kg, Output={:.2}kg (ratio: {:.2})",
                        activity.name, input_mass, output_mass, ratio
                    ),
                ));
            }
        }

        issues
    }

    /// 5. 显式链接的活动代码必须存在
    pub fn check_linked_activities(&self, tables: &LciTables) -> Vec<ImportIssue> {
        let activity_codes: HashSet<&str> =
            tables.activities.iter().map(|a| a.code.as_str()).collect();

        tables
            .exchanges
            .iter()
            .filter_map(|e| {
                let linked = e.linked_activity_code.as_deref()?;
                if activity_codes.contains(linked) {
                    return None;
                }
                Some(ImportIssue {
                    kind: IssueKind::ReferentialIntegrity,
                    sheet: Some(SHEET_EXCHANGES.to_string()),
                    row: Some(e.row),
                    column: None,
                    message: format!(
                        "Exchange '{}' of {} links to non-existent activity '{}'",
                        e.flow_name, e.activity_code, linked
                    ),
                })
            })
            .collect()
    }

    /// 6. 活动重名（按名称建立内部链接时存在歧义）
    pub fn check_name_collisions(&self, tables: &LciTables) -> Vec<ImportIssue> {
        let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for activity in &tables.activities {
            by_name
                .entry(activity.name.as_str())
                .or_default()
                .push(activity.code.as_str());
        }

        by_name
            .into_iter()
            .filter(|(_, codes)| codes.len() > 1)
            .map(|(name, codes)| {
                ImportIssue::new(
                    IssueKind::NameCollision,
                    format!(
                        "Activity name '{}' is shared by [{}]; inputs linked by name resolve to {}",
                        name,
                        codes.join(", "),
                        codes[0]
                    ),
                )
            })
            .collect()
    }

    fn is_mass_unit(&self, unit: &str) -> bool {
        self.config.mass_units.iter().any(|u| u == unit)
    }
}

impl Default for LciValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}
