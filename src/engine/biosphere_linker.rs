// ==========================================
// Sustain 4.0 BioEngine - 生物圈流链接器
// ==========================================
// 职责: 排放/资源流名 → 外部参考流（可选映射表 + 检索）
// 红线: 参考库只读;不可用时降级为“全部未解析”并汇总一条警告
// ==========================================

use crate::domain::inventory::{FlowCandidate, LciTables, LinkedFlow};
use crate::domain::issue::ImportIssue;
use crate::domain::types::IssueKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 默认参考库名称
pub const DEFAULT_REFERENCE_DATABASE: &str = "biosphere3";

// ==========================================
// ReferenceLookupError
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceLookupError {
    #[error("reference database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("reference lookup failed: {0}")]
    LookupFailed(String),
}

// ==========================================
// ReferenceFlowDatabase Trait
// ==========================================
// 用途: 外部参考流分类库的只读检索能力
// 实现者: InMemoryReferenceDatabase, SqliteReferenceDatabase
pub trait ReferenceFlowDatabase: Send + Sync {
    /// 参考库名称（写入 LinkedFlow.database）
    fn name(&self) -> &str;

    /// 参考库是否可用
    fn check_available(&self) -> Result<(), ReferenceLookupError>;

    /// 检索候选流（按相关度降序）
    fn search(&self, term: &str) -> Result<Vec<FlowCandidate>, ReferenceLookupError>;
}

impl<T: ReferenceFlowDatabase + ?Sized> ReferenceFlowDatabase for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn check_available(&self) -> Result<(), ReferenceLookupError> {
        (**self).check_available()
    }

    fn search(&self, term: &str) -> Result<Vec<FlowCandidate>, ReferenceLookupError> {
        (**self).search(term)
    }
}

// ==========================================
// 检索排序
// ==========================================
// 层级: 完全匹配(0) > 前缀(1) > 包含(2);同层按分数降序、名称升序
// 分数: |term| / |name|（字符数,大小写不敏感）

/// 计算候选名与检索词的匹配层级与分数;不匹配返回 None
pub fn match_score(term: &str, name: &str) -> Option<(u8, f64)> {
    let term = term.trim().to_lowercase();
    let name_lower = name.trim().to_lowercase();
    if term.is_empty() || name_lower.is_empty() {
        return None;
    }

    let tier = if name_lower == term {
        0
    } else if name_lower.starts_with(&term) {
        1
    } else if name_lower.contains(&term) {
        2
    } else {
        return None;
    };

    let score = term.chars().count() as f64 / name_lower.chars().count() as f64;
    Some((tier, score.min(1.0)))
}

/// 对候选列表打分并排序（丢弃不匹配者）
pub fn rank_candidates(term: &str, candidates: Vec<FlowCandidate>) -> Vec<FlowCandidate> {
    let mut ranked: Vec<(u8, FlowCandidate)> = candidates
        .into_iter()
        .filter_map(|mut c| {
            let (tier, score) = match_score(term, &c.name)?;
            c.score = Some(score);
            Some((tier, c))
        })
        .collect();

    ranked.sort_by(|(ta, a), (tb, b)| {
        ta.cmp(tb)
            .then_with(|| {
                b.score
                    .unwrap_or(0.0)
                    .partial_cmp(&a.score.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.code.cmp(&b.code))
    });

    ranked.into_iter().map(|(_, c)| c).collect()
}

// ==========================================
// InMemoryReferenceDatabase
// ==========================================
#[derive(Debug, Clone)]
pub struct InMemoryReferenceDatabase {
    name: String,
    flows: Vec<FlowCandidate>,
}

impl InMemoryReferenceDatabase {
    pub fn new(name: impl Into<String>, flows: Vec<FlowCandidate>) -> Self {
        Self {
            name: name.into(),
            flows,
        }
    }

    /// 空库（check_available 返回 DatabaseNotFound）
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl ReferenceFlowDatabase for InMemoryReferenceDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_available(&self) -> Result<(), ReferenceLookupError> {
        if self.flows.is_empty() {
            return Err(ReferenceLookupError::DatabaseNotFound(self.name.clone()));
        }
        Ok(())
    }

    fn search(&self, term: &str) -> Result<Vec<FlowCandidate>, ReferenceLookupError> {
        Ok(rank_candidates(term, self.flows.clone()))
    }
}

// ==========================================
// LinkerConfig
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// 最低接受分数;None 表示首个结果即接受
    pub min_score: Option<f64>,
    /// 低于该分数的匹配需人工确认
    pub confirm_score: Option<f64>,
}

// ==========================================
// LinkReport - 链接结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub database: String,
    pub available: bool,
    pub linked: BTreeMap<String, LinkedFlow>,
    pub unresolved: Vec<String>,
    /// 每个流名的原始候选列表（供审计/人工覆写）
    pub candidates: BTreeMap<String, Vec<FlowCandidate>>,
    pub issues: Vec<ImportIssue>,
}

impl LinkReport {
    pub fn is_linked(&self, flow_name: &str) -> bool {
        self.linked.contains_key(flow_name)
    }

    pub fn needing_confirmation(&self) -> Vec<&str> {
        self.linked
            .iter()
            .filter(|(_, l)| l.needs_confirmation)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// 人工指定匹配结果（视为已确认）
    pub fn override_link(&mut self, flow_name: &str, candidate: &FlowCandidate) {
        let search_term = self
            .linked
            .get(flow_name)
            .map(|l| l.search_term.clone())
            .unwrap_or_else(|| flow_name.to_string());

        self.linked.insert(
            flow_name.to_string(),
            LinkedFlow {
                database: self.database.clone(),
                code: candidate.code.clone(),
                matched_name: candidate.name.clone(),
                search_term,
                score: candidate.score,
                needs_confirmation: false,
            },
        );
        self.unresolved.retain(|n| n != flow_name);
        self.rebuild_aggregate_issues();
    }

    /// 按当前链接状态重建 UnlinkedFlow / LowConfidenceMatch 汇总警告
    ///
    /// 参考库不可用时只保留 LinkerUnavailable
    fn rebuild_aggregate_issues(&mut self) {
        self.issues.retain(|i| {
            !matches!(i.kind, IssueKind::UnlinkedFlow | IssueKind::LowConfidenceMatch)
        });
        if !self.available {
            return;
        }

        if !self.unresolved.is_empty() {
            self.issues.push(ImportIssue::new(
                IssueKind::UnlinkedFlow,
                format!(
                    "Could not automatically link flows: [{}]. They will be created as generic flows.",
                    self.unresolved.join(", ")
                ),
            ));
        }

        let pending: Vec<String> = self
            .linked
            .iter()
            .filter(|(_, l)| l.needs_confirmation)
            .map(|(name, l)| match l.score {
                Some(score) => format!("{} -> {} ({:.2})", name, l.matched_name, score),
                None => format!("{} -> {}", name, l.matched_name),
            })
            .collect();
        if !pending.is_empty() {
            self.issues.push(ImportIssue::new(
                IssueKind::LowConfidenceMatch,
                format!("Flow matches need confirmation: [{}]", pending.join(", ")),
            ));
        }
    }
}

// ==========================================
// BiosphereLinker
// ==========================================
pub struct BiosphereLinker {
    config: LinkerConfig,
}

impl BiosphereLinker {
    pub fn new(config: LinkerConfig) -> Self {
        Self { config }
    }

    /// 链接所有排放/资源流（按流名去重、排序）
    pub fn link(&self, tables: &LciTables, database: &dyn ReferenceFlowDatabase) -> LinkReport {
        let flow_names: BTreeSet<&str> = tables
            .exchanges
            .iter()
            .filter(|e| e.kind.is_biosphere())
            .map(|e| e.flow_name.as_str())
            .collect();

        let mut report = LinkReport {
            database: database.name().to_string(),
            available: true,
            ..LinkReport::default()
        };

        if flow_names.is_empty() {
            return report;
        }

        // 参考库不可用 → 全部未解析,仅一条汇总警告
        if let Err(e) = database.check_available() {
            warn!(database = %database.name(), error = %e, "参考流数据库不可用,跳过链接");
            report.available = false;
            report.unresolved = flow_names.iter().map(|n| n.to_string()).collect();
            report.issues.push(ImportIssue::new(
                IssueKind::LinkerUnavailable,
                format!(
                    "Reference flow database '{}' is not available ({}). Flows will not be linked.",
                    database.name(),
                    e
                ),
            ));
            return report;
        }

        for flow_name in flow_names {
            let term = tables
                .flow_mapping
                .get(flow_name)
                .map(String::as_str)
                .unwrap_or(flow_name);

            let candidates = match database.search(term) {
                Ok(candidates) => candidates,
                Err(e) => {
                    debug!(flow = %flow_name, term = %term, error = %e, "检索失败,视为未解析");
                    report.unresolved.push(flow_name.to_string());
                    continue;
                }
            };

            match self.choose(&candidates) {
                Some(best) => {
                    let needs_confirmation = self.needs_confirmation(best);
                    debug!(
                        flow = %flow_name,
                        matched = %best.name,
                        code = %best.code,
                        needs_confirmation,
                        "生物圈流已链接"
                    );
                    report.linked.insert(
                        flow_name.to_string(),
                        LinkedFlow {
                            database: database.name().to_string(),
                            code: best.code.clone(),
                            matched_name: best.name.clone(),
                            search_term: term.to_string(),
                            score: best.score,
                            needs_confirmation,
                        },
                    );
                }
                None => report.unresolved.push(flow_name.to_string()),
            }
            report.candidates.insert(flow_name.to_string(), candidates);
        }

        report.rebuild_aggregate_issues();

        info!(
            linked = report.linked.len(),
            unresolved = report.unresolved.len(),
            pending_confirmation = report.needing_confirmation().len(),
            "生物圈流链接完成"
        );

        report
    }

    fn choose<'a>(&self, candidates: &'a [FlowCandidate]) -> Option<&'a FlowCandidate> {
        match self.config.min_score {
            None => candidates.first(),
            Some(min) => candidates
                .iter()
                .find(|c| c.score.map(|s| s >= min).unwrap_or(false)),
        }
    }

    fn needs_confirmation(&self, candidate: &FlowCandidate) -> bool {
        match self.config.confirm_score {
            None => false,
            Some(threshold) => candidate.score.map(|s| s < threshold).unwrap_or(true),
        }
    }
}

impl Default for BiosphereLinker {
    fn default() -> Self {
        Self::new(LinkerConfig::default())
    }
}
