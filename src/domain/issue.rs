// ==========================================
// Sustain 4.0 BioEngine - 导入问题与校验报告
// ==========================================
// 职责: 阻断错误 / 警告的统一载体
// 红线: 数据质量问题只进入报告,不以异常抛出
// ==========================================

use crate::domain::types::{IssueKind, IssueLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ImportIssue - 单条问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub kind: IssueKind,
    pub sheet: Option<String>,
    pub row: Option<usize>,
    pub column: Option<String>,
    pub message: String,
}

impl ImportIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            sheet: None,
            row: None,
            column: None,
            message: message.into(),
        }
    }

    /// 行级问题（定位到 sheet/行/列）
    pub fn at_cell(
        kind: IssueKind,
        sheet: &str,
        row: usize,
        column: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            sheet: Some(sheet.to_string()),
            row: Some(row),
            column: Some(column.to_string()),
            message: message.into(),
        }
    }

    pub fn in_sheet(mut self, sheet: &str) -> Self {
        self.sheet = Some(sheet.to_string());
        self
    }

    pub fn level(&self) -> IssueLevel {
        self.kind.level()
    }

    pub fn is_blocking(&self) -> bool {
        self.kind.is_blocking()
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.sheet, self.row, &self.column) {
            (Some(sheet), Some(row), Some(column)) => {
                write!(f, "{} row {}, column '{}': {}", sheet, row, column, self.message)
            }
            (Some(sheet), Some(row), None) => write!(f, "{} row {}: {}", sheet, row, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

// ==========================================
// ValidationReport - 阻断错误 + 警告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按问题类型自动归入 errors / warnings
    pub fn push(&mut self, issue: ImportIssue) {
        if issue.is_blocking() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    pub fn extend<I: IntoIterator<Item = ImportIssue>>(&mut self, issues: I) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// 追加另一份报告（保持顺序）
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// 无阻断错误即可进入后续流程
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|i| i.to_string()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|i| i.to_string()).collect()
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|i| i.kind == kind)
            .count()
    }
}
