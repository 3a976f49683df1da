// ==========================================
// Sustain 4.0 BioEngine - 导入结果
// ==========================================

use crate::domain::batch::ImportBatch;
use crate::domain::inventory::{InventoryModel, LciTables, ProjectMetadata};
use crate::domain::issue::ValidationReport;
use crate::domain::project::{LciStage, StageTransitionError};
use crate::engine::biosphere_linker::LinkReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 导入接口返回值
///
/// `model` 仅在 `report` 无阻断错误时为 Some;`linking` 同理
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch: ImportBatch,
    pub metadata: ProjectMetadata,
    pub tables: LciTables,
    pub report: ValidationReport,
    pub linking: Option<LinkReport>,
    pub model: Option<InventoryModel>,
    pub elapsed_time: Duration,
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        self.model.is_some()
    }

    /// 按本次导入推进项目阶段（上传 → 校验;组装结果由落库方记录）
    pub fn advance_stage(&self, stage: &LciStage) -> Result<LciStage, StageTransitionError> {
        stage.upload_data()?.record_validation(&self.report)
    }
}
