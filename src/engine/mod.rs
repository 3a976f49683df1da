// ==========================================
// Sustain 4.0 BioEngine - 引擎层
// ==========================================
// 职责: 校验 / 生物圈链接 / 清单组装 / 过程网络
// 红线: 引擎不做文件 IO、不拼 SQL;数据质量问题只产出 ImportIssue
// ==========================================

pub mod biosphere_linker;
pub mod inventory_assembler;
pub mod process_network;
pub mod validator;

// 重导出核心引擎
pub use biosphere_linker::{
    BiosphereLinker, InMemoryReferenceDatabase, LinkReport, LinkerConfig, ReferenceFlowDatabase,
    ReferenceLookupError, DEFAULT_REFERENCE_DATABASE,
};
pub use inventory_assembler::InventoryAssembler;
pub use process_network::{NetworkEdge, NetworkNode, ProcessNetwork};
pub use validator::{LciValidator, ValidatorConfig};
