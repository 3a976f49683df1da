// ==========================================
// Sustain 4.0 BioEngine - 清单领域模型
// ==========================================
// 职责: 导入表（元数据/活动/交换/映射）与组装输出（InventoryModel）
// 用途: 导入层写入,引擎层只读
// ==========================================

use crate::domain::types::{EdgeType, ExchangeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ProjectMetadata - 项目元数据
// ==========================================
// 自由文本键值对,无必填键;保持表内顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    entries: Vec<(String, String)>,
}

impl ProjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入键值;重复键以后出现者为准
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// Activity - 单元过程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub code: String,              // 批次内唯一
    pub name: String,              // 名称（内部链接的匹配键）
    pub unit: String,
    pub location: String,
    pub reference_production: f64, // 参考产量（> 0）
    pub row: usize,                // 表格行号
}

// ==========================================
// Exchange - 交换流
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub activity_code: String,
    pub kind: ExchangeKind,
    pub flow_name: String,
    pub amount: f64,
    pub unit: String,
    pub category: Option<String>,
    pub uncertainty: Option<f64>,              // 缺失 ≠ 0
    pub linked_activity_code: Option<String>, // 显式技术圈外键（可选列）
    pub row: usize,
}

// ==========================================
// FlowMapping - 用户流名 → 标准流名
// ==========================================
pub type FlowMapping = BTreeMap<String, String>;

// ==========================================
// LciTables - Schema Reader 输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LciTables {
    pub metadata: ProjectMetadata,
    pub activities: Vec<Activity>,
    pub exchanges: Vec<Exchange>,
    pub flow_mapping: FlowMapping,
}

impl LciTables {
    pub fn activity_by_code(&self, code: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.code == code)
    }

    pub fn exchanges_of<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Exchange> + 'a {
        self.exchanges.iter().filter(move |e| e.activity_code == code)
    }
}

// ==========================================
// FlowCandidate - 参考流检索候选
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowCandidate {
    pub code: String,
    pub name: String,
    pub categories: Vec<String>,
    pub unit: Option<String>,
    pub score: Option<f64>, // 相似度 [0, 1],检索实现可不提供
}

// ==========================================
// LinkedFlow - 已解析的生物圈流
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedFlow {
    pub database: String,
    pub code: String,
    pub matched_name: String,
    pub search_term: String,
    pub score: Option<f64>,
    pub needs_confirmation: bool,
}

impl LinkedFlow {
    pub fn key(&self) -> ProcessKey {
        ProcessKey::new(self.database.clone(), self.code.clone())
    }
}

// ==========================================
// ProcessKey - (命名空间, 代码)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessKey {
    pub database: String,
    pub code: String,
}

impl ProcessKey {
    pub fn new(database: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            code: code.into(),
        }
    }
}

// ==========================================
// EdgeTarget - 交换边的输入端
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum EdgeTarget {
    Production(ProcessKey),          // 活动自身
    Internal(ProcessKey),            // 批次内其他活动
    GenericTechnosphere(ProcessKey), // 未解析的物料/能源输入占位
    Biosphere(ProcessKey),           // 已解析的外部参考流
    GenericBiosphere(ProcessKey),    // 未解析的生物圈流占位
}

impl EdgeTarget {
    pub fn key(&self) -> &ProcessKey {
        match self {
            EdgeTarget::Production(k)
            | EdgeTarget::Internal(k)
            | EdgeTarget::GenericTechnosphere(k)
            | EdgeTarget::Biosphere(k)
            | EdgeTarget::GenericBiosphere(k) => k,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            EdgeTarget::GenericTechnosphere(_) | EdgeTarget::GenericBiosphere(_)
        )
    }
}

// ==========================================
// UncertaintySpec - 不确定性参数化
// ==========================================
// 仅支持正态分布
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "lowercase")]
pub enum UncertaintySpec {
    Normal { loc: f64, scale: f64 },
}

impl UncertaintySpec {
    /// 外部 LCA 引擎的不确定性类型编号（正态 = 3）
    pub fn type_id(&self) -> i32 {
        match self {
            UncertaintySpec::Normal { .. } => 3,
        }
    }
}

// ==========================================
// ExchangeEdge - 组装后的交换边
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeEdge {
    pub input: EdgeTarget,
    pub edge_type: EdgeType,
    pub amount: f64,
    pub unit: String,
    pub name: Option<String>,                // 表内原始流名
    pub categories: Option<(String,)>,       // 单分类
    pub uncertainty: Option<UncertaintySpec>,
}

// ==========================================
// ProcessNode - 过程节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessNode {
    pub key: ProcessKey,
    pub name: String,
    pub unit: String,
    pub location: String,
    pub production_amount: f64,
    pub exchanges: Vec<ExchangeEdge>,
}

// ==========================================
// PlaceholderKind / PlaceholderNode - 新建的通用占位节点
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Technosphere,
    Biosphere,
}

impl PlaceholderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKind::Technosphere => "generic_technosphere",
            PlaceholderKind::Biosphere => "generic_biosphere",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderNode {
    pub key: ProcessKey,
    pub name: String,
    pub unit: String,
    pub kind: PlaceholderKind,
}

// ==========================================
// InventoryModel - 交付外部 LCA 引擎的清单图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryModel {
    pub namespace: String,
    pub metadata: ProjectMetadata,
    pub nodes: Vec<ProcessNode>,
    pub placeholders: Vec<PlaceholderNode>,
}

impl InventoryModel {
    pub fn node(&self, code: &str) -> Option<&ProcessNode> {
        self.nodes.iter().find(|n| n.key.code == code)
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.exchanges.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_keeps_order_and_overwrites() {
        let mut metadata = ProjectMetadata::new();
        metadata.insert("Project Name", "Bioethanol");
        metadata.insert("Functional Unit", "1 L");
        metadata.insert("Project Name", "Bioethanol v2");

        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("Project Name"), Some("Bioethanol v2"));
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Project Name", "Functional Unit"]);
    }

    #[test]
    fn test_edge_target_placeholder() {
        let key = ProcessKey::new("db", "generic_Water");
        assert!(EdgeTarget::GenericTechnosphere(key.clone()).is_placeholder());
        assert!(!EdgeTarget::Internal(key.clone()).is_placeholder());
        assert_eq!(EdgeTarget::GenericBiosphere(key.clone()).key(), &key);
    }

    #[test]
    fn test_categories_serialize_as_one_element_array() {
        let edge = ExchangeEdge {
            input: EdgeTarget::GenericBiosphere(ProcessKey::new("db", "bio_CO2")),
            edge_type: EdgeType::Biosphere,
            amount: 0.5,
            unit: "kg".to_string(),
            name: Some("CO2".to_string()),
            categories: Some(("air".to_string(),)),
            uncertainty: Some(UncertaintySpec::Normal { loc: 0.5, scale: 0.05 }),
        };

        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["categories"], serde_json::json!(["air"]));
        assert_eq!(value["uncertainty"]["distribution"], "normal");
    }
}
