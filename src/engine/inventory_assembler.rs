// ==========================================
// Sustain 4.0 BioEngine - 清单组装器
// ==========================================
// 职责: 已校验的 LciTables + 链接结果 → InventoryModel
// 前置: 报告无阻断错误;本模块不做任何校验
// ==========================================

use crate::domain::inventory::{
    Activity, EdgeTarget, Exchange, ExchangeEdge, InventoryModel, LciTables, LinkedFlow, PlaceholderKind,
    PlaceholderNode, ProcessKey, ProcessNode, UncertaintySpec,
};
use crate::domain::types::{EdgeType, ExchangeKind};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// 未解析技术圈输入的占位代码前缀
pub const GENERIC_TECHNOSPHERE_PREFIX: &str = "generic_";
/// 未解析生物圈流的占位代码前缀
pub const GENERIC_BIOSPHERE_PREFIX: &str = "bio_";

pub struct InventoryAssembler {
    namespace: String,
}

impl InventoryAssembler {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 组装清单图（同一输入 → 同一输出）
    pub fn assemble(
        &self,
        tables: &LciTables,
        linked: &BTreeMap<String, LinkedFlow>,
    ) -> InventoryModel {
        let mut placeholders: Vec<PlaceholderNode> = Vec::new();
        let mut seen_placeholders: HashSet<ProcessKey> = HashSet::new();

        let mut nodes = Vec::with_capacity(tables.activities.len());
        for activity in &tables.activities {
            let key = ProcessKey::new(&self.namespace, &activity.code);

            let exchanges: Vec<ExchangeEdge> = tables
                .exchanges_of(&activity.code)
                .map(|exchange| {
                    let (input, edge_type) = self.resolve_input(tables, linked, &key, exchange);

                    if let Some(placeholder) = placeholder_for(&input, exchange) {
                        if seen_placeholders.insert(placeholder.key.clone()) {
                            placeholders.push(placeholder);
                        }
                    }

                    ExchangeEdge {
                        input,
                        edge_type,
                        amount: exchange.amount,
                        unit: exchange.unit.clone(),
                        name: Some(exchange.flow_name.clone()),
                        categories: match edge_type {
                            EdgeType::Biosphere => exchange.category.clone().map(|c| (c,)),
                            _ => None,
                        },
                        uncertainty: exchange.uncertainty.map(|scale| UncertaintySpec::Normal {
                            loc: exchange.amount,
                            scale,
                        }),
                    }
                })
                .collect();

            debug!(code = %activity.code, edges = exchanges.len(), "过程节点已组装");

            nodes.push(ProcessNode {
                key,
                name: activity.name.clone(),
                unit: activity.unit.clone(),
                location: activity.location.clone(),
                production_amount: activity.reference_production,
                exchanges,
            });
        }

        let model = InventoryModel {
            namespace: self.namespace.clone(),
            metadata: tables.metadata.clone(),
            nodes,
            placeholders,
        };

        info!(
            namespace = %self.namespace,
            nodes = model.nodes.len(),
            edges = model.edge_count(),
            placeholders = model.placeholders.len(),
            "清单组装完成"
        );

        model
    }

    fn resolve_input(
        &self,
        tables: &LciTables,
        linked: &BTreeMap<String, LinkedFlow>,
        own_key: &ProcessKey,
        exchange: &Exchange,
    ) -> (EdgeTarget, EdgeType) {
        match exchange.kind {
            ExchangeKind::Production => (EdgeTarget::Production(own_key.clone()), EdgeType::Production),
            ExchangeKind::Input => {
                let target = match internal_supplier(tables, exchange) {
                    Some(activity) => {
                        EdgeTarget::Internal(ProcessKey::new(&self.namespace, &activity.code))
                    }
                    None => EdgeTarget::GenericTechnosphere(ProcessKey::new(
                        &self.namespace,
                        format!("{}{}", GENERIC_TECHNOSPHERE_PREFIX, exchange.flow_name),
                    )),
                };
                (target, EdgeType::Technosphere)
            }
            ExchangeKind::Emission | ExchangeKind::Resource => {
                let target = match linked.get(&exchange.flow_name) {
                    Some(flow) => EdgeTarget::Biosphere(flow.key()),
                    None => EdgeTarget::GenericBiosphere(ProcessKey::new(
                        &self.namespace,
                        format!("{}{}", GENERIC_BIOSPHERE_PREFIX, exchange.flow_name),
                    )),
                };
                (target, EdgeType::Biosphere)
            }
        }
    }
}

/// 技术圈输入对应的表内活动: 显式代码优先,否则按名称匹配表内首个活动
pub(crate) fn internal_supplier<'a>(tables: &'a LciTables, exchange: &Exchange) -> Option<&'a Activity> {
    match &exchange.linked_activity_code {
        Some(code) => tables.activity_by_code(code),
        None => tables
            .activities
            .iter()
            .find(|a| a.name == exchange.flow_name),
    }
}

fn placeholder_for(target: &EdgeTarget, exchange: &Exchange) -> Option<PlaceholderNode> {
    let kind = match target {
        EdgeTarget::GenericTechnosphere(_) => PlaceholderKind::Technosphere,
        EdgeTarget::GenericBiosphere(_) => PlaceholderKind::Biosphere,
        _ => return None,
    };
    Some(PlaceholderNode {
        key: target.key().clone(),
        name: exchange.flow_name.clone(),
        unit: exchange.unit.clone(),
        kind,
    })
}
