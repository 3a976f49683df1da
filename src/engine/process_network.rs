// ==========================================
// Sustain 4.0 BioEngine - 过程网络
// ==========================================
// 职责: 从活动/交换表推导批次内技术圈有向图（供应方 → 消费方）
// 输出: 纯数据,不含布局与渲染
// ==========================================

use crate::domain::inventory::LciTables;
use crate::domain::types::ExchangeKind;
use crate::engine::inventory_assembler::internal_supplier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub code: String,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: String, // 供应方活动代码
    pub to: String,   // 消费方活动代码
    pub amount: f64,
    pub unit: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessNetwork {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl ProcessNetwork {
    /// 由导入表构建（自环不计入）
    pub fn from_tables(tables: &LciTables) -> Self {
        let nodes = tables
            .activities
            .iter()
            .map(|a| NetworkNode {
                code: a.code.clone(),
                name: a.name.clone(),
                unit: a.unit.clone(),
            })
            .collect();

        let edges = tables
            .exchanges
            .iter()
            .filter(|e| e.kind == ExchangeKind::Input)
            .filter_map(|e| {
                let supplier = internal_supplier(tables, e)?;
                if supplier.code == e.activity_code {
                    return None;
                }
                Some(NetworkEdge {
                    from: supplier.code.clone(),
                    to: e.activity_code.clone(),
                    amount: e.amount,
                    unit: e.unit.clone(),
                    label: format!("{:.2} {}", e.amount, e.unit),
                })
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn suppliers_of(&self, code: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.to == code)
            .map(|e| e.from.as_str())
            .collect()
    }

    pub fn consumers_of(&self, code: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.from == code)
            .map(|e| e.to.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::{Activity, Exchange};

    fn activity(code: &str, name: &str) -> Activity {
        Activity {
            code: code.to_string(),
            name: name.to_string(),
            unit: "kg".to_string(),
            location: "BR".to_string(),
            reference_production: 1.0,
            row: 2,
        }
    }

    fn input(code: &str, flow: &str, amount: f64) -> Exchange {
        Exchange {
            activity_code: code.to_string(),
            kind: ExchangeKind::Input,
            flow_name: flow.to_string(),
            amount,
            unit: "kg".to_string(),
            category: None,
            uncertainty: None,
            linked_activity_code: None,
            row: 2,
        }
    }

    #[test]
    fn test_network_edges_and_labels() {
        let tables = LciTables {
            activities: vec![
                activity("FERM_01", "Fermentation"),
                activity("DIST_01", "Distillation"),
            ],
            exchanges: vec![
                input("FERM_01", "Sugarcane juice", 1.8),
                input("DIST_01", "Fermentation", 10.0 / 3.0),
                input("FERM_01", "Fermentation", 0.1), // 自环
            ],
            ..LciTables::default()
        };

        let network = ProcessNetwork::from_tables(&tables);

        assert_eq!(network.nodes.len(), 2);
        assert_eq!(network.edges.len(), 1);
        assert_eq!(network.edges[0].label, "3.33 kg");
        assert_eq!(network.suppliers_of("DIST_01"), vec!["FERM_01"]);
        assert_eq!(network.consumers_of("FERM_01"), vec!["DIST_01"]);
        assert!(network.suppliers_of("FERM_01").is_empty());
    }
}
