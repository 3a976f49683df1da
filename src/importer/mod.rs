// ==========================================
// Sustain 4.0 BioEngine - 导入层
// ==========================================
// 职责: 外部工作簿 → 类型化导入表 → 清单图
// 支持: Excel, CSV 目录, 内存工作簿
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod lci_importer_impl;
pub mod lci_importer_trait;
pub mod outcome;
pub mod schema_reader;
pub mod template;
pub mod workbook;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvDirectoryParser, ExcelParser, UniversalFileParser};
pub use lci_importer_impl::{LciImporterImpl, PipelineSettings};
pub use outcome::ImportOutcome;
pub use schema_reader::SchemaReader as SchemaReaderImpl;
pub use template::{blank_template, example_workbook, write_csv_workbook, ProjectInfo};
pub use workbook::{Sheet, Workbook};

// 重导出 Trait 接口
pub use lci_importer_trait::{FileParser, ImportRequest, LciImporter, SchemaReader};
