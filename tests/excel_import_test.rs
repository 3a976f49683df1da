// ==========================================
// Excel 导入集成测试
// ==========================================
// 测试目标: 真实 .xlsx 工作簿经 calamine 读取后的完整流程
// 夹具: tests/fixtures/lci_*.xlsx
//   - 数值型 Amount / Reference Production 单元格
//   - "±" 文本不确定性
//   - Process Activities 表头上方有空行
// ==========================================


use std::path::PathBuf;
use sustain_bioengine::config::ImporterSettings;
use sustain_bioengine::domain::{EdgeTarget, ImportSource, ProcessKey, UncertaintySpec};
use sustain_bioengine::importer::{ExcelParser, FileParser, SchemaReader, SchemaReaderImpl};
use sustain_bioengine::{logging, InMemoryReferenceDatabase, IssueKind, LciImporter, LciImporterImpl};
use test_helpers::reference_flows;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn importer() -> LciImporterImpl<ImporterSettings, InMemoryReferenceDatabase> {
    LciImporterImpl::new(
        ImporterSettings::default(),
        InMemoryReferenceDatabase::new("biosphere3", reference_flows()),
    )
}

#[test]
fn test_excel_parser_reads_typed_cells() {
    let workbook = ExcelParser
        .parse_workbook(&fixture("lci_fermentation.xlsx"))
        .expect("Failed to parse xlsx fixture");

    assert_eq!(
        workbook.sheet_names(),
        vec![
            "Project Metadata",
            "Process Activities",
            "Exchanges",
            "Biosphere Flows Mapping"
        ]
    );

    // 表头上方的空行被保留以维持行号
    let activities = workbook.sheet("Process Activities").unwrap();
    assert!(activities.rows[0].iter().all(|c| c.is_empty()));
    assert_eq!(activities.header().unwrap()[0], "Activity Code");

    let (tables, issues) = SchemaReaderImpl.read_tables(&workbook);
    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    assert_eq!(tables.activities.len(), 1);
    assert_eq!(tables.activities[0].reference_production, 1.0);
    assert_eq!(tables.exchanges.len(), 3);
    assert_eq!(tables.exchanges[1].amount, 1.8);
    assert_eq!(tables.exchanges[1].uncertainty, Some(0.1));
    assert_eq!(tables.exchanges[2].uncertainty, Some(0.05));
    assert_eq!(tables.exchanges[0].uncertainty, None);
    assert_eq!(
        tables.flow_mapping.get("CO2, biogenic").map(String::as_str),
        Some("Carbon dioxide, non-fossil")
    );
}

#[tokio::test]
async fn test_excel_import_assembles_model() {
    logging::init_test();

    let outcome = importer()
        .import_from_excel(fixture("lci_fermentation.xlsx"), "bioethanol")
        .await
        .expect("Excel import should not fail");

    assert!(outcome.is_success(), "errors: {:?}", outcome.report.errors);
    assert_eq!(outcome.batch.source, ImportSource::Excel);
    assert_eq!(outcome.batch.file_name.as_deref(), Some("lci_fermentation.xlsx"));
    assert_eq!(outcome.metadata.get("Functional Unit"), Some("1 L"));

    let model = outcome.model.as_ref().unwrap();
    let node = model.node("FERM_01").unwrap();
    assert_eq!(node.exchanges.len(), 3);
    let emission = &node.exchanges[2];
    assert_eq!(
        emission.input,
        EdgeTarget::Biosphere(ProcessKey::new("biosphere3", "co2-nonfossil"))
    );
    assert_eq!(emission.categories, Some(("air".to_string(),)));
    assert_eq!(
        emission.uncertainty,
        Some(UncertaintySpec::Normal { loc: 0.9, scale: 0.05 })
    );
}

#[tokio::test]
async fn test_excel_bad_amount_is_row_level_parse_error() {
    let outcome = importer()
        .import_from_excel(fixture("lci_bad_amount.xlsx"), "bioethanol")
        .await
        .expect("Data problems are reported, not raised");

    assert_eq!(outcome.report.errors.len(), 1);
    let error = &outcome.report.errors[0];
    assert_eq!(error.kind, IssueKind::Parse);
    assert_eq!(error.sheet.as_deref(), Some("Exchanges"));
    assert_eq!(error.row, Some(5));
    assert_eq!(error.column.as_deref(), Some("Amount"));

    // 其余行照常读取
    assert_eq!(outcome.tables.exchanges.len(), 3);
    assert!(outcome.model.is_none());
}
