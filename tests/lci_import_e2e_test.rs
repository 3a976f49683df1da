// ==========================================
// 端到端集成测试 - LCI 导入完整流程
// ==========================================
// 测试目标: CSV 目录 → 校验 → 链接 → 组装 → 落库
// 覆盖范围: LciImporterImpl + SqliteReferenceDatabase + InventoryRepositoryImpl
// ==========================================


use std::sync::{Arc, Mutex};
use sustain_bioengine::config::{ConfigManager, ImporterSettings};
use sustain_bioengine::domain::{EdgeTarget, ImportSource, PlaceholderKind, ProcessKey};
use sustain_bioengine::importer::{example_workbook, ImportRequest};
use sustain_bioengine::repository::{
    InventoryRepository, InventoryRepositoryImpl, SqliteReferenceDatabase, WriteMode,
};
use sustain_bioengine::{
    logging, ImportError, InMemoryReferenceDatabase, IssueKind, LciImporter, LciImporterImpl,
    LciLevel, LciStage,
};
use test_helpers::{create_test_db, fermentation_workbook, open_test_connection, reference_flows, workbook_dir};

// ==========================================
// 测试辅助函数
// ==========================================

fn in_memory_importer() -> LciImporterImpl<ImporterSettings, InMemoryReferenceDatabase> {
    LciImporterImpl::new(
        ImporterSettings::default(),
        InMemoryReferenceDatabase::new("biosphere3", reference_flows()),
    )
}

// ==========================================
// 测试用例 1: CSV 目录导入并落库
// ==========================================

#[tokio::test]
async fn test_e2e_csv_dir_import_and_store() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = Arc::new(Mutex::new(
        open_test_connection(&db_path).expect("Failed to open db"),
    ));

    let reference_db = SqliteReferenceDatabase::from_connection(conn.clone(), "biosphere3")
        .expect("Failed to create reference db");
    reference_db.seed(&reference_flows()).expect("Failed to seed reference flows");

    let config = ConfigManager::from_connection(conn.clone()).expect("Failed to create config");
    let importer = LciImporterImpl::new(config, reference_db);
    let dir = workbook_dir(&example_workbook()).expect("Failed to write workbook");

    let outcome = importer
        .import_from_csv_dir(dir.path(), "bioethanol")
        .await
        .expect("Import should not fail");

    assert!(outcome.is_success(), "errors: {:?}", outcome.report.errors);
    assert_eq!(outcome.batch.source, ImportSource::CsvDirectory);
    assert_eq!(outcome.batch.activity_count, 2);
    assert_eq!(outcome.batch.exchange_count, 11);
    // DIST_01 输入 1.2 kg、输出 0.02 kg → 质量平衡警告
    assert_eq!(outcome.report.count_of(IssueKind::MassBalance), 1);

    let linking = outcome.linking.as_ref().expect("linking should run");
    assert!(linking.available);
    assert!(linking.unresolved.is_empty());
    assert_eq!(linking.linked["Ethanol vapor"].code, "ethanol-air");
    assert_eq!(linking.linked["Wastewater"].code, "water-natural");

    let model = outcome.model.as_ref().expect("model should be assembled");
    let ferm = model.node("FERM_01").expect("FERM_01 node");
    let co2 = ferm
        .exchanges
        .iter()
        .find(|e| e.name.as_deref() == Some("CO2, biogenic"))
        .expect("CO2 edge");
    assert_eq!(
        co2.input,
        EdgeTarget::Biosphere(ProcessKey::new("biosphere3", "co2-nonfossil"))
    );
    assert!(model
        .placeholders
        .iter()
        .all(|p| p.kind == PlaceholderKind::Technosphere));

    // 落库
    let repo = InventoryRepositoryImpl::from_connection(conn).expect("Failed to create repo");
    let summary = repo
        .write_database(model, WriteMode::Replace)
        .await
        .expect("Failed to write inventory");
    assert_eq!(summary.processes, 2);
    assert_eq!(summary.exchanges, model.edge_count());
    assert!(!summary.replaced);

    let stage = outcome
        .advance_stage(&LciStage::NotStarted.select_level(LciLevel::new(2).unwrap()))
        .unwrap()
        .record_assembly(&model.namespace)
        .unwrap();
    assert!(matches!(stage, LciStage::Assembled { .. }));
}

// ==========================================
// 测试用例 2: 阻断错误 → 无模型
// ==========================================

#[tokio::test]
async fn test_e2e_unknown_activity_blocks_assembly() {
    logging::init_test();

    let importer = in_memory_importer();
    let dir = workbook_dir(&fermentation_workbook("FERM_99")).expect("Failed to write workbook");

    let outcome = importer
        .import_from_csv_dir(dir.path(), "bioethanol")
        .await
        .expect("Data problems are reported, not raised");

    assert!(!outcome.is_success());
    assert_eq!(outcome.report.errors.len(), 1);
    assert_eq!(outcome.report.errors[0].kind, IssueKind::ReferentialIntegrity);
    assert!(outcome.linking.is_none());
    assert!(outcome.model.is_none());

    let stage = outcome
        .advance_stage(&LciStage::NotStarted.select_level(LciLevel::new(1).unwrap()))
        .unwrap();
    assert!(matches!(stage, LciStage::DataUploaded { .. }));
    assert!(stage.record_assembly("bioethanol").is_err());
}

// ==========================================
// 测试用例 3: 同一输入 → 相同清单图
// ==========================================

#[tokio::test]
async fn test_e2e_import_is_deterministic() {
    let importer = in_memory_importer();
    let dir = workbook_dir(&example_workbook()).expect("Failed to write workbook");

    let first = importer
        .import_from_csv_dir(dir.path(), "bioethanol")
        .await
        .unwrap();
    let second = importer
        .import_from_csv_dir(dir.path(), "bioethanol")
        .await
        .unwrap();

    assert_ne!(first.batch.batch_id, second.batch.batch_id);
    assert_eq!(first.model, second.model);
    assert_eq!(first.report, second.report);
}

// ==========================================
// 测试用例 4: 参考库不可用 → 全部生物圈流占位
// ==========================================

#[tokio::test]
async fn test_e2e_unavailable_reference_db_falls_back() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    // 未导入参考流
    let reference_db =
        SqliteReferenceDatabase::new(&db_path, "biosphere3").expect("Failed to create reference db");
    let importer = LciImporterImpl::new(ImporterSettings::default(), reference_db);

    let outcome = importer
        .import_workbook(&example_workbook(), "bioethanol")
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.report.count_of(IssueKind::LinkerUnavailable), 1);
    assert_eq!(outcome.report.count_of(IssueKind::UnlinkedFlow), 0);

    let linking = outcome.linking.as_ref().unwrap();
    assert!(!linking.available);
    assert_eq!(
        linking.unresolved,
        vec!["CO2, biogenic", "Ethanol vapor", "Wastewater"]
    );

    let model = outcome.model.as_ref().unwrap();
    let bio_placeholders: Vec<&str> = model
        .placeholders
        .iter()
        .filter(|p| p.kind == PlaceholderKind::Biosphere)
        .map(|p| p.key.code.as_str())
        .collect();
    assert_eq!(bio_placeholders.len(), 3);
    assert!(bio_placeholders.contains(&"bio_Wastewater"));
}

// ==========================================
// 测试用例 5: 批量导入
// ==========================================

#[tokio::test]
async fn test_e2e_batch_import() {
    let importer = in_memory_importer();
    let good = workbook_dir(&example_workbook()).expect("Failed to write workbook");
    let bad = workbook_dir(&fermentation_workbook("FERM_99")).expect("Failed to write workbook");

    let results = importer
        .batch_import(vec![
            ImportRequest::new(good.path(), "example"),
            ImportRequest::new(bad.path(), "broken"),
            ImportRequest::new(good.path().join("missing"), "missing"),
        ])
        .await
        .expect("Batch import should return per-request results");

    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().is_success());
    assert!(!results[1].as_ref().unwrap().is_success());
    assert!(results[2].is_err());
}

// ==========================================
// 测试用例 6: 非法输入
// ==========================================

#[tokio::test]
async fn test_e2e_rejects_bad_inputs() {
    let importer = in_memory_importer();
    let dir = workbook_dir(&example_workbook()).expect("Failed to write workbook");

    let result = importer.import_from_csv_dir(dir.path(), "").await;
    assert!(matches!(result, Err(ImportError::InvalidNamespace(_))));

    let result = importer
        .import_from_excel(dir.path().join("nope.xlsx"), "bioethanol")
        .await;
    assert!(result.is_err());

    let result = importer.import_from_excel(dir.path(), "bioethanol").await;
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}
