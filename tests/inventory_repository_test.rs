// ==========================================
// InventoryRepository 集成测试
// ==========================================
// 测试目标: 文件数据库上的清单库写入 / 列表 / 删除
// ==========================================


use sustain_bioengine::config::ImporterSettings;
use sustain_bioengine::domain::{InventoryModel, ProcessKey};
use sustain_bioengine::importer::example_workbook;
use sustain_bioengine::repository::{
    InventoryRepository, InventoryRepositoryImpl, RepositoryError, WriteMode,
};
use sustain_bioengine::{InMemoryReferenceDatabase, LciImporterImpl};
use test_helpers::{create_test_db, fermentation_workbook, reference_flows};

async fn assemble(workbook: &sustain_bioengine::importer::Workbook, namespace: &str) -> InventoryModel {
    let importer = LciImporterImpl::new(
        ImporterSettings::default(),
        InMemoryReferenceDatabase::new("biosphere3", reference_flows()),
    );
    importer
        .import_workbook(workbook, namespace)
        .await
        .expect("Import should succeed")
        .model
        .expect("Model should be assembled")
}

#[tokio::test]
async fn test_write_list_and_delete() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = InventoryRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let model = assemble(&example_workbook(), "bioethanol").await;
    let summary = repo
        .write_database(&model, WriteMode::FailIfExists)
        .await
        .expect("First write should succeed");

    assert_eq!(summary.processes, 2);
    assert_eq!(summary.placeholders, model.placeholders.len());
    assert!(repo.database_exists("bioethanol").await.unwrap());
    assert_eq!(
        repo.count_exchanges("bioethanol").await.unwrap(),
        model.edge_count()
    );

    let keys = repo.load_process_keys("bioethanol").await.unwrap();
    assert!(keys.contains(&ProcessKey::new("bioethanol", "FERM_01")));
    assert!(keys.contains(&ProcessKey::new("bioethanol", "DIST_01")));
    assert_eq!(keys.len(), 2 + model.placeholders.len());

    let databases = repo.list_databases().await.unwrap();
    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].name, "bioethanol");
    assert_eq!(databases[0].metadata, model.metadata);

    assert!(repo.delete_database("bioethanol").await.unwrap());
    assert!(!repo.delete_database("bioethanol").await.unwrap());
    assert!(!repo.database_exists("bioethanol").await.unwrap());
    assert_eq!(repo.count_exchanges("bioethanol").await.unwrap(), 0);
}

#[tokio::test]
async fn test_fail_if_exists_keeps_original() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = InventoryRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let original = assemble(&example_workbook(), "bioethanol").await;
    repo.write_database(&original, WriteMode::Replace)
        .await
        .unwrap();

    let smaller = assemble(&fermentation_workbook("FERM_01"), "bioethanol").await;
    let result = repo.write_database(&smaller, WriteMode::FailIfExists).await;
    assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));

    // 原库未被改动
    assert_eq!(
        repo.count_exchanges("bioethanol").await.unwrap(),
        original.edge_count()
    );

    let summary = repo
        .write_database(&smaller, WriteMode::Replace)
        .await
        .unwrap();
    assert!(summary.replaced);
    assert_eq!(
        repo.count_exchanges("bioethanol").await.unwrap(),
        smaller.edge_count()
    );
    assert_eq!(repo.list_databases().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_databases_are_isolated_by_name() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = InventoryRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let a = assemble(&example_workbook(), "alpha").await;
    let b = assemble(&fermentation_workbook("FERM_01"), "beta").await;
    repo.write_database(&b, WriteMode::Replace).await.unwrap();
    repo.write_database(&a, WriteMode::Replace).await.unwrap();

    let names: Vec<String> = repo
        .list_databases()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["alpha", "beta"]);

    repo.delete_database("alpha").await.unwrap();
    assert_eq!(repo.count_exchanges("beta").await.unwrap(), b.edge_count());
}
