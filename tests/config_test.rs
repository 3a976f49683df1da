// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取、快照与对导入流程的影响
// ==========================================


use sustain_bioengine::config::{config_keys, ConfigManager, ImportConfigReader};
use sustain_bioengine::importer::example_workbook;
use sustain_bioengine::{InMemoryReferenceDatabase, IssueKind, LciImporterImpl};
use test_helpers::{create_test_db, reference_flows};

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_defaults_on_fresh_db() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let validator = config_manager.validator_config().await.unwrap();
    assert_eq!(validator.mass_balance_min_ratio, 0.3);
    assert_eq!(validator.mass_balance_max_ratio, 1.2);
    assert_eq!(validator.mass_units, vec!["kg", "g", "t", "ton"]);

    assert_eq!(
        config_manager.get_reference_database_name().await.unwrap(),
        "biosphere3"
    );

    let linker = config_manager.linker_config().await.unwrap();
    assert_eq!(linker.min_score, None);
    assert_eq!(linker.confirm_score, None);
}

#[tokio::test]
async fn test_stored_values_override_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::MASS_UNITS, "kg, lb")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::CONFIRM_MATCH_SCORE, "0.8")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MASS_BALANCE_MIN_RATIO, "not-a-number")
        .unwrap();

    assert_eq!(
        config_manager.get_mass_units().await.unwrap(),
        vec!["kg", "lb"]
    );
    assert_eq!(
        config_manager.get_confirm_match_score().await.unwrap(),
        Some(0.8)
    );
    // 格式错误 → 默认值
    assert_eq!(
        config_manager.get_mass_balance_min_ratio().await.unwrap(),
        0.3
    );
}

#[tokio::test]
async fn test_snapshot_round_trip_across_databases() {
    let (_source_file, source_path) = create_test_db().expect("Failed to create test db");
    let (_target_file, target_path) = create_test_db().expect("Failed to create test db");

    let source = ConfigManager::new(&source_path).unwrap();
    source
        .set_global_config_value(config_keys::REFERENCE_DATABASE_NAME, "ecoinvent-bio")
        .unwrap();
    source
        .set_global_config_value(config_keys::MASS_BALANCE_MAX_RATIO, "1.5")
        .unwrap();
    let snapshot = source.get_config_snapshot().unwrap();

    let target = ConfigManager::new(&target_path).unwrap();
    let restored = target.restore_config_from_snapshot(&snapshot).unwrap();
    assert_eq!(restored, 2);
    assert_eq!(
        target.get_reference_database_name().await.unwrap(),
        "ecoinvent-bio"
    );
    assert_eq!(target.get_mass_balance_max_ratio().await.unwrap(), 1.5);
    assert_eq!(target.get_config_snapshot().unwrap(), snapshot);
}

#[tokio::test]
async fn test_config_drives_validation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    // 放宽下限 → DIST_01 不再告警
    config_manager
        .set_global_config_value(config_keys::MASS_BALANCE_MIN_RATIO, "0.01")
        .unwrap();

    let importer = LciImporterImpl::new(
        config_manager,
        InMemoryReferenceDatabase::new("biosphere3", reference_flows()),
    );
    let outcome = importer
        .import_workbook(&example_workbook(), "bioethanol")
        .await
        .unwrap();

    assert_eq!(outcome.report.count_of(IssueKind::MassBalance), 0);
    assert!(outcome.is_success());
}
