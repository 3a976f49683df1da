// ==========================================
// Sustain 4.0 BioEngine - LCI 导入器实现
// ==========================================
// 职责: 整合导入流程，从工作簿到清单图
// 流程: 解析 → Schema Reader → 校验 → 生物圈链接 → 组装
// 红线: 存在阻断错误时不链接、不组装
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::batch::{ImportBatch, ImportSource};
use crate::domain::issue::ValidationReport;
use crate::engine::biosphere_linker::{BiosphereLinker, LinkerConfig, ReferenceFlowDatabase};
use crate::engine::inventory_assembler::InventoryAssembler;
use crate::engine::validator::{LciValidator, ValidatorConfig};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::lci_importer_trait::{
    FileParser, ImportRequest, LciImporter, SchemaReader as SchemaReaderTrait,
};
use crate::importer::outcome::ImportOutcome;
use crate::importer::schema_reader::SchemaReader;
use crate::importer::workbook::Workbook;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 一次导入使用的引擎参数（从配置读取器解析）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSettings {
    pub validator: ValidatorConfig,
    pub linker: LinkerConfig,
}

// ==========================================
// LciImporterImpl - LCI 导入器实现
// ==========================================
pub struct LciImporterImpl<C, D>
where
    C: ImportConfigReader,
    D: ReferenceFlowDatabase,
{
    // 配置读取器
    config: C,

    // 外部参考流数据库（只读,可跨导入共享）
    reference_db: D,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    schema_reader: Box<dyn SchemaReaderTrait>,
}

impl<C, D> LciImporterImpl<C, D>
where
    C: ImportConfigReader,
    D: ReferenceFlowDatabase,
{
    /// 使用默认解析组件创建导入器
    pub fn new(config: C, reference_db: D) -> Self {
        Self::with_components(
            config,
            reference_db,
            Box::new(UniversalFileParser),
            Box::new(SchemaReader),
        )
    }

    pub fn with_components(
        config: C,
        reference_db: D,
        file_parser: Box<dyn FileParser>,
        schema_reader: Box<dyn SchemaReaderTrait>,
    ) -> Self {
        Self {
            config,
            reference_db,
            file_parser,
            schema_reader,
        }
    }

    pub fn reference_db(&self) -> &D {
        &self.reference_db
    }

    /// 从配置读取器解析引擎参数
    pub async fn load_settings(&self) -> ImportResult<PipelineSettings> {
        let validator = self
            .config
            .validator_config()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "mass_balance".to_string(),
                message: e.to_string(),
            })?;
        let linker = self
            .config
            .linker_config()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "match_score".to_string(),
                message: e.to_string(),
            })?;

        let reference_name = self
            .config
            .get_reference_database_name()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "reference_database_name".to_string(),
                message: e.to_string(),
            })?;
        if reference_name != self.reference_db.name() {
            warn!(
                configured = %reference_name,
                actual = %self.reference_db.name(),
                "参考流数据库与配置不一致"
            );
        }

        Ok(PipelineSettings { validator, linker })
    }

    /// 导入内存工作簿（模板/测试/已解析数据源）
    #[instrument(skip(self, workbook))]
    pub async fn import_workbook(
        &self,
        workbook: &Workbook,
        namespace: &str,
    ) -> ImportResult<ImportOutcome> {
        let settings = self.load_settings().await?;
        self.run_pipeline(workbook, namespace, ImportSource::InMemory, None, &settings)
    }

    /// 同步核心流程（不做文件 IO、不读配置）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 报告有阻断错误时 linking/model 为 None
    /// - Err(InvalidNamespace): 命名空间为空
    pub fn run_pipeline(
        &self,
        workbook: &Workbook,
        namespace: &str,
        source: ImportSource,
        file_path: Option<&Path>,
        settings: &PipelineSettings,
    ) -> ImportResult<ImportOutcome> {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            return Err(ImportError::InvalidNamespace(namespace.to_string()));
        }

        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, namespace = %namespace, source = ?source, "开始导入 LCI 数据");

        // === 步骤 1: 读取工作表 ===
        debug!("步骤 1: 读取工作表");
        let (tables, reader_issues) = self.schema_reader.read_tables(workbook);
        let mut report = ValidationReport::new();
        report.extend(reader_issues);
        info!(
            activities = tables.activities.len(),
            exchanges = tables.exchanges.len(),
            reader_errors = report.errors.len(),
            "工作表读取完成"
        );

        // === 步骤 2: 校验 ===
        debug!("步骤 2: 数据校验");
        let validator = LciValidator::new(settings.validator.clone());
        report.merge(validator.validate(&tables));
        info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "数据校验完成"
        );

        // 阻断错误: 不链接、不组装
        let (linking, model) = if report.is_valid() {
            // === 步骤 3: 生物圈流链接 ===
            debug!("步骤 3: 生物圈流链接");
            let linker = BiosphereLinker::new(settings.linker.clone());
            let linking = linker.link(&tables, &self.reference_db);
            report.extend(linking.issues.iter().cloned());

            // === 步骤 4: 清单组装 ===
            debug!("步骤 4: 清单组装");
            let model = InventoryAssembler::new(namespace).assemble(&tables, &linking.linked);
            (Some(linking), Some(model))
        } else {
            warn!(
                batch_id = %batch_id,
                errors = report.errors.len(),
                "存在阻断错误，跳过链接与组装"
            );
            (None, None)
        };

        let elapsed_time = start_time.elapsed();

        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            namespace: namespace.to_string(),
            source,
            file_name: file_path
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(str::to_string),
            file_path: file_path.map(|p| p.display().to_string()),
            activity_count: tables.activities.len(),
            exchange_count: tables.exchanges.len(),
            error_count: report.errors.len(),
            warning_count: report.warnings.len(),
            imported_at: Utc::now(),
            elapsed_ms: elapsed_time.as_millis() as u64,
        };

        info!(
            batch_id = %batch_id,
            success = model.is_some(),
            errors = batch.error_count,
            warnings = batch.warning_count,
            elapsed_ms = batch.elapsed_ms,
            "LCI 导入完成"
        );

        Ok(ImportOutcome {
            batch,
            metadata: tables.metadata.clone(),
            tables,
            report,
            linking,
            model,
            elapsed_time,
        })
    }

    async fn import_path(
        &self,
        path: &Path,
        namespace: &str,
        source: ImportSource,
    ) -> ImportResult<ImportOutcome> {
        let settings = self.load_settings().await?;

        debug!(path = %path.display(), "解析数据源");
        let workbook = self.file_parser.parse_workbook(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "数据源解析失败");
            e
        })?;
        info!(sheets = ?workbook.sheet_names(), "数据源解析完成");

        self.run_pipeline(&workbook, namespace, source, Some(path), &settings)
    }
}

#[async_trait::async_trait]
impl<C, D> LciImporter for LciImporterImpl<C, D>
where
    C: ImportConfigReader + Send + Sync,
    D: ReferenceFlowDatabase + Send + Sync,
{
    #[instrument(skip(self, file_path))]
    async fn import_from_excel<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        namespace: &str,
    ) -> ImportResult<ImportOutcome> {
        let path = file_path.as_ref();
        if path.is_dir() {
            return Err(ImportError::UnsupportedFormat(format!(
                "{} is a directory",
                path.display()
            )));
        }
        self.import_path(path, namespace, ImportSource::Excel).await
    }

    #[instrument(skip(self, dir_path))]
    async fn import_from_csv_dir<P: AsRef<Path> + Send>(
        &self,
        dir_path: P,
        namespace: &str,
    ) -> ImportResult<ImportOutcome> {
        let path = dir_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if !path.is_dir() {
            return Err(ImportError::UnsupportedFormat(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        self.import_path(path, namespace, ImportSource::CsvDirectory).await
    }

    async fn batch_import(
        &self,
        requests: Vec<ImportRequest>,
    ) -> ImportResult<Vec<Result<ImportOutcome, String>>> {
        use futures::future::join_all;

        info!(count = requests.len(), "开始批量导入");

        // 为每个请求创建导入任务
        let import_tasks = requests.into_iter().map(|request| async move {
            let path_str = request.path.display().to_string();
            let result = if request.path.is_dir() {
                self.import_from_csv_dir(&request.path, &request.namespace).await
            } else {
                self.import_from_excel(&request.path, &request.namespace).await
            };
            match result {
                Ok(outcome) => {
                    info!(
                        file = %path_str,
                        namespace = %request.namespace,
                        success = outcome.is_success(),
                        "导入完成"
                    );
                    Ok(outcome)
                }
                Err(e) => {
                    error!(file = %path_str, error = %e, "导入失败");
                    Err(format!("import of {} failed: {}", path_str, e))
                }
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        Ok(results)
    }
}
