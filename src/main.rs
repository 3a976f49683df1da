// ==========================================
// Sustain 4.0 BioEngine - 命令行入口
// ==========================================
// 用法:
//   sustain-bioengine import <workbook|csv_dir> [namespace] [level]
//   sustain-bioengine template <dir> [project_name]
//   sustain-bioengine example <dir>
//   sustain-bioengine network <workbook|csv_dir>
//   sustain-bioengine seed-reference <flows.csv>
//   sustain-bioengine databases
// 数据库: SUSTAIN_BIOENGINE_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sustain_bioengine::config::ConfigManager;
use sustain_bioengine::db::{ensure_schema, get_default_db_path, open_sqlite_connection};
use sustain_bioengine::domain::FlowCandidate;
use sustain_bioengine::importer::{
    blank_template, example_workbook, write_csv_workbook, FileParser, LciImporter,
    LciImporterImpl, ProjectInfo, SchemaReader, SchemaReaderImpl, UniversalFileParser,
};
use sustain_bioengine::repository::{
    InventoryRepository, InventoryRepositoryImpl, SqliteReferenceDatabase, WriteMode,
};
use sustain_bioengine::{logging, LciLevel, LciStage, ProcessNetwork, ReferenceFlowDatabase};
use tracing::info;

// 未指定时的清单细节等级
const DEFAULT_LEVEL: u8 = 1;

const USAGE: &str = "usage:
  sustain-bioengine import <workbook|csv_dir> [namespace] [level]
  sustain-bioengine template <dir> [project_name]
  sustain-bioengine example <dir>
  sustain-bioengine network <workbook|csv_dir>
  sustain-bioengine seed-reference <flows.csv>
  sustain-bioengine databases";

/// 参考流 CSV 行: code,name,categories(以 ';' 分隔),unit
#[derive(Debug, Deserialize)]
struct ReferenceFlowRow {
    code: String,
    name: String,
    #[serde(default)]
    categories: String,
    #[serde(default)]
    unit: Option<String>,
}

fn open_store() -> Result<(String, Arc<Mutex<rusqlite::Connection>>)> {
    let db_path = get_default_db_path();
    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("failed to open database {}", db_path))?;
    ensure_schema(&conn).context("failed to initialize database schema")?;
    Ok((db_path, Arc::new(Mutex::new(conn))))
}

fn default_namespace(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cannot derive a namespace from {}", path.display()))
}

async fn run_import(path: PathBuf, namespace: Option<String>, level: Option<String>) -> Result<()> {
    let level = match level {
        Some(raw) => raw
            .parse::<u8>()
            .with_context(|| format!("invalid level '{}'", raw))?,
        None => DEFAULT_LEVEL,
    };
    let level = LciLevel::new(level)?;
    let namespace = match namespace {
        Some(ns) => ns,
        None => default_namespace(&path)?,
    };

    let (db_path, conn) = open_store()?;
    info!(db_path = %db_path, "使用数据库");

    let config = ConfigManager::from_connection(conn.clone())
        .map_err(|e| anyhow!("failed to load config: {}", e))?;
    let reference_db = SqliteReferenceDatabase::from_config(conn.clone(), &config).await?;
    let repo = InventoryRepositoryImpl::from_connection(conn)?;

    let importer = LciImporterImpl::new(config, reference_db);
    let outcome = if path.is_dir() {
        importer.import_from_csv_dir(&path, &namespace).await?
    } else {
        importer.import_from_excel(&path, &namespace).await?
    };

    for issue in &outcome.report.errors {
        eprintln!("error: {}", issue);
    }
    for issue in &outcome.report.warnings {
        eprintln!("warning: {}", issue);
    }

    let stage = outcome.advance_stage(&LciStage::NotStarted.select_level(level))?;

    let model = match &outcome.model {
        Some(model) => model,
        None => bail!(
            "import of {} failed with {} blocking error(s); nothing was written",
            path.display(),
            outcome.report.errors.len()
        ),
    };

    let summary = repo.write_database(model, WriteMode::Replace).await?;
    let stage = stage.record_assembly(&model.namespace)?;

    println!(
        "database '{}': {} processes, {} placeholders, {} exchanges{} [{}]",
        model.namespace,
        summary.processes,
        summary.placeholders,
        summary.exchanges,
        if summary.replaced { " (replaced)" } else { "" },
        stage
    );
    Ok(())
}

fn run_template(dir: PathBuf, project_name: Option<String>) -> Result<()> {
    let project = ProjectInfo {
        name: project_name.unwrap_or_default(),
        ..ProjectInfo::default()
    };
    let files = write_csv_workbook(&dir, &blank_template(&project))?;
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}

fn run_example(dir: PathBuf) -> Result<()> {
    let files = write_csv_workbook(&dir, &example_workbook())?;
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}

fn run_network(path: PathBuf) -> Result<()> {
    let workbook = UniversalFileParser.parse_workbook(&path)?;
    let (tables, issues) = SchemaReaderImpl.read_tables(&workbook);
    for issue in &issues {
        eprintln!("{}", issue);
    }

    let network = ProcessNetwork::from_tables(&tables);
    for node in &network.nodes {
        println!("{} [{}] ({})", node.code, node.name, node.unit);
    }
    for edge in &network.edges {
        println!("{} -> {}: {}", edge.from, edge.to, edge.label);
    }
    Ok(())
}

async fn run_seed_reference(csv_path: PathBuf) -> Result<()> {
    let (_, conn) = open_store()?;
    let config = ConfigManager::from_connection(conn.clone())
        .map_err(|e| anyhow!("failed to load config: {}", e))?;

    let mut reader = csv::Reader::from_path(&csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut flows = Vec::new();
    for row in reader.deserialize::<ReferenceFlowRow>() {
        let row = row?;
        flows.push(FlowCandidate {
            code: row.code,
            name: row.name,
            categories: row
                .categories
                .split(';')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            unit: row.unit.filter(|u| !u.trim().is_empty()),
            score: None,
        });
    }

    let reference_db = SqliteReferenceDatabase::from_config(conn, &config).await?;
    let count = reference_db.seed(&flows)?;
    println!("{} flows loaded into '{}'", count, reference_db.name());
    Ok(())
}

async fn run_databases() -> Result<()> {
    let (_, conn) = open_store()?;
    let repo = InventoryRepositoryImpl::from_connection(conn)?;
    for info in repo.list_databases().await? {
        let exchanges = repo.count_exchanges(&info.name).await?;
        println!(
            "{}\t{} exchanges\t{}",
            info.name,
            exchanges,
            info.created_at.to_rfc3339()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    info!(
        app = sustain_bioengine::APP_NAME,
        version = sustain_bioengine::VERSION,
        "启动"
    );

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();

    match command.as_str() {
        "import" => {
            let path = args.next().ok_or_else(|| anyhow!(USAGE))?;
            let namespace = args.next();
            run_import(PathBuf::from(path), namespace, args.next()).await
        }
        "template" => {
            let dir = args.next().ok_or_else(|| anyhow!(USAGE))?;
            run_template(PathBuf::from(dir), args.next())
        }
        "example" => {
            let dir = args.next().ok_or_else(|| anyhow!(USAGE))?;
            run_example(PathBuf::from(dir))
        }
        "network" => {
            let path = args.next().ok_or_else(|| anyhow!(USAGE))?;
            run_network(PathBuf::from(path))
        }
        "seed-reference" => {
            let path = args.next().ok_or_else(|| anyhow!(USAGE))?;
            run_seed_reference(PathBuf::from(path)).await
        }
        "databases" => run_databases().await,
        _ => bail!(USAGE),
    }
}
