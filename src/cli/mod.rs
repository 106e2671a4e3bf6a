//! forgeml CLI Module
//!
//! Command-line host for profiling, transforming, training and serving models.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::insights::{generate_or_fallback, HeuristicInsights};
use crate::preprocessing::{StepSpec, TransformEngine};
use crate::profile::profile;
use crate::registry::ModelRegistry;
use crate::table::{format_number, Table};
use crate::training::{recommend_algorithms, ProblemType, Trainer, TrainingConfig};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
    let _ = std::io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "forgeml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Declarative tabular transforms and a persisted model lifecycle")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding saved models (defaults to FORGEML_MODELS_DIR or ./models)
    #[arg(long, global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile a dataset and suggest algorithms
    Profile {
        /// Input data file (CSV, TSV, JSON, JSONL or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Target column (defaults to the last column)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Apply a step list to a dataset
    Transform {
        #[arg(short, long)]
        data: PathBuf,

        /// JSON file holding an array of {type, action, params} steps
        #[arg(short, long)]
        steps: PathBuf,

        /// Write the transformed table as CSV instead of previewing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preview rows
        #[arg(long, default_value = "5")]
        head: usize,
    },

    /// Train a model and save it
    Train {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        target: String,

        /// Algorithm id (rf_clf, log_reg, rf_reg, lin_reg); defaults to the
        /// first recommendation for the problem type
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Optional step list applied before training
        #[arg(short, long)]
        steps: Option<PathBuf>,

        /// Override the inferred problem type
        #[arg(long)]
        problem_type: Option<String>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        n_estimators: Option<usize>,
    },

    /// Predict with a saved model; prints JSON
    Predict {
        model_id: String,

        /// JSON file holding one row object or an array of them
        #[arg(short, long, conflicts_with = "rows")]
        input: Option<PathBuf>,

        /// Inline JSON row object or array
        #[arg(short, long)]
        rows: Option<String>,
    },

    /// Show a saved model's metadata
    Show { model_id: String },

    /// List saved model ids
    List,

    /// List algorithms for a problem type
    Recommend {
        /// classification or regression
        problem_type: String,
    },
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn engine_config(models_dir: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::default();
    if let Some(dir) = models_dir {
        config = config.with_models_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

fn load_table(path: &Path) -> anyhow::Result<Table> {
    DataLoader::new()
        .load_table(path)
        .with_context(|| format!("failed to load {}", path.display()))
}

fn read_steps(path: &Path) -> anyhow::Result<Vec<StepSpec>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid step list in {}", path.display()))
}

/// Parse one row object or an array of row objects
pub fn parse_rows(text: &str) -> anyhow::Result<Vec<Map<String, Value>>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(row) => Ok(row),
                other => anyhow::bail!("row {} is not a JSON object: {}", i, other),
            })
            .collect(),
        other => anyhow::bail!("expected a JSON object or array of objects, got {}", other),
    }
}

/// The last column is taken as the likely target of an uploaded dataset
pub fn likely_target(table: &Table) -> Option<&str> {
    table.columns().last().map(|c| c.name())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_profile(data_path: &Path, target: Option<&str>) -> anyhow::Result<()> {
    section("Profile");

    step_run("Loading data");
    let start = Instant::now();
    let table = load_table(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", table.n_rows(), table.n_cols(), start.elapsed()));

    let p = profile(&table);
    println!();
    kv("Rows", &p.rows.to_string());
    kv("Columns", &p.cols.to_string());
    kv("Missing cells", &format!("{} ({:.1}%)", p.missing_cells, p.missing_cells_pct));
    kv("Duplicate rows", &p.duplicate_rows.to_string());

    println!();
    println!(
        "  {:<20} {:<12} {:>8} {:>8} {:>10} {:>10}",
        muted("Column"), muted("Kind"), muted("Missing"), muted("Unique"), muted("Mean"), muted("Std")
    );
    println!("  {}", dim(&"─".repeat(72)));
    for col in &p.columns {
        println!(
            "  {:<20} {:<12} {:>7.1}% {:>8} {:>10} {:>10}",
            col.name, col.kind.to_string(), col.missing_pct, col.unique, fmt_opt(col.mean), fmt_opt(col.std)
        );
    }

    let target = target.or_else(|| likely_target(&table));
    let problem_type = ProblemType::infer(&table, target);
    section("Target");
    kv("Column", target.unwrap_or("-"));
    kv("Problem type", problem_type.as_str());
    for info in recommend_algorithms(problem_type) {
        println!("  {} {} {}", ok("•"), info.id.white().bold(), muted(&format!("{}: {}", info.name, info.description)));
    }

    section("Insights");
    for line in generate_or_fallback(&HeuristicInsights::new(), &p).lines() {
        println!("  {}", line);
    }
    println!();
    Ok(())
}

pub fn cmd_transform(
    data_path: &Path,
    steps_path: &Path,
    output: Option<&Path>,
    head: usize,
) -> anyhow::Result<()> {
    let table = load_table(data_path)?;
    let steps = read_steps(steps_path)?;
    let engine = TransformEngine::new();

    match output {
        Some(out) => {
            section("Transform");
            step_run(&format!("Applying {} steps", steps.len()));
            let start = Instant::now();
            let transformed = engine.apply(&table, &steps)?;
            step_done(&format!("{:?}", start.elapsed()));

            step_run(&format!("Saving → {}", out.display()));
            DataSaver::save_csv(&transformed, out)?;
            step_done(&format!("{} rows × {} cols", transformed.n_rows(), transformed.n_cols()));
            println!();
        }
        None => {
            let preview = engine.preview(&table, &steps, head)?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    models_dir: Option<&Path>,
    data_path: &Path,
    target: &str,
    algorithm: Option<&str>,
    steps_path: Option<&Path>,
    problem_type: Option<&str>,
    seed: Option<u64>,
    n_estimators: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = engine_config(models_dir)?;
    if let Some(seed) = seed {
        config = config.with_random_state(seed);
    }
    if let Some(n) = n_estimators {
        config = config.with_n_estimators(n);
    }
    config.validate()?;

    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let mut table = load_table(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", table.n_rows(), table.n_cols(), start.elapsed()));

    if let Some(path) = steps_path {
        let steps = read_steps(path)?;
        step_run(&format!("Applying {} steps", steps.len()));
        table = TransformEngine::new().apply(&table, &steps)?;
        step_done(&format!("{} rows × {} cols", table.n_rows(), table.n_cols()));
    }

    let problem_type = match problem_type {
        Some(p) => p.parse::<ProblemType>()?,
        None => ProblemType::infer(&table, Some(target)),
    };
    let algorithm = match algorithm {
        Some(a) => a.to_string(),
        None => recommend_algorithms(problem_type)
            .into_iter()
            .next()
            .map(|info| info.id)
            .with_context(|| format!("no algorithm fits problem type {}", problem_type))?,
    };

    step_run(&format!("Training {}", algorithm.cyan()));
    let start = Instant::now();
    let trainer = Trainer::new(TrainingConfig::from(&config));
    let (metrics, pipeline) = trainer.train(&table, target, &algorithm, problem_type)?;
    step_done(&format!("{:?}", start.elapsed()));

    let feature_names: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| *name != target)
        .map(str::to_string)
        .collect();

    step_run("Saving model");
    let registry = ModelRegistry::from_config(&config)?;
    let model_id = registry.save(&pipeline, metrics.clone(), feature_names, target, problem_type)?;
    step_done(&config.models_dir.display().to_string());

    println!();
    kv("Model id", &model_id.to_string());
    kv("Problem type", problem_type.as_str());
    for (name, value) in &metrics {
        println!("  {:<18} {}", muted(name), format_number(*value).white().bold());
    }
    println!();
    Ok(())
}

pub fn cmd_predict(
    models_dir: Option<&Path>,
    model_id: &str,
    input: Option<&Path>,
    rows: Option<&str>,
) -> anyhow::Result<()> {
    let text = match (input, rows) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(inline)) => inline.to_string(),
        (None, None) => anyhow::bail!("provide rows with --input or --rows"),
    };
    let rows = parse_rows(&text)?;
    let registry = ModelRegistry::from_config(&engine_config(models_dir)?)?;
    let result = registry.predict(model_id, &rows)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn cmd_show(models_dir: Option<&Path>, model_id: &str) -> anyhow::Result<()> {
    let registry = ModelRegistry::from_config(&engine_config(models_dir)?)?;
    let record = registry.metadata(model_id)?;
    println!("{}", record.to_json()?);
    Ok(())
}

pub fn cmd_list(models_dir: Option<&Path>) -> anyhow::Result<()> {
    let registry = ModelRegistry::from_config(&engine_config(models_dir)?)?;
    for id in registry.list()? {
        println!("{}", id);
    }
    Ok(())
}

pub fn cmd_recommend(problem_type: &str) -> anyhow::Result<()> {
    let problem_type: ProblemType = problem_type.parse()?;
    println!("{}", serde_json::to_string_pretty(&recommend_algorithms(problem_type))?);
    Ok(())
}
