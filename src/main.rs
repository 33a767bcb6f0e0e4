mod class_file;
mod config;
mod constant_pool;
mod descriptor;
mod error;
mod index;
mod ir;
mod opcodes;
mod reader;
mod recorder;
mod scan;
mod telemetry;
#[cfg(test)]
mod test_support;
mod visitor;
mod walker;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::config::{FileConfig, Settings};
use crate::index::UsageIndex;
use crate::ir::ClassRecord;
use crate::scan::{ScanFailure, ScanSummary, scan_path};
use crate::telemetry::{Telemetry, init_logging};

/// CLI arguments for jarindex execution.
#[derive(Parser, Debug)]
#[command(
    name = "jarindex",
    about = "Cross-reference and inheritance index for JVM class files and JAR archives.",
    version
)]
struct Cli {
    /// Class file, JAR/ZIP archive, or directory to index.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Symbol prefix to index; repeatable. Defaults to net/minecraft and com/mojang.
    #[arg(long = "namespace", value_name = "PREFIX")]
    namespaces: Vec<String>,
    /// JSON config file providing namespaces, threads and otel_endpoint.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Symbol whose usages are reported; repeatable.
    #[arg(long = "query", value_name = "SYMBOL")]
    queries: Vec<String>,
    /// Class whose direct subtypes are reported; repeatable.
    #[arg(long = "subtypes", value_name = "CLASS")]
    subtypes: Vec<String>,
    /// Class whose super class and interfaces are reported; repeatable.
    #[arg(long = "supertypes", value_name = "CLASS")]
    supertypes: Vec<String>,
    /// Class whose hierarchy root and transitive subtypes are reported; repeatable.
    #[arg(long = "hierarchy", value_name = "CLASS")]
    hierarchy: Vec<String>,
    /// Class whose inheritance record is reported; repeatable.
    #[arg(long = "class", value_name = "CLASS")]
    classes: Vec<String>,
    /// Include the class table in the report.
    #[arg(long)]
    class_table: bool,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
    /// OTLP HTTP endpoint for trace export.
    #[arg(long, value_name = "URL")]
    otel: Option<String>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }
    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        file_config,
        cli.namespaces.clone(),
        cli.threads,
        cli.otel.clone(),
    )?;
    let telemetry = settings
        .otel_endpoint
        .as_deref()
        .map(Telemetry::new)
        .transpose()?;

    let started_at = Instant::now();
    let index = UsageIndex::new(settings.namespaces);
    info!(
        input = %cli.input.display(),
        namespaces = ?index.filter().prefixes(),
        "indexing"
    );
    let summary = match settings.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("failed to build worker pool")?
            .install(|| scan_path(&cli.input, &index, telemetry.as_ref()))?,
        None => scan_path(&cli.input, &index, telemetry.as_ref())?,
    };
    let scan_duration_ms = started_at.elapsed().as_millis();

    let report = build_report(&index, summary, &ReportQueries::from_cli(&cli));
    let mut writer = output_writer(cli.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &report)
        .context("failed to serialize index report")?;
    writer
        .write_all(b"\n")
        .context("failed to write index report")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} classes={} usages={}",
            scan_duration_ms, report.class_count, report.usage_count
        );
    }

    if let Some(telemetry) = telemetry {
        telemetry.shutdown()?;
    }
    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

/// Queries answered in the report.
#[derive(Debug, Default)]
struct ReportQueries {
    usages: Vec<String>,
    subtypes: Vec<String>,
    supertypes: Vec<String>,
    hierarchy: Vec<String>,
    classes: Vec<String>,
    class_table: bool,
}

impl ReportQueries {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            usages: cli.queries.clone(),
            subtypes: cli.subtypes.clone(),
            supertypes: cli.supertypes.clone(),
            hierarchy: cli.hierarchy.clone(),
            classes: cli.classes.clone(),
            class_table: cli.class_table,
        }
    }
}

/// JSON document written after indexing.
#[derive(Debug, Serialize)]
struct IndexReport {
    namespaces: Vec<String>,
    class_count: usize,
    usage_count: u64,
    symbol_count: usize,
    failures: Vec<ScanFailure>,
    usages: BTreeMap<String, Vec<String>>,
    subtypes: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    supertypes: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    hierarchy: BTreeMap<String, HierarchyView>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    classes: BTreeMap<String, Option<ClassRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_table: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HierarchyView {
    root: String,
    subtypes: Vec<String>,
}

fn build_report(index: &UsageIndex, summary: ScanSummary, queries: &ReportQueries) -> IndexReport {
    IndexReport {
        namespaces: index.filter().prefixes().to_vec(),
        class_count: summary.class_count,
        usage_count: index.usage_count(),
        symbol_count: index.symbol_count(),
        failures: summary.failures,
        usages: queries
            .usages
            .iter()
            .map(|symbol| (symbol.clone(), index.usages(symbol)))
            .collect(),
        subtypes: queries
            .subtypes
            .iter()
            .map(|name| (name.clone(), index.direct_subtypes(name)))
            .collect(),
        supertypes: queries
            .supertypes
            .iter()
            .map(|name| (name.clone(), index.supertypes(name)))
            .collect(),
        hierarchy: queries
            .hierarchy
            .iter()
            .map(|name| {
                let view = HierarchyView {
                    root: index.hierarchy_root(name),
                    subtypes: index.all_subtypes(name),
                };
                (name.clone(), view)
            })
            .collect(),
        classes: queries
            .classes
            .iter()
            .map(|name| (name.clone(), index.class_record(name)))
            .collect(),
        class_table: queries.class_table.then(|| index.class_table()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use serde_json::{Value, json};

    use crate::index::NamespaceFilter;
    use crate::opcodes::{ALOAD_0, INVOKESPECIAL, INVOKEVIRTUAL, NEW, RETURN};
    use crate::test_support::{ClassFileBuilder, MethodSpec, high, low};

    fn build_class_a() -> Vec<u8> {
        let mut builder = ClassFileBuilder::new("net/minecraft/A", Some("java/lang/Object"));
        let object_init = builder.add_method_ref("java/lang/Object", "<init>", "()V");
        let b_class = builder.add_class("net/minecraft/B");
        let b_init = builder.add_method_ref("net/minecraft/B", "<init>", "()V");
        let b_bar = builder.add_method_ref("net/minecraft/B", "bar", "()V");

        let init_code = vec![ALOAD_0, INVOKESPECIAL, high(object_init), low(object_init), RETURN];
        builder.add_method(MethodSpec::new("<init>", "()V", init_code));

        let foo_code = vec![
            NEW,
            high(b_class),
            low(b_class),
            0x59,
            INVOKESPECIAL,
            high(b_init),
            low(b_init),
            INVOKEVIRTUAL,
            high(b_bar),
            low(b_bar),
            RETURN,
        ];
        builder.add_method(MethodSpec::new("foo", "()V", foo_code));

        builder.finish()
    }

    fn build_class_b() -> Vec<u8> {
        let mut builder = ClassFileBuilder::new("net/minecraft/B", Some("net/minecraft/Base"));
        builder.add_interface("com/mojang/Api");
        builder.add_method(MethodSpec::new("bar", "()V", vec![RETURN]));
        builder.finish()
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn report_json(input: &Path, queries: &ReportQueries) -> Value {
        let index = UsageIndex::new(NamespaceFilter::default());
        let summary = scan_path(input, &index, None).expect("scan");
        let report = build_report(&index, summary, queries);
        serde_json::to_value(report).expect("serialize report")
    }

    #[test]
    fn report_answers_usage_and_subtype_queries() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        fs::write(temp_dir.path().join("A.class"), build_class_a()).expect("write A");
        fs::write(temp_dir.path().join("B.class"), build_class_b()).expect("write B");

        let queries = ReportQueries {
            usages: names(&["net/minecraft/B:bar:()V", "net/minecraft/B", "java/lang/Object"]),
            subtypes: names(&["com/mojang/Api"]),
            class_table: true,
            ..ReportQueries::default()
        };

        let report = report_json(temp_dir.path(), &queries);

        assert_eq!(report["class_count"], json!(2));
        assert_eq!(report["failures"], json!([]));
        assert_eq!(
            report["usages"]["net/minecraft/B:bar:()V"],
            json!(["m:net/minecraft/A:foo:()V"])
        );
        assert_eq!(
            report["usages"]["net/minecraft/B"],
            json!(["m:net/minecraft/A:foo:()V"])
        );
        assert_eq!(report["usages"]["java/lang/Object"], json!([]));
        assert_eq!(report["subtypes"]["com/mojang/Api"], json!(["net/minecraft/B"]));
        assert_eq!(
            report["class_table"],
            json!([
                "net/minecraft/A||33|",
                "net/minecraft/B|net/minecraft/Base|33|com/mojang/Api"
            ])
        );
    }

    #[test]
    fn usage_count_counts_every_accepted_reference() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        fs::write(temp_dir.path().join("A.class"), build_class_a()).expect("write A");

        let report = report_json(temp_dir.path(), &ReportQueries::default());

        // new B, B.<init>, B.bar; java/lang/Object references are filtered.
        assert_eq!(report["usage_count"], json!(3));
        assert!(report.get("class_table").is_none());
        assert!(report.get("hierarchy").is_none());
    }

    #[test]
    fn report_answers_hierarchy_and_class_queries() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let base = ClassFileBuilder::new("net/minecraft/Base", Some("java/lang/Object")).finish();
        let mut leaf = ClassFileBuilder::new("net/minecraft/Leaf", Some("net/minecraft/B"));
        leaf.access(0x0011);
        fs::write(temp_dir.path().join("Base.class"), base).expect("write Base");
        fs::write(temp_dir.path().join("B.class"), build_class_b()).expect("write B");
        fs::write(temp_dir.path().join("Leaf.class"), leaf.finish()).expect("write Leaf");
        let queries = ReportQueries {
            supertypes: names(&["net/minecraft/B"]),
            hierarchy: names(&["net/minecraft/Base"]),
            classes: names(&["net/minecraft/Leaf", "net/minecraft/Missing"]),
            ..ReportQueries::default()
        };

        let report = report_json(temp_dir.path(), &queries);

        assert_eq!(
            report["supertypes"]["net/minecraft/B"],
            json!(["net/minecraft/Base", "com/mojang/Api"])
        );
        assert_eq!(
            report["hierarchy"]["net/minecraft/Base"],
            json!({
                "root": "net/minecraft/Base",
                "subtypes": ["net/minecraft/B", "net/minecraft/Leaf"]
            })
        );
        assert_eq!(
            report["classes"]["net/minecraft/Leaf"],
            json!({
                "name": "net/minecraft/Leaf",
                "super_name": "net/minecraft/B",
                "interfaces": [],
                "access": 17
            })
        );
        assert_eq!(report["classes"]["net/minecraft/Missing"], Value::Null);
    }

    #[test]
    fn run_writes_report_to_output_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let class_path = temp_dir.path().join("B.class");
        fs::write(&class_path, build_class_b()).expect("write B");
        let output = temp_dir.path().join("report.json");

        let cli = Cli::parse_from([
            "jarindex",
            "--input",
            class_path.to_str().expect("utf-8 path"),
            "--namespace",
            "net/minecraft",
            "--subtypes",
            "net/minecraft/Base",
            "--output",
            output.to_str().expect("utf-8 path"),
            "--threads",
            "2",
        ]);
        run(cli).expect("run");

        let report: Value =
            serde_json::from_str(&fs::read_to_string(&output).expect("read report"))
                .expect("parse report");
        assert_eq!(report["namespaces"], json!(["net/minecraft"]));
        assert_eq!(report["subtypes"]["net/minecraft/Base"], json!(["net/minecraft/B"]));
        assert_eq!(report["usage_count"], json!(1));
    }

    #[test]
    fn run_rejects_missing_input() {
        let cli = Cli::parse_from(["jarindex", "--input", "does/not/exist.jar"]);

        assert!(run(cli).is_err());
    }
}
