use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::index::UsageIndex;
use crate::telemetry::{Telemetry, with_span};

/// One class buffer read from an input, named by its archive entry or path.
pub(crate) struct ClassInput {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
}

/// Entry that could not be read or indexed.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ScanFailure {
    pub(crate) entry: String,
    pub(crate) error: String,
}

/// Outcome of indexing every class found under an input.
#[derive(Debug, Default, Serialize)]
pub(crate) struct ScanSummary {
    pub(crate) class_count: usize,
    pub(crate) indexed_count: usize,
    pub(crate) failures: Vec<ScanFailure>,
}

/// Class buffers gathered from an input, plus entries that could not be read.
#[derive(Default)]
pub(crate) struct CollectedInputs {
    pub(crate) classes: Vec<ClassInput>,
    pub(crate) failures: Vec<ScanFailure>,
}

impl CollectedInputs {
    fn skip(&mut self, entry: String, err: &anyhow::Error) {
        let error = format!("{err:#}");
        warn!(entry = %entry, error = %error, "skipping unreadable entry");
        self.failures.push(ScanFailure { entry, error });
    }
}

/// Read every class under `input` and index it. Only an unreadable top-level
/// input is an error; entries that cannot be read or parsed are reported in
/// the summary.
pub(crate) fn scan_path(
    input: &Path,
    index: &UsageIndex,
    telemetry: Option<&Telemetry>,
) -> Result<ScanSummary> {
    let attributes = [KeyValue::new("jarindex.input", input.display().to_string())];
    with_span(telemetry, "archive.scan", &attributes, || {
        let collected = collect_inputs(input)?;
        Ok(index_inputs(collected, index, telemetry))
    })
}

/// Gather class buffers from a `.class` file, a `.jar`/`.zip` archive, or a
/// directory tree, in deterministic order.
pub(crate) fn collect_inputs(input: &Path) -> Result<CollectedInputs> {
    let mut collected = CollectedInputs::default();
    collect_path(input, true, &mut collected)?;
    Ok(collected)
}

/// Index the collected classes in parallel on the current rayon pool.
pub(crate) fn index_inputs(
    collected: CollectedInputs,
    index: &UsageIndex,
    telemetry: Option<&Telemetry>,
) -> ScanSummary {
    let CollectedInputs { classes, failures } = collected;
    let unreadable = failures.len();
    let indexed = AtomicUsize::new(0);
    let failures: Mutex<Vec<ScanFailure>> = Mutex::new(failures);

    classes.par_iter().for_each(|input| {
        let attributes = [KeyValue::new("jarindex.entry", input.name.clone())];
        let result = with_span(telemetry, "class.index", &attributes, || {
            index.index(&input.data)
        });
        match result {
            Ok(_) => {
                indexed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                warn!(entry = %input.name, error = %err, "skipping class that failed to parse");
                let failure = ScanFailure {
                    entry: input.name.clone(),
                    error: err.to_string(),
                };
                match failures.lock() {
                    Ok(mut guard) => guard.push(failure),
                    Err(poisoned) => poisoned.into_inner().push(failure),
                }
            }
        }
    });

    let mut failures = failures
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    failures.sort_by(|a, b| a.entry.cmp(&b.entry));

    let summary = ScanSummary {
        class_count: classes.len() + unreadable,
        indexed_count: indexed.into_inner(),
        failures,
    };
    info!(
        classes = summary.class_count,
        indexed = summary.indexed_count,
        failed = summary.failures.len(),
        recorded = index.class_count(),
        usages = index.usage_count(),
        "indexing finished"
    );
    summary
}

fn collect_path(path: &Path, strict: bool, collected: &mut CollectedInputs) -> Result<()> {
    if path.is_dir() {
        return collect_dir(path, collected);
    }

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match extension {
        "class" => {
            let data =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            collected.classes.push(ClassInput {
                name: path.display().to_string(),
                data,
            });
            Ok(())
        }
        "jar" | "zip" => collect_archive(path, collected),
        _ => {
            if strict {
                anyhow::bail!("unsupported input file: {}", path.display())
            } else {
                Ok(())
            }
        }
    }
}

fn collect_dir(path: &Path, collected: &mut CollectedInputs) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read entry under {}", path.display()))?;
        entries.push(entry.path());
    }

    // Keep deterministic ordering across platforms.
    entries.sort();

    for entry in entries {
        if let Err(err) = collect_path(&entry, false, collected) {
            collected.skip(entry.display().to_string(), &err);
        }
    }
    Ok(())
}

fn collect_archive(path: &Path, collected: &mut CollectedInputs) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read {}", path.display()))?;

    // Central directory names only; directory entries end with '/'.
    let mut entry_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(".class"))
        .map(str::to_string)
        .collect();
    entry_names.sort();

    for name in entry_names {
        let entry_name = format!("{}:{}", path.display(), name);
        match read_entry(&mut archive, &name) {
            Ok(data) => collected.classes.push(ClassInput {
                name: entry_name,
                data,
            }),
            Err(err) => collected.skip(entry_name, &err),
        }
    }
    Ok(())
}

fn read_entry(archive: &mut ZipArchive<fs::File>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name)?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(data)
}
