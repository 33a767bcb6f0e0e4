use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::index::{DEFAULT_NAMESPACES, NamespaceFilter};

/// Settings read from a JSON config file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub(crate) namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) threads: Option<usize>,
    #[serde(default)]
    pub(crate) otel_endpoint: Option<String>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(text);
        let config = serde_path_to_error::deserialize(deserializer)?;
        Ok(config)
    }
}

/// Effective settings after CLI flags are layered over the config file.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) namespaces: NamespaceFilter,
    pub(crate) threads: Option<usize>,
    pub(crate) otel_endpoint: Option<String>,
}

impl Settings {
    pub(crate) fn resolve(
        file: FileConfig,
        namespaces: Vec<String>,
        threads: Option<usize>,
        otel_endpoint: Option<String>,
    ) -> Result<Self> {
        let namespaces = if !namespaces.is_empty() {
            namespaces
        } else if let Some(namespaces) = file.namespaces {
            namespaces
        } else {
            DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()).collect()
        };
        let threads = threads.or(file.threads);
        if threads == Some(0) {
            anyhow::bail!("threads must be at least 1");
        }
        Ok(Self {
            namespaces: NamespaceFilter::new(namespaces),
            threads,
            otel_endpoint: otel_endpoint.or(file.otel_endpoint),
        })
    }
}
