use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub path: String,
}

/// Configurator asset list (`config.json`). Display keys such as
/// `modelScale` or `cameraPosition` belong to the renderer and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub models: Vec<CatalogEntry>,
    #[serde(default)]
    pub selected_model: usize,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw).context("invalid catalog JSON")?;
        if catalog.models.is_empty() {
            bail!("catalog lists no models");
        }
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let mut catalog = Self::from_json(&raw)?;
        catalog.base_dir = path.parent().map(Path::to_path_buf);
        Ok(catalog)
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.models.get(index)
    }

    /// Out-of-range selections fall back to the first entry.
    pub fn selected(&self) -> Option<&CatalogEntry> {
        self.models
            .get(self.selected_model)
            .or_else(|| self.models.first())
    }

    /// Entry paths are web-root style (`/models/shoe.glb`) and resolve against
    /// the catalog's directory; URLs pass through untouched.
    pub fn resolve(&self, entry: &CatalogEntry) -> String {
        let raw = entry.path.as_str();
        if raw.contains("://") || raw.starts_with("blob:") {
            return raw.to_string();
        }
        match &self.base_dir {
            Some(base) => base
                .join(raw.trim_start_matches('/'))
                .to_string_lossy()
                .into_owned(),
            None => raw.to_string(),
        }
    }
}
