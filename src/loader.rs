//! Document Loading
//!
//! Supplies raw schema documents to the registry and resolves `$ref` URLs.
//! Only the local filesystem transport is implemented; the `DocumentLoader`
//! trait is the seam for other transports.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::arena::Handle;
use crate::error::{CompileError, Result};
use crate::names::to_pascal_case;
use crate::registry::SchemaRegistry;

/// Resolve a reference string against a base document URL.
///
/// Fragment references append to the base; absolute URLs pass through;
/// relative paths join against the base's parent with `.`/`..` folding.
/// Joining always uses `/`, never a platform path separator.
pub fn resolve_reference(base: &str, reference: &str) -> String {
    if reference.starts_with('#') {
        return format!("{base}{reference}");
    }
    if reference.contains("://") {
        return reference.to_string();
    }

    let base_path = base.split('#').next().unwrap_or("");
    let mut components: Vec<&str> = base_path.split('/').collect();
    components.pop();

    for part in reference.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            part => components.push(part),
        }
    }

    components.join("/")
}

/// Source of raw schema documents.
pub trait DocumentLoader {
    /// Fetch the raw text of the document at `url`.
    fn fetch(&self, url: &str) -> Result<String>;

    /// Resolve a reference found in the document at `base_url`.
    fn resolve(&self, base_url: &str, reference: &str) -> String {
        resolve_reference(base_url, reference)
    }
}

/// A batch of documents registered from disk.
#[derive(Debug)]
pub struct LoadedBundle {
    /// Handles of the registered schemas, in walk order.
    pub handles: Vec<Handle>,
    /// SHA256 over all raw document contents, in walk order.
    pub bundle_hash: String,
}

/// Loads schema documents from a directory tree.
///
/// Schema URLs are the file paths relative to the root, with `/` separators
/// on every platform so they match `$ref` targets verbatim.
#[derive(Debug)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let url = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Ok(url)
    }

    /// Read and register a single schema document.
    ///
    /// The class name is derived from the file stem: `street_address.json`
    /// registers as `StreetAddress`.
    pub fn load_document(&self, registry: &mut SchemaRegistry, path: &Path) -> Result<Handle> {
        let content = self.fetch_path(path)?;
        let definition: serde_json::Value = serde_json::from_str(&content)?;

        let url = self.url_for(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let class_name = to_pascal_case(&stem);

        tracing::debug!(url, class_name, "loading schema document");
        registry.create_schema(&url, &class_name, definition)
    }

    /// Walk the root for `*.json` documents and register each one.
    ///
    /// Returns the registered handles plus a bundle hash over the raw
    /// contents, so callers can detect input drift between runs.
    pub fn load_directory(&self, registry: &mut SchemaRegistry) -> Result<LoadedBundle> {
        let mut handles = Vec::new();
        let mut hasher = Sha256::new();

        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path)?;
            hasher.update(content.as_bytes());

            let definition: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "document is not valid JSON");
                CompileError::Json(e)
            })?;

            let url = self.url_for(&path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            handles.push(registry.create_schema(&url, &to_pascal_case(&stem), definition)?);
        }

        Ok(LoadedBundle {
            handles,
            bundle_hash: format!("{:x}", hasher.finalize()),
        })
    }

    fn fetch_path(&self, path: &Path) -> Result<String> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        Ok(fs::read_to_string(full)?)
    }
}

impl DocumentLoader for FileSystemLoader {
    fn fetch(&self, url: &str) -> Result<String> {
        // URLs are root-relative paths with `/` separators.
        let path: PathBuf = url.split('/').collect();
        self.fetch_path(&path)
    }
}
