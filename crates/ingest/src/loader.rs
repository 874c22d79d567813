use anyhow::{Context, Result, anyhow, bail};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::DocumentRecord;

pub struct PdfLoader;

impl PdfLoader {
    pub fn is_pdf(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    /// Extracts the text of every page in one PDF as a single document.
    pub async fn load(path: &Path) -> Result<DocumentRecord> {
        let bytes = fs::read(path)
            .await
            .context(format!("Failed to read PDF file: {:?}", path))?;

        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| anyhow!("Failed to extract text from PDF {:?}: {}", path, e))?;

        if text.trim().is_empty() {
            warn!(path = %path.display(), "PDF contains no extractable text");
        }

        Ok(DocumentRecord::new(text, path.to_string_lossy().to_string()))
    }
}

pub struct DirectoryLoader;

impl DirectoryLoader {
    /// PDF files under `dir`, recursively, in path order.
    pub fn pdf_paths(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            bail!("Document directory not found: {:?}", dir);
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.context(format!("Failed to walk directory: {:?}", dir))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            if PdfLoader::is_pdf(&path) {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "Skipping non-PDF file");
            }
        }

        Ok(paths)
    }

    pub async fn load(dir: &Path) -> Result<Vec<DocumentRecord>> {
        let paths = Self::pdf_paths(dir)?;
        let mut documents = Vec::with_capacity(paths.len());

        for path in paths {
            documents.push(PdfLoader::load(&path).await?);
        }

        info!(count = documents.len(), dir = %dir.display(), "Loaded PDF documents");
        Ok(documents)
    }
}
