//! `paperchat ingest`: add PDF files to the index.
//!
//! Each path may be a PDF file or a directory, which is walked recursively
//! for `*.pdf` files. The document name (the deduplication key) is the file
//! name without its directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use paperchat_core::ingest::IngestReport;
use paperchat_core::models::Document;

use crate::config::Config;
use crate::session::{open_session, PaperSession};

pub async fn run_ingest(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let documents = load_documents(paths)?;
    let mut session = open_session(config).await?;
    let report = ingest_documents(&mut session, documents).await?;
    print_report(&report);
    Ok(())
}

/// Ingest through the session. When the index write fails, the documents
/// that failed or were skipped are printed before the error is returned.
pub async fn ingest_documents(
    session: &mut PaperSession,
    documents: Vec<Document>,
) -> Result<IngestReport> {
    match session.process_documents(documents).await {
        Ok(report) => Ok(report),
        Err(e) => {
            print_outcomes(&e.report);
            Err(anyhow::Error::new(e.error).context("Failed to add documents to the index"))
        }
    }
}

pub fn print_report(report: &IngestReport) {
    print_outcomes(report);

    if report.nothing_to_do() {
        println!("No new documents to process.");
    } else {
        println!(
            "Processed {} new documents! Added {} new chunks to the vector store.",
            report.processed.len(),
            report.chunks_added
        );
    }
}

fn print_outcomes(report: &IngestReport) {
    for name in &report.processed {
        println!("  processed: {}", name);
    }
    for name in &report.skipped {
        println!("  skipped (already processed): {}", name);
    }
    for failure in &report.failed {
        println!("  failed: {}: {}", failure.name, failure.error);
    }
}

/// Read every PDF named by `paths`, in a stable order.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_pdf(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    files
        .into_iter()
        .map(|file| {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            Ok(Document::new(name, bytes))
        })
        .collect()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
