//! `picscribe describe`: one-shot description of local files.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::debug;

use picscribe_core::{
    DescribeOutcome, DescribeScope, DescribeStatus, ImageTable, Session, UploadedImage,
};
use picscribe_understanding::Describer;

use crate::config_cmd;
use crate::serve_cmd::build_describer;
use crate::terminal_output::{note_warn, render_table, Column, RED, RESET};

#[derive(Debug, Serialize)]
pub struct DescribeReport {
    pub table: ImageTable,
    pub outcomes: Vec<DescribeOutcome>,
}

impl DescribeReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

pub async fn run(
    config_path: &Path,
    files: Vec<PathBuf>,
    prompt: Option<String>,
    json: bool,
) -> Result<()> {
    let config = config_cmd::load(config_path).await?;
    logging::init_logger(&config.logging.dir, &config.logging.level, config.logging.json);

    let describer = build_describer(&config)?;
    let prompt = prompt.unwrap_or_else(|| config.vision.prompt.clone());
    let report = describe_files(&describer, &files, &prompt).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    let failed = report.failed();
    if failed > 0 {
        note_warn(&format!(
            "{failed} of {} images could not be described",
            report.outcomes.len()
        ));
        bail!("description failed for {failed} image(s)");
    }
    Ok(())
}

/// Read `files`, build a fresh table from them and describe every row.
///
/// The file path is the row's `image_id`, so naming the same file twice is
/// rejected as a duplicate.
pub async fn describe_files(
    describer: &Describer,
    files: &[PathBuf],
    prompt: &str,
) -> Result<DescribeReport> {
    let mut uploads = Vec::with_capacity(files.len());
    for path in files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(path = %path.display(), bytes = data.len(), "Read image");
        uploads.push(UploadedImage::new(path.display().to_string(), name, data));
    }

    let mut session = Session::new(prompt);
    session.set_uploads(uploads)?;
    let targets = session.describe_targets(DescribeScope::All);
    let outcomes = describer.describe_rows(targets, session.prompt()).await;
    session.apply_descriptions(&outcomes);

    Ok(DescribeReport {
        table: session.table().clone(),
        outcomes,
    })
}

/// Plain-text table: name and description, with failures in place of the text.
pub fn render_report(report: &DescribeReport) -> String {
    let columns = [
        Column::left("Name").max_width(40),
        Column::left("Description").max_width(80),
    ];
    let rows: Vec<Vec<String>> = report
        .table
        .rows()
        .iter()
        .map(|row| {
            let failure = report.outcomes.iter().find_map(|o| match &o.status {
                DescribeStatus::Failed { error } if o.image_id == row.image_id => Some(error),
                _ => None,
            });
            let description = match failure {
                Some(error) => format!("{RED}error: {error}{RESET}"),
                None => row.description.clone(),
            };
            vec![row.name.clone(), description]
        })
        .collect();
    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use picscribe_core::encode_bytes;
    use picscribe_understanding::MockVisionProvider;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_images(dir: &TempDir, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, data)| {
                let path = dir.path().join(name);
                std::fs::write(&path, data).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn describes_every_file() {
        let dir = TempDir::new().unwrap();
        let files = write_images(&dir, &[("a.png", b"aaa"), ("b.png", b"bbb")]);
        let provider = MockVisionProvider::new("mock").with_response("a cat");
        let describer = Describer::new(Arc::new(provider), "m");

        let report = describe_files(&describer, &files, "Describe.").await.unwrap();
        assert_eq!(report.failed(), 0);
        let rows = report.table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "a.png");
        assert_eq!(rows[0].image, encode_bytes(b"aaa"));
        assert!(rows.iter().all(|r| r.description == "a cat"));

        let text = render_report(&report);
        assert!(text.contains("a.png"));
        assert!(text.contains("a cat"));
    }

    #[tokio::test]
    async fn failed_image_keeps_empty_description() {
        let dir = TempDir::new().unwrap();
        let files = write_images(&dir, &[("ok.png", b"ok"), ("bad.png", b"bad")]);
        let provider = MockVisionProvider::new("mock")
            .with_response("fine")
            .failing_on(encode_bytes(b"bad"));
        let describer = Describer::new(Arc::new(provider), "m");

        let report = describe_files(&describer, &files, "Describe.").await.unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.table.rows()[0].description, "fine");
        assert_eq!(report.table.rows()[1].description, "");
        assert!(render_report(&report).contains("error:"));
    }

    #[tokio::test]
    async fn same_file_twice_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut files = write_images(&dir, &[("a.png", b"aaa")]);
        files.push(files[0].clone());
        let describer = Describer::new(Arc::new(MockVisionProvider::new("mock")), "m");

        let err = describe_files(&describer, &files, "Describe.").await.unwrap_err();
        assert!(err.to_string().contains("duplicate image id"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let describer = Describer::new(Arc::new(MockVisionProvider::new("mock")), "m");
        let files = vec![dir.path().join("nope.png")];
        assert!(describe_files(&describer, &files, "Describe.").await.is_err());
    }
}
