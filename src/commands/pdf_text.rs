use std::path::Path;
use std::process::Command;

use anyhow::Result;
use tracing::info;

use crate::cli::PdfTextArgs;
use crate::error::PipelineError;
use crate::model::RawTextDocument;
use crate::util::write_json_pretty;

const PDFTOTEXT: &str = "pdftotext";

pub fn run(args: PdfTextArgs) -> Result<()> {
    let document = extract_raw_text(&args.pdf_path, args.max_pages)?;
    write_json_pretty(&args.output_path, &document)?;

    info!(
        pdf = %args.pdf_path.display(),
        path = %args.output_path.display(),
        chars = document.raw_text.chars().count(),
        "wrote raw text"
    );
    Ok(())
}

/// Runs `pdftotext -layout` so multi-column pages keep their reading order.
pub fn extract_raw_text(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<RawTextDocument, PipelineError> {
    if !pdf_path.exists() {
        return Err(PipelineError::MissingArtifact {
            paths: vec![pdf_path.to_path_buf()],
        });
    }

    let mut command = Command::new(PDFTOTEXT);
    command.args(pdftotext_args(pdf_path, max_pages));

    let output = command.output().map_err(|err| PipelineError::ExternalTool {
        tool: PDFTOTEXT.to_string(),
        reason: format!("failed to execute for {}: {err}", pdf_path.display()),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::ExternalTool {
            tool: PDFTOTEXT.to_string(),
            reason: format!(
                "non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            ),
        });
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    Ok(RawTextDocument {
        raw_text: join_pages(&raw),
    })
}

fn pdftotext_args(pdf_path: &Path, max_pages: Option<usize>) -> Vec<String> {
    let mut args = vec![
        "-layout".to_string(),
        "-enc".to_string(),
        "UTF-8".to_string(),
        "-f".to_string(),
        "1".to_string(),
    ];
    if let Some(max_pages) = max_pages {
        args.push("-l".to_string());
        args.push(max_pages.to_string());
    }
    args.push(pdf_path.display().to_string());
    args.push("-".to_string());
    args
}

/// Replaces form feeds with newlines and drops trailing blank pages.
fn join_pages(raw: &str) -> String {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages.join("\n")
}
