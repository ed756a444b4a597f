// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch runs — one input file or every PDF in a directory, each rebuilt into
// the output directory.
//
// A failure on one file is recorded and the run moves on. Only problems with
// the invocation itself (missing input, non-PDF file, unusable output
// directory) abort the run.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use unredact_core::error::{Result, UnredactError};
use unredact_core::human_errors::humanize_error;
use unredact_core::types::{BatchReport, FileOutcome, FileStatus};

use crate::engine::Unredactor;

/// Appended to the input stem when no custom name is given.
pub const OUTPUT_SUFFIX: &str = "_UNREDACTED";

/// Output file name for `input`. A custom name gets `.pdf` appended unless
/// it already ends in it, in any case. Only the last component of a custom
/// name is used, so the output stays inside the output directory.
pub fn output_file_name(input: &Path, custom: Option<&str>) -> String {
    let custom = custom
        .map(str::trim)
        .and_then(|name| Path::new(name).file_name())
        .and_then(OsStr::to_str)
        .map(str::trim)
        .filter(|name| !name.is_empty());
    match custom {
        Some(name) if name.to_ascii_lowercase().ends_with(".pdf") => name.to_string(),
        Some(name) => format!("{}.pdf", name),
        None => {
            let stem = input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            format!("{}{}.pdf", stem, OUTPUT_SUFFIX)
        }
    }
}

/// Whether `path` names a PDF by extension, in any case.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Drives the engine over files.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    engine: Unredactor,
}

impl BatchRunner {
    pub fn new(engine: Unredactor) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Unredactor {
        &self.engine
    }

    /// Process `input` (a PDF file or a directory of PDFs) into `output_dir`.
    ///
    /// `custom_name` only applies to single-file input.
    #[instrument(skip_all, fields(input = %input.display(), output_dir = %output_dir.display()))]
    pub fn run(
        &self,
        input: &Path,
        output_dir: &Path,
        custom_name: Option<&str>,
    ) -> Result<BatchReport> {
        if !input.exists() {
            return Err(UnredactError::InputNotFound(input.to_path_buf()));
        }

        let (files, custom_name) = if input.is_dir() {
            if custom_name.is_some() {
                warn!("Custom output name ignored for directory input");
            }
            (pdf_files_in(input)?, None)
        } else if is_pdf_path(input) {
            (vec![input.to_path_buf()], custom_name)
        } else {
            return Err(UnredactError::NotAPdf(input.to_path_buf()));
        };

        std::fs::create_dir_all(output_dir)?;

        if files.is_empty() {
            warn!("No PDF files found");
        }

        let mut report = BatchReport::default();
        let mut claimed = HashSet::new();
        let cancel = self.engine.cancel_token();
        for file in files {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let output = output_dir.join(unclaimed_name(
                output_file_name(&file, custom_name),
                &mut claimed,
            ));
            info!(input = %file.display(), output = %output.display(), "Processing");

            match self.engine.process_file(&file, &output) {
                Ok(document) => report.outcomes.push(FileOutcome {
                    input: file,
                    status: FileStatus::Written {
                        output,
                        report: document,
                    },
                }),
                Err(UnredactError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(err) => {
                    warn!(input = %file.display(), %err, "Failed to process file");
                    report.outcomes.push(FileOutcome {
                        input: file,
                        status: FileStatus::Failed {
                            error: err.to_string(),
                            hint: humanize_error(&err).suggestion,
                        },
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            cancelled = report.cancelled,
            "Batch finished"
        );
        Ok(report)
    }
}

/// `name`, or `name` with a `_2`, `_3`, ... suffix if an earlier file of this
/// run already claimed it. Names compare case-insensitively so inputs such
/// as `a.pdf` and `a.PDF` never share an output.
fn unclaimed_name(name: String, claimed: &mut HashSet<String>) -> String {
    if claimed.insert(name.to_lowercase()) {
        return name;
    }
    let stem = if name.to_ascii_lowercase().ends_with(".pdf") {
        &name[..name.len() - 4]
    } else {
        name.as_str()
    };
    let mut counter = 2;
    loop {
        let candidate = format!("{}_{}.pdf", stem, counter);
        if claimed.insert(candidate.to_lowercase()) {
            warn!(output = %name, renamed = %candidate, "Output name already used in this run");
            return candidate;
        }
        counter += 1;
    }
}

/// Immediate `.pdf` children of `dir`, sorted by file name.
fn pdf_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_pdf_path(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::testing::{FixturePage, build_pdf};

    fn simple_pdf() -> Vec<u8> {
        build_pdf(&[FixturePage::new(612.0, 792.0).content("BT /F1 12 Tf 72 700 Td (hello) Tj ET")])
    }

    #[test]
    fn default_name_uses_stem_and_suffix() {
        assert_eq!(
            output_file_name(Path::new("/in/doc1.pdf"), None),
            "doc1_UNREDACTED.pdf"
        );
    }

    #[test]
    fn custom_name_gets_single_extension() {
        let input = Path::new("doc1.pdf");
        assert_eq!(output_file_name(input, Some("report")), "report.pdf");
        assert_eq!(output_file_name(input, Some("report.pdf")), "report.pdf");
        assert_eq!(output_file_name(input, Some("REPORT.PDF")), "REPORT.PDF");
        assert_eq!(output_file_name(input, Some("  ")), "doc1_UNREDACTED.pdf");
    }

    #[test]
    fn custom_name_cannot_leave_output_directory() {
        let input = Path::new("doc1.pdf");
        assert_eq!(output_file_name(input, Some("../../etc/report")), "report.pdf");
        assert_eq!(output_file_name(input, Some("/tmp/abs.pdf")), "abs.pdf");
        assert_eq!(output_file_name(input, Some("..")), "doc1_UNREDACTED.pdf");
        assert_eq!(output_file_name(input, Some("/")), "doc1_UNREDACTED.pdf");
    }

    #[test]
    fn repeated_output_names_get_a_counter() {
        let mut claimed = HashSet::new();
        assert_eq!(unclaimed_name("a_UNREDACTED.pdf".into(), &mut claimed), "a_UNREDACTED.pdf");
        assert_eq!(unclaimed_name("a_UNREDACTED.pdf".into(), &mut claimed), "a_UNREDACTED_2.pdf");
        assert_eq!(unclaimed_name("A_UNREDACTED.PDF".into(), &mut claimed), "A_UNREDACTED_3.pdf");
    }

    #[test]
    fn inputs_differing_only_in_extension_case_keep_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("a.pdf"), simple_pdf()).unwrap();
        std::fs::write(input.join("a.PDF"), simple_pdf()).unwrap();
        let out = dir.path().join("out");

        let report = BatchRunner::default().run(&input, &out, None).unwrap();
        let outputs: Vec<PathBuf> = report
            .outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                FileStatus::Written { output, .. } => Some(output.clone()),
                FileStatus::Failed { .. } => None,
            })
            .collect();
        assert_eq!(
            outputs,
            [out.join("a_UNREDACTED.pdf"), out.join("a_UNREDACTED_2.pdf")]
        );
        assert!(outputs.iter().all(|output| output.exists()));
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_pdf_path(Path::new("a.pdf")));
        assert!(is_pdf_path(Path::new("B.PDF")));
        assert!(!is_pdf_path(Path::new("notes.txt")));
        assert!(!is_pdf_path(Path::new("pdf")));
    }

    #[test]
    fn single_file_with_custom_name() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc1.pdf");
        std::fs::write(&input, simple_pdf()).unwrap();
        let out = dir.path().join("out");

        let report = BatchRunner::default()
            .run(&input, &out, Some("report"))
            .unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(out.join("report.pdf").exists());
        assert!(!out.join("report.pdf.pdf").exists());
        assert!(!out.join("doc1_UNREDACTED.pdf").exists());
    }

    #[test]
    fn missing_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = BatchRunner::default().run(&dir.path().join("nope.pdf"), dir.path(), None);
        assert!(matches!(result, Err(UnredactError::InputNotFound(_))));
    }

    #[test]
    fn non_pdf_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "hello").unwrap();
        let result = BatchRunner::default().run(&input, dir.path(), None);
        assert!(matches!(result, Err(UnredactError::NotAPdf(_))));
    }

    #[test]
    fn directory_ignores_custom_name_and_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("b.PDF"), simple_pdf()).unwrap();
        std::fs::write(input.join("a.pdf"), simple_pdf()).unwrap();
        std::fs::write(input.join("readme.txt"), "skip me").unwrap();
        let out = dir.path().join("out");

        let report = BatchRunner::default()
            .run(&input, &out, Some("report"))
            .unwrap();
        let inputs: Vec<_> = report
            .outcomes
            .iter()
            .map(|outcome| outcome.input.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(inputs, ["a.pdf", "b.PDF"]);
        assert!(out.join("a_UNREDACTED.pdf").exists());
        assert!(out.join("b_UNREDACTED.pdf").exists());
        assert!(!out.join("report.pdf").exists());
    }

    #[test]
    fn cancelled_run_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        std::fs::write(&input, simple_pdf()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let runner = BatchRunner::new(Unredactor::default().with_cancel_token(cancel));

        let report = runner.run(&input, &dir.path().join("out"), None).unwrap();
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
    }
}
