// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reconstruction engine — runs decomposition, classification, and writing
// over every page of one document.
//
// Pages are processed strictly in order, each fully written before the next
// is read. The source document and the output document are both owned by
// one call and dropped on every exit path.

use std::path::Path;

use tracing::{debug, info, instrument};
use unredact_core::config::EngineConfig;
use unredact_core::error::{Result, UnredactError};
use unredact_core::types::DocumentReport;

use crate::cancel::CancelToken;
use crate::pdf::decompose::PageDecomposer;
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::PdfWriter;
use crate::reconstruct::PageReconstructor;

/// Rebuilds redacted PDFs with their overlays removed and text restored.
#[derive(Debug, Clone, Default)]
pub struct Unredactor {
    config: EngineConfig,
    cancel: CancelToken,
}

impl Unredactor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::default(),
        }
    }

    /// Share a cancellation flag with the caller. The flag is checked before
    /// each page.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    // -- Processing -----------------------------------------------------------

    /// Reconstruct an already opened document, returning the new PDF bytes.
    #[instrument(skip_all, fields(
        source = reader.source_path().unwrap_or("<memory>"),
        pages = reader.page_count(),
    ))]
    pub fn process_document(&self, reader: &PdfReader) -> Result<(Vec<u8>, DocumentReport)> {
        let decomposer = PageDecomposer::from_config(&self.config);
        let mut reconstructor = PageReconstructor::from_config(&self.config);
        let mut writer = PdfWriter::new(reader.document());
        let mut report = DocumentReport::default();

        for page in reader.pages() {
            if self.cancel.is_cancelled() {
                info!(page = page.number, "Cancellation requested, stopping");
                return Err(UnredactError::Cancelled);
            }
            let decomposed = decomposer.decompose(reader, &page);
            let (plan, page_report) = reconstructor.reconstruct(reader, decomposed);
            writer.add_page(&plan)?;
            report.pages.push(page_report);
        }

        let bytes = writer.finish()?;
        info!(
            pages = report.page_count(),
            removed = report.removed_count(),
            kept = report.kept_count(),
            spans = report.text_span_count(),
            "Document reconstructed"
        );
        Ok((bytes, report))
    }

    /// Reconstruct a PDF held in memory.
    pub fn process_bytes(&self, data: &[u8]) -> Result<(Vec<u8>, DocumentReport)> {
        let reader = PdfReader::from_bytes(data)?;
        self.process_document(&reader)
    }

    /// Reconstruct `input` and write the result to `output`. Nothing is
    /// written when reconstruction fails.
    #[instrument(skip_all, fields(input = %input.as_ref().display()))]
    pub fn process_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<DocumentReport> {
        let reader = PdfReader::open(input.as_ref())?;
        let (bytes, report) = self.process_document(&reader)?;
        drop(reader);

        std::fs::write(output.as_ref(), &bytes)?;
        debug!(output = %output.as_ref().display(), bytes = bytes.len(), "Output written");
        Ok(report)
    }
}
