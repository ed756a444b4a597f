// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// unredact-document — The redaction-removal reconstruction engine.
//
// Reads a source PDF page by page, decomposes each page into raster image
// placements and recovered text spans, drops near-black images that act as
// redaction overlays, and writes a fresh PDF with the surviving images and
// the recovered text painted on top.

pub mod batch;
pub mod cancel;
pub mod engine;
pub mod image;
pub mod pdf;
pub mod reconstruct;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary structs so callers can use `unredact_document::Unredactor` etc.
pub use batch::{BatchRunner, output_file_name};
pub use cancel::CancelToken;
pub use engine::Unredactor;
pub use self::image::classify::{Classification, ClassificationPolicy};
pub use self::image::samples::RasterSamples;
pub use pdf::decompose::{DecomposedPage, ImagePlacement, PageDecomposer};
pub use pdf::reader::{PdfReader, SourcePage};
pub use pdf::writer::PdfWriter;
pub use reconstruct::{PagePlan, PageReconstructor, PaintOp, RasterSource};
