// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading source documents, interpreting page content, and
// writing reconstructed documents.

pub mod decompose;
pub mod encoding;
pub mod font;
pub(crate) mod glyphs;
pub(crate) mod objects;
pub mod reader;
pub mod writer;

pub use decompose::PageDecomposer;
pub use reader::PdfReader;
pub use writer::PdfWriter;
