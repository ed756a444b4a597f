// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding embedded image samples and classifying them as
// content or redaction overlays.

pub mod classify;
pub mod samples;

pub use classify::ClassificationPolicy;
pub use samples::RasterSamples;
