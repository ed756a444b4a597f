// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page reconstruction — turns a decomposed source page into an ordered plan
// of paint operations for a fresh page of the same size.
//
// Every image placement is classified; kept placements are scheduled in
// source order, removed ones are reported. Recovered text is scheduled after
// all images so it always paints on top.

use std::collections::HashMap;

use lopdf::ObjectId;
use tracing::{debug, info, instrument, warn};
use unredact_core::config::EngineConfig;
use unredact_core::error::{Result, UnredactError};
use unredact_core::types::{
    Decision, ObjectWarning, PageReport, RemovedImage, TextColor, TextSpan,
};

use crate::image::classify::{Classification, ClassificationPolicy};
use crate::image::samples::RasterSamples;
use crate::pdf::decompose::{DecomposedPage, ImagePlacement};
use crate::pdf::reader::PdfReader;

/// Supplies decoded samples for image objects.
pub trait RasterSource {
    fn samples(&self, id: ObjectId) -> Result<RasterSamples>;
}

impl RasterSource for PdfReader {
    fn samples(&self, id: ObjectId) -> Result<RasterSamples> {
        let stream = self.stream(id)?;
        RasterSamples::decode(self.document(), stream)
    }
}

// -- Plan -----------------------------------------------------------------------

/// One paint operation on a reconstructed page.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    /// Paint the source image with the placement's transform.
    Image { placement: ImagePlacement },
    /// Paint a recovered string at its origin.
    Text { span: TextSpan, color: TextColor },
}

/// Everything needed to write one output page, in painting order.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub rotate: i64,
    pub ops: Vec<PaintOp>,
}

impl PagePlan {
    pub fn images(&self) -> impl Iterator<Item = &ImagePlacement> {
        self.ops.iter().filter_map(|op| match op {
            PaintOp::Image { placement } => Some(placement),
            PaintOp::Text { .. } => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = (&TextSpan, TextColor)> {
        self.ops.iter().filter_map(|op| match op {
            PaintOp::Text { span, color } => Some((span, *color)),
            PaintOp::Image { .. } => None,
        })
    }
}

// -- Reconstructor --------------------------------------------------------------

/// Outcome of looking at one source image.
#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    Classified(Classification),
    /// Encoded in a format the engine cannot decode; kept untouched.
    Unmeasurable(String),
    /// Decoding failed; the placement is skipped.
    Failed(String),
}

/// Builds page plans for one run.
///
/// Classification results are remembered per source image object, so an
/// image placed on many pages is decoded once. The cache lives as long as
/// the reconstructor, which is one document.
#[derive(Debug)]
pub struct PageReconstructor {
    policy: ClassificationPolicy,
    text_color: TextColor,
    decided: HashMap<ObjectId, Verdict>,
}

impl PageReconstructor {
    pub fn new(policy: ClassificationPolicy, text_color: TextColor) -> Self {
        Self {
            policy,
            text_color,
            decided: HashMap::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            ClassificationPolicy::from_config(config),
            TextColor::for_highlight(config.highlight_text),
        )
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    pub fn text_color(&self) -> TextColor {
        self.text_color
    }

    /// Plan one page and report what happened to its objects.
    #[instrument(skip_all, fields(page = page.number))]
    pub fn reconstruct(
        &mut self,
        source: &impl RasterSource,
        page: DecomposedPage,
    ) -> (PagePlan, PageReport) {
        let mut report = PageReport {
            page_number: page.number,
            images_filtered: page.filtered,
            text_spans: page.spans.len(),
            warnings: page.warnings,
            ..PageReport::default()
        };
        let mut ops = Vec::with_capacity(page.images.len() + page.spans.len());

        for placement in page.images {
            match self.classify(source, placement.object_id) {
                Verdict::Classified(Classification {
                    decision: Decision::Keep,
                    ..
                }) => {
                    report.images_kept += 1;
                    ops.push(PaintOp::Image { placement });
                }
                Verdict::Classified(Classification {
                    decision: Decision::Discard,
                    brightness,
                }) => {
                    let brightness = brightness.unwrap_or(0.0);
                    info!(
                        page = page.number,
                        resource = %placement.resource,
                        object = ?placement.object_id,
                        rect = %placement.rect,
                        brightness,
                        "Removing redaction box"
                    );
                    report.images_removed.push(RemovedImage {
                        resource: placement.resource,
                        object_id: Some(placement.object_id),
                        rect: placement.rect,
                        brightness,
                    });
                }
                Verdict::Unmeasurable(message) => {
                    warn!(
                        page = page.number,
                        resource = %placement.resource,
                        %message,
                        "Keeping image that cannot be measured"
                    );
                    report.warnings.push(ObjectWarning {
                        resource: placement.resource.clone(),
                        message: format!("kept without brightness check: {}", message),
                    });
                    report.images_kept += 1;
                    ops.push(PaintOp::Image { placement });
                }
                Verdict::Failed(message) => {
                    warn!(
                        page = page.number,
                        resource = %placement.resource,
                        %message,
                        "Skipping undecodable image"
                    );
                    report.warnings.push(ObjectWarning {
                        resource: placement.resource,
                        message: format!("skipped: {}", message),
                    });
                }
            }
        }

        for span in page.spans {
            ops.push(PaintOp::Text {
                span,
                color: self.text_color,
            });
        }

        debug!(
            kept = report.images_kept,
            removed = report.images_removed.len(),
            spans = report.text_spans,
            "Page planned"
        );

        let plan = PagePlan {
            number: page.number,
            width: page.width,
            height: page.height,
            rotate: page.rotate,
            ops,
        };
        (plan, report)
    }

    /// Classify one source image, decoding it at most once. With box removal
    /// off nothing is decoded.
    fn classify(&mut self, source: &impl RasterSource, id: ObjectId) -> Verdict {
        if !self.policy.is_active() {
            return Verdict::Classified(Classification::keep_unmeasured());
        }
        if let Some(decided) = self.decided.get(&id) {
            return decided.clone();
        }
        let policy = self.policy;
        let decided = match source
            .samples(id)
            .and_then(|samples| policy.classify(&samples))
        {
            Ok(classification) => Verdict::Classified(classification),
            Err(err @ UnredactError::UnsupportedImage(_)) => {
                Verdict::Unmeasurable(err.to_string())
            }
            Err(err) => Verdict::Failed(err.to_string()),
        };
        self.decided.insert(id, decided.clone());
        decided
    }
}
