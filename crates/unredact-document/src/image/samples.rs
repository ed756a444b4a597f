// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image sample decoding — turns an image XObject stream into 8-bit samples
// and, for buffers with more than three channels, a scoped RGB copy used by
// the brightness test. Operates on in-memory buffers using the `image` crate.

use std::borrow::Cow;

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::{debug, instrument};
use unredact_core::error::{Result, UnredactError};

use crate::pdf::objects::{self, get, number, resolve};

/// Filters whose output the engine cannot decode.
const UNSUPPORTED_FILTERS: &[&[u8]] = &[b"JPXDecode", b"JBIG2Decode", b"CCITTFaxDecode"];

/// Decoded samples of one image, 8 bits per channel, rows packed.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSamples {
    pub width: u32,
    pub height: u32,
    /// Channels per pixel.
    pub components: u8,
    pub data: Vec<u8>,
}

/// Image colour spaces, reduced to what the brightness test needs.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorSpace>,
        hival: usize,
        lookup: Vec<u8>,
    },
    /// Anything else with a known channel count (Lab, Separation, DeviceN).
    Channels(u8),
}

impl ColorSpace {
    fn components(&self) -> u8 {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
            Self::Indexed { .. } => 1,
            Self::Channels(n) => *n,
        }
    }

    fn parse(doc: &Document, object: &Object) -> Result<Self> {
        Self::parse_nested(doc, object, false)
    }

    /// `in_palette` is set while parsing the base of an Indexed space, which
    /// may not itself be Indexed.
    fn parse_nested(doc: &Document, object: &Object, in_palette: bool) -> Result<Self> {
        let object = resolve(doc, object)
            .ok_or_else(|| UnredactError::ImageError("unresolvable /ColorSpace".into()))?;
        match object {
            Object::Name(name) => Self::from_family(name),
            Object::Array(items) => {
                let family = items
                    .first()
                    .and_then(|item| resolve(doc, item))
                    .and_then(objects::name)
                    .ok_or_else(|| UnredactError::ImageError("empty /ColorSpace array".into()))?;
                match family {
                    b"ICCBased" => {
                        let channels = items
                            .get(1)
                            .and_then(|item| resolve(doc, item))
                            .and_then(|obj| match obj {
                                Object::Stream(stream) => get(doc, &stream.dict, b"N"),
                                _ => None,
                            })
                            .and_then(number)
                            .unwrap_or(3.0) as u8;
                        Ok(match channels {
                            1 => Self::Gray,
                            3 => Self::Rgb,
                            4 => Self::Cmyk,
                            n => Self::Channels(n),
                        })
                    }
                    b"Indexed" | b"I" => {
                        if in_palette {
                            return Err(UnredactError::ImageError(
                                "Indexed colour space used as a palette base".into(),
                            ));
                        }
                        let base = items.get(1).ok_or_else(|| {
                            UnredactError::ImageError("Indexed colour space without base".into())
                        })?;
                        let base = Self::parse_nested(doc, base, true)?;
                        let hival = items
                            .get(2)
                            .and_then(|item| resolve(doc, item))
                            .and_then(number)
                            .unwrap_or(255.0)
                            .clamp(0.0, 255.0) as usize;
                        let lookup = match items.get(3).and_then(|item| resolve(doc, item)) {
                            Some(Object::String(bytes, _)) => bytes.clone(),
                            Some(Object::Stream(stream)) => objects::stream_data(doc, stream)?,
                            _ => {
                                return Err(UnredactError::ImageError(
                                    "Indexed colour space without lookup table".into(),
                                ));
                            }
                        };
                        Ok(Self::Indexed {
                            base: Box::new(base),
                            hival,
                            lookup,
                        })
                    }
                    b"Separation" => Ok(Self::Channels(1)),
                    b"DeviceN" => {
                        let colorants = match items.get(1).and_then(|item| resolve(doc, item)) {
                            Some(Object::Array(names)) => names.len().clamp(1, 32) as u8,
                            _ => 1,
                        };
                        Ok(Self::Channels(colorants))
                    }
                    b"CalGray" => Ok(Self::Gray),
                    b"CalRGB" => Ok(Self::Rgb),
                    b"Lab" => Ok(Self::Channels(3)),
                    other => Self::from_family(other),
                }
            }
            _ => Err(UnredactError::ImageError(
                "/ColorSpace is neither a name nor an array".into(),
            )),
        }
    }

    fn from_family(name: &[u8]) -> Result<Self> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Ok(Self::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(Self::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(Self::Cmyk),
            b"Lab" => Ok(Self::Channels(3)),
            other => Err(UnredactError::UnsupportedImage(format!(
                "colour space {}",
                objects::name_string(other)
            ))),
        }
    }
}

impl RasterSamples {
    /// Decode the samples of an image XObject.
    #[instrument(skip_all, fields(bytes_len = stream.content.len()))]
    pub fn decode(doc: &Document, stream: &Stream) -> Result<Self> {
        let dict = &stream.dict;
        let filters = objects::filters(doc, dict);

        if let Some(filter) = filters
            .iter()
            .find(|filter| UNSUPPORTED_FILTERS.contains(&filter.as_slice()))
        {
            return Err(UnredactError::UnsupportedImage(objects::name_string(filter)));
        }

        if filters.iter().any(|filter| filter == b"DCTDecode" || filter == b"DCT") {
            if filters.len() > 1 {
                return Err(UnredactError::UnsupportedImage(
                    "DCTDecode chained with other filters".into(),
                ));
            }
            return Self::from_jpeg(&stream.content);
        }

        let width = dimension(doc, dict, b"Width")?;
        let height = dimension(doc, dict, b"Height")?;
        let data = objects::stream_data(doc, stream)
            .map_err(|err| UnredactError::ImageError(err.to_string()))?;

        let is_mask = matches!(get(doc, dict, b"ImageMask"), Some(Object::Boolean(true)));
        let (color_space, bits) = if is_mask {
            (ColorSpace::Gray, 1)
        } else {
            let color_space = match dict.get(b"ColorSpace") {
                Ok(object) => ColorSpace::parse(doc, object)?,
                Err(_) => {
                    return Err(UnredactError::ImageError(
                        "image without /ColorSpace".into(),
                    ));
                }
            };
            let bits = get(doc, dict, b"BitsPerComponent")
                .and_then(number)
                .unwrap_or(8.0) as u32;
            (color_space, bits)
        };
        if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
            return Err(UnredactError::ImageError(format!(
                "unsupported bit depth {}",
                bits
            )));
        }

        let channels = color_space.components();
        let raw = unpack(&data, width, height, channels, bits)?;

        let samples = match &color_space {
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => expand_palette(&raw, base.components(), *hival, lookup),
            _ => {
                let max = ((1u32 << bits) - 1) as f64;
                let scaled: Vec<u8> = raw
                    .iter()
                    .map(|&value| ((value as f64) * 255.0 / max).round() as u8)
                    .collect();
                if channels == 1 && decode_is_inverted(doc, dict) {
                    scaled.into_iter().map(|value| 255 - value).collect()
                } else {
                    scaled
                }
            }
        };

        let components = match &color_space {
            ColorSpace::Indexed { base, .. } => base.components(),
            other => other.components(),
        };

        debug!(width, height, components, bits, "image samples decoded");
        Ok(Self {
            width,
            height,
            components,
            data: samples,
        })
    }

    /// Decode a baseline or progressive JPEG (`DCTDecode`).
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|err| UnredactError::ImageError(format!("JPEG decoding failed: {}", err)))?;
        Ok(Self::from_dynamic(decoded))
    }

    /// Wrap an already-decoded `DynamicImage`. Grayscale stays single
    /// channel; everything else becomes RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageLuma8(gray) => Self {
                width,
                height,
                components: 1,
                data: gray.into_raw(),
            },
            other => Self {
                width,
                height,
                components: 3,
                data: other.to_rgb8().into_raw(),
            },
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Samples for the brightness test. Buffers with more than three channels
    /// are converted to an RGB copy; others are borrowed unchanged.
    pub fn normalized(&self) -> Cow<'_, [u8]> {
        if self.components <= 3 {
            return Cow::Borrowed(&self.data);
        }

        let channels = self.components as usize;
        let width = self.width;
        let rgb = RgbImage::from_fn(self.width, self.height, |x, y| {
            let offset = (y as usize * width as usize + x as usize) * channels;
            let pixel = &self.data[offset..offset + channels];
            if channels == 4 {
                cmyk_to_rgb(pixel[0], pixel[1], pixel[2], pixel[3])
            } else {
                // Treat every channel as an ink: the more ink, the darker.
                let ink: u32 = pixel.iter().map(|&v| v as u32).sum();
                let gray = 255 - ink.min(255) as u8;
                image::Rgb([gray, gray, gray])
            }
        });
        Cow::Owned(rgb.into_raw())
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> image::Rgb<u8> {
    let white = 255 - k as u32;
    let channel = |ink: u8| ((255 - ink as u32) * white / 255) as u8;
    image::Rgb([channel(c), channel(m), channel(y)])
}

fn dimension(doc: &Document, dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let value = get(doc, dict, key).and_then(number).ok_or_else(|| {
        UnredactError::ImageError(format!(
            "image without /{}",
            String::from_utf8_lossy(key)
        ))
    })?;
    if value < 1.0 {
        return Err(UnredactError::ImageError(format!(
            "image /{} is {}",
            String::from_utf8_lossy(key),
            value
        )));
    }
    Ok(value as u32)
}

fn decode_is_inverted(doc: &Document, dict: &Dictionary) -> bool {
    match get(doc, dict, b"Decode") {
        Some(Object::Array(range)) if range.len() >= 2 => {
            let low = resolve(doc, &range[0]).and_then(number).unwrap_or(0.0);
            let high = resolve(doc, &range[1]).and_then(number).unwrap_or(1.0);
            low > high
        }
        _ => false,
    }
}

/// Unpack raw sample values at their full bit depth. Each row starts on a
/// byte boundary.
fn unpack(data: &[u8], width: u32, height: u32, channels: u8, bits: u32) -> Result<Vec<u16>> {
    let per_row = width as usize * channels as usize;
    let row_bytes = (per_row * bits as usize).div_ceil(8);
    let needed = row_bytes * height as usize;
    if data.len() < needed {
        return Err(UnredactError::ImageError(format!(
            "image data truncated: {} bytes, expected {}",
            data.len(),
            needed
        )));
    }

    let mut values = Vec::with_capacity(per_row * height as usize);
    for row in data[..needed].chunks_exact(row_bytes) {
        match bits {
            8 => values.extend(row.iter().map(|&b| b as u16)),
            16 => values.extend(
                row.chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            ),
            _ => {
                let mask = (1u16 << bits) - 1;
                let per_byte = 8 / bits as usize;
                values.extend(
                    row.iter()
                        .flat_map(|&byte| {
                            (0..per_byte).map(move |slot| {
                                let shift = 8 - bits as usize * (slot + 1);
                                (byte as u16 >> shift) & mask
                            })
                        })
                        .take(per_row),
                );
            }
        }
    }
    Ok(values)
}

fn expand_palette(indices: &[u16], base_channels: u8, hival: usize, lookup: &[u8]) -> Vec<u8> {
    let channels = base_channels as usize;
    let mut out = Vec::with_capacity(indices.len() * channels);
    for &index in indices {
        let start = (index as usize).min(hival) * channels;
        match lookup.get(start..start + channels) {
            Some(entry) => out.extend_from_slice(entry),
            None => out.extend(std::iter::repeat_n(0u8, channels)),
        }
    }
    out
}
