// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic PDF fixtures for unit tests.

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// An uncompressed image XObject.
#[derive(Debug, Clone)]
pub(crate) struct FixtureImage {
    pub width: u32,
    pub height: u32,
    pub color_space: Object,
    pub bits_per_component: i64,
    pub data: Vec<u8>,
    pub extra: Dictionary,
}

impl FixtureImage {
    pub fn gray(width: u32, height: u32, value: u8) -> Self {
        Self::raw(
            width,
            height,
            "DeviceGray",
            vec![value; (width * height) as usize],
        )
    }

    pub fn rgb(width: u32, height: u32, pixel: [u8; 3]) -> Self {
        Self::raw(
            width,
            height,
            "DeviceRGB",
            pixel.repeat((width * height) as usize),
        )
    }

    pub fn cmyk(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        Self::raw(
            width,
            height,
            "DeviceCMYK",
            pixel.repeat((width * height) as usize),
        )
    }

    pub fn raw(width: u32, height: u32, color_space: &str, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            color_space: Object::Name(color_space.as_bytes().to_vec()),
            bits_per_component: 8,
            data,
            extra: Dictionary::new(),
        }
    }

    pub fn to_stream(&self) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space.clone(),
            "BitsPerComponent" => self.bits_per_component,
        };
        for (key, value) in self.extra.iter() {
            dict.set(key.clone(), value.clone());
        }
        Stream::new(dict, self.data.clone())
    }
}

/// A Form XObject on a fixture page.
#[derive(Debug, Clone)]
pub(crate) struct FixtureForm {
    pub name: String,
    pub content: String,
    pub matrix: Option<[f64; 6]>,
    /// Without its own /Resources a form uses the page's, which name every
    /// form including itself.
    pub own_resources: bool,
}

/// One page of a fixture document. Images and forms share one /XObject
/// dictionary. Forms with their own resources see the images but not each
/// other.
#[derive(Debug, Clone)]
pub(crate) struct FixturePage {
    pub width: f64,
    pub height: f64,
    pub content: String,
    pub images: Vec<(String, FixtureImage)>,
    pub forms: Vec<FixtureForm>,
    pub crop_box: Option<[f64; 4]>,
    pub rotate: Option<i64>,
}

impl FixturePage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            content: String::new(),
            images: Vec::new(),
            forms: Vec::new(),
            crop_box: None,
            rotate: None,
        }
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn image(mut self, name: &str, image: FixtureImage) -> Self {
        self.images.push((name.to_string(), image));
        self
    }

    pub fn form(mut self, name: &str, content: &str, matrix: Option<[f64; 6]>) -> Self {
        self.forms.push(FixtureForm {
            name: name.to_string(),
            content: content.to_string(),
            matrix,
            own_resources: true,
        });
        self
    }

    /// A form that resolves names through the page's resources.
    pub fn shared_form(mut self, name: &str, content: &str) -> Self {
        self.forms.push(FixtureForm {
            name: name.to_string(),
            content: content.to_string(),
            matrix: None,
            own_resources: false,
        });
        self
    }

    pub fn crop_box(mut self, rect: [f64; 4]) -> Self {
        self.crop_box = Some(rect);
        self
    }

    pub fn rotate(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

fn reals(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// Serialise fixture pages into a complete PDF.
pub(crate) fn build_pdf(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut xobjects = Dictionary::new();
        for (name, image) in &page.images {
            let id = doc.add_object(image.to_stream());
            xobjects.set(name.as_bytes().to_vec(), Object::Reference(id));
        }

        let mut form_entries = Vec::new();
        for form in &page.forms {
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => reals(&[0.0, 0.0, page.width, page.height]),
            };
            if form.own_resources {
                dict.set(
                    "Resources",
                    dictionary! {
                        "Font" => dictionary! { "F1" => font_id },
                        "XObject" => xobjects.clone(),
                    },
                );
            }
            if let Some(matrix) = &form.matrix {
                dict.set("Matrix", reals(matrix));
            }
            let id = doc.add_object(Stream::new(dict, form.content.as_bytes().to_vec()));
            form_entries.push((form.name.clone(), id));
        }
        for (name, id) in form_entries {
            xobjects.set(name.into_bytes(), Object::Reference(id));
        }

        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            page.content.as_bytes().to_vec(),
        ));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => reals(&[0.0, 0.0, page.width, page.height]),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        };
        if let Some(crop) = page.crop_box {
            page_dict.set("CropBox", reals(&crop));
        }
        if let Some(rotate) = page.rotate {
            page_dict.set("Rotate", rotate);
        }
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("fixture PDF serialises");
    output
}
