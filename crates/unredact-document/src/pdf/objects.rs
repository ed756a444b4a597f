// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small helpers over the lopdf object model: reference resolution, numeric
// coercion, inherited page attributes, and stream decoding.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use unredact_core::error::{Result, UnredactError};
use unredact_core::types::{Matrix, Rect};

/// Chains of indirect references longer than this are treated as broken.
const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Look up `key` in `dict` and resolve the value.
pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|value| resolve(doc, value))
}

/// Look up `key` in `dict` and resolve it to a dictionary. A stream's
/// dictionary is returned for stream values.
pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match get(doc, dict, key)? {
        Object::Dictionary(inner) => Some(inner),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

pub(crate) fn name(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

pub(crate) fn name_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Read `[x0 y0 x1 y1]` as a rectangle.
pub(crate) fn rect(doc: &Document, object: &Object) -> Option<Rect> {
    let Object::Array(items) = resolve(doc, object)? else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = number(resolve(doc, item)?)?;
    }
    Some(Rect::new(values[0], values[1], values[2], values[3]))
}

/// Read `[a b c d e f]` as a matrix.
pub(crate) fn matrix(doc: &Document, object: &Object) -> Option<Matrix> {
    let Object::Array(items) = resolve(doc, object)? else {
        return None;
    };
    if items.len() != 6 {
        return None;
    }
    let mut values = [0.0; 6];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = number(resolve(doc, item)?)?;
    }
    Some(Matrix::new(
        values[0], values[1], values[2], values[3], values[4], values[5],
    ))
}

/// Look up a key in the page dictionary, walking up the page tree (via
/// /Parent) if the key is not found on the page itself.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current_id = page_id;
    for _ in 0..MAX_REFERENCE_DEPTH {
        let dict = match doc.get_object(current_id).ok()? {
            Object::Dictionary(dict) => dict,
            _ => return None,
        };
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current_id = *parent,
            _ => return None,
        }
    }
    None
}

/// Names listed in a stream's /Filter entry, in application order.
pub(crate) fn filters(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match get(doc, dict, b"Filter") {
        Some(Object::Name(filter)) => vec![filter.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| resolve(doc, item).and_then(name).map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Decode a stream's content, decompressing if a filter is present.
pub(crate) fn stream_data(doc: &Document, stream: &Stream) -> Result<Vec<u8>> {
    if filters(doc, &stream.dict).is_empty() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|err| UnredactError::PdfError(format!("failed to decompress stream: {}", err)))
}
