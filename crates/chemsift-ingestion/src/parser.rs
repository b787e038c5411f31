//! Article XML parser.
//!
//! Extracts the text of the first `title`, `abstract` and `body` elements found
//! below the root, in document order. All nested markup is flattened: the
//! text of every descendant is concatenated in order, nothing else is kept.
//! A missing element yields an empty field. Malformed XML is an error.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IngestionError, Result};
use crate::models::Document;

const FIELDS: [&[u8]; 3] = [b"title", b"abstract", b"body"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Capture {
    Pending,
    /// Inside the element; depth counts nested same-name elements.
    Active(usize),
    Done,
}

/// Parse an article XML string.
pub fn parse_document(xml: &str) -> Result<Document> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);

    let mut state = [Capture::Pending; 3];
    let mut text: [String; 3] = Default::default();
    let mut depth = 0usize;
    let mut root_closed = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root_closed {
                    return Err(junk_after_root(&reader));
                }
                check_attributes(&e)?;
                let name = e.name();
                for (i, field) in FIELDS.iter().enumerate() {
                    match state[i] {
                        Capture::Active(d) if name.as_ref() == *field => {
                            state[i] = Capture::Active(d + 1);
                        }
                        // `.//name` semantics: the root itself never matches
                        Capture::Pending if depth > 0 && name.as_ref() == *field => {
                            state[i] = Capture::Active(1);
                        }
                        _ => {}
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if root_closed {
                    return Err(junk_after_root(&reader));
                }
                check_attributes(&e)?;
                let name = e.name();
                for (i, field) in FIELDS.iter().enumerate() {
                    if state[i] == Capture::Pending && depth > 0 && name.as_ref() == *field {
                        state[i] = Capture::Done;
                    }
                }
                if depth == 0 {
                    root_closed = true;
                }
            }
            Event::End(e) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    IngestionError::Xml(format!(
                        "unexpected closing tag at position {}",
                        reader.buffer_position()
                    ))
                })?;
                let name = e.name();
                for (i, field) in FIELDS.iter().enumerate() {
                    if let Capture::Active(d) = state[i] {
                        if name.as_ref() == *field {
                            state[i] = if d == 1 { Capture::Done } else { Capture::Active(d - 1) };
                        }
                    }
                }
                if depth == 0 {
                    root_closed = true;
                }
            }
            Event::Text(e) => {
                let chunk = e.unescape()?;
                if depth == 0 {
                    if !chunk.trim().is_empty() {
                        return Err(IngestionError::Xml(format!(
                            "text outside the root element at position {}",
                            reader.buffer_position()
                        )));
                    }
                    continue;
                }
                push_active(&state, &mut text, &chunk);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let chunk = std::str::from_utf8(&raw)
                    .map_err(|err| IngestionError::Encoding(err.to_string()))?;
                push_active(&state, &mut text, chunk);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if depth != 0 {
        return Err(IngestionError::Xml(format!(
            "unexpected end of document: {depth} unclosed element(s)"
        )));
    }
    if !root_closed {
        return Err(IngestionError::Xml("no element found".to_string()));
    }

    let [title, abstract_text, body] = text;
    Ok(Document {
        title,
        abstract_text,
        body,
    })
}

/// Read and parse one article file.
pub fn parse_file(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    let xml = String::from_utf8(bytes)
        .map_err(|e| IngestionError::Encoding(format!("file is not valid UTF-8: {e}")))?;
    parse_document(&xml)
}

/// quick-xml validates attributes lazily; walk them so duplicates and
/// unquoted values are rejected.
fn check_attributes(element: &BytesStart<'_>) -> Result<()> {
    for attr in element.attributes() {
        attr.map_err(|e| IngestionError::Xml(format!("malformed attribute: {e}")))?;
    }
    Ok(())
}

fn push_active(state: &[Capture; 3], text: &mut [String; 3], chunk: &str) {
    for (i, s) in state.iter().enumerate() {
        if matches!(s, Capture::Active(_)) {
            text[i].push_str(chunk);
        }
    }
}

fn junk_after_root(reader: &Reader<&[u8]>) -> IngestionError {
    IngestionError::Xml(format!(
        "junk after document element at position {}",
        reader.buffer_position()
    ))
}
