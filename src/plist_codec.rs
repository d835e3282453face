//! Reading and writing plist XML documents.
//!
//! The reader is deliberately forgiving: it understands the dict, array and
//! scalar elements UFO files use and silently skips anything else. The DTD is
//! never fetched and entities beyond the five predefined ones (plus numeric
//! character references) expand to nothing.
//!
//! Writing goes through the `plist` crate.

use base64::{engine::general_purpose::STANDARD as base64_standard, Engine};
use plist::{Dictionary, Value};
use quick_xml::{events::Event, name::QName, Reader};

use crate::error::{DocumentError, ErrorKind};
use crate::write::WriteOptions;
use crate::Error;

/// Decode a plist document.
///
/// The first value element found (after the optional `<plist>` wrapper) is
/// the document root. Unknown elements are skipped, as is a `<key>` that is
/// not followed by a recognized value.
pub fn decode(xml: &[u8]) -> Result<Value, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if let Some(value) = read_value(&mut reader, start.name().as_ref(), false)? {
                    return Ok(value);
                }
            }
            Event::Empty(start) => {
                if let Some(value) = read_value(&mut reader, start.name().as_ref(), true)? {
                    return Ok(value);
                }
            }
            Event::Eof => return Err(ErrorKind::MissingRoot.into()),
            _ => (),
        }
    }
}

/// Decode a plist document, falling back to an empty dictionary.
///
/// This is the import policy for metadata files: a corrupt plist must not
/// abort an otherwise valid import.
pub fn decode_or_empty(xml: &[u8]) -> Value {
    match decode(xml) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("failed to parse plist, using an empty dictionary: {e}");
            Value::Dictionary(Dictionary::new())
        }
    }
}

/// Serialize a value as a complete plist XML document.
pub fn encode(value: &Value, options: &WriteOptions) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    value.to_writer_xml_with_options(&mut buf, options.xml_options())?;
    options.apply_quote_style(&mut buf);
    Ok(buf)
}

// `wrapper` elements (like <plist> or a glif <lib>) are transparent: the
// reader keeps looking for a value inside them.
fn read_value(
    reader: &mut Reader<&[u8]>,
    name: &[u8],
    empty: bool,
) -> Result<Option<Value>, DocumentError> {
    let value = match name {
        b"dict" if empty => Value::Dictionary(Dictionary::new()),
        b"dict" => Value::Dictionary(read_dict(reader)?),
        b"array" if empty => Value::Array(Vec::new()),
        b"array" => Value::Array(read_array(reader)?),
        b"string" => Value::String(leaf_text(reader, name, empty)?),
        b"integer" => Value::Integer(parse_integer(leaf_text(reader, name, empty)?.trim())?),
        b"real" => {
            let text = leaf_text(reader, name, empty)?;
            Value::Real(text.trim().parse().map_err(|_| ErrorKind::BadNumber)?)
        }
        b"true" | b"false" => {
            leaf_text(reader, name, empty)?;
            Value::Boolean(name == b"true")
        }
        b"data" => {
            let text = leaf_text(reader, name, empty)?;
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            Value::Data(base64_standard.decode(compact).map_err(|_| ErrorKind::BadData)?)
        }
        b"plist" | b"lib" => return Ok(None),
        _other => {
            if !empty {
                reader.read_to_end(QName(name))?;
            }
            return Ok(None);
        }
    };
    Ok(Some(value))
}

fn read_dict(reader: &mut Reader<&[u8]>) -> Result<Dictionary, DocumentError> {
    let mut dict = Dictionary::new();
    let mut key: Option<String> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"key" => key = Some(read_text(reader, b"key")?),
                name => {
                    let value = read_child(reader, name, false)?;
                    if let (Some(key), Some(value)) = (key.take(), value) {
                        dict.insert(key, value);
                    }
                }
            },
            Event::Empty(start) => match start.name().as_ref() {
                b"key" => key = Some(String::new()),
                name => {
                    let value = read_child(reader, name, true)?;
                    if let (Some(key), Some(value)) = (key.take(), value) {
                        dict.insert(key, value);
                    }
                }
            },
            Event::End(_) => return Ok(dict),
            Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
            _ => (),
        }
    }
}

fn read_array(reader: &mut Reader<&[u8]>) -> Result<Vec<Value>, DocumentError> {
    let mut array = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                array.extend(read_child(reader, start.name().as_ref(), false)?);
            }
            Event::Empty(start) => {
                array.extend(read_child(reader, start.name().as_ref(), true)?);
            }
            Event::End(_) => return Ok(array),
            Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
            _ => (),
        }
    }
}

// Inside a container there are no wrappers: an unrecognized element is
// skipped along with its whole subtree.
fn read_child(
    reader: &mut Reader<&[u8]>,
    name: &[u8],
    empty: bool,
) -> Result<Option<Value>, DocumentError> {
    match name {
        b"plist" | b"lib" => {
            if !empty {
                reader.read_to_end(QName(name))?;
            }
            Ok(None)
        }
        _ => read_value(reader, name, empty),
    }
}

fn leaf_text(
    reader: &mut Reader<&[u8]>,
    name: &[u8],
    empty: bool,
) -> Result<String, DocumentError> {
    if empty {
        Ok(String::new())
    } else {
        read_text(reader, name)
    }
}

fn parse_integer(text: &str) -> Result<plist::Integer, DocumentError> {
    if let Ok(signed) = text.parse::<i64>() {
        return Ok(signed.into());
    }
    text.parse::<u64>().map(Into::into).map_err(|_| ErrorKind::BadNumber.into())
}

/// Collect the text content of the current element, up to its end tag.
///
/// Character data, CDATA sections and entity references are concatenated;
/// nested elements are skipped.
pub(crate) fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String, DocumentError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(raw) => {
                let raw = std::str::from_utf8(&raw).map_err(|_| ErrorKind::InvalidUtf8)?;
                match quick_xml::escape::unescape(raw) {
                    Ok(unescaped) => text.push_str(&unescaped),
                    Err(_) => text.push_str(raw),
                }
            }
            Event::CData(raw) => {
                text.push_str(std::str::from_utf8(&raw).map_err(|_| ErrorKind::InvalidUtf8)?)
            }
            Event::GeneralRef(reference) => push_reference(&mut text, &reference)?,
            Event::Start(start) => {
                reader.read_to_end(start.name())?;
            }
            Event::End(close) if close.name().as_ref() == end => return Ok(text),
            Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
            _ => (),
        }
    }
}

fn push_reference(text: &mut String, name: &[u8]) -> Result<(), DocumentError> {
    let name = std::str::from_utf8(name).map_err(|_| ErrorKind::InvalidUtf8)?;
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse(),
        };
        if let Some(chr) = code.ok().and_then(char::from_u32) {
            text.push(chr);
        }
        return Ok(());
    }
    match name {
        "amp" => text.push('&'),
        "lt" => text.push('<'),
        "gt" => text.push('>'),
        "apos" => text.push('\''),
        "quot" => text.push('"'),
        other => log::debug!("dropping unresolved entity '&{other};'"),
    }
    Ok(())
}
