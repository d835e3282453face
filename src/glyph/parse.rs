use std::convert::Infallible;
use std::str::FromStr;

use super::*;
use crate::error::{DocumentError, ErrorKind};
use crate::{json, plist_codec};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

#[cfg(test)]
pub(crate) fn parse_glyph(xml: &[u8]) -> Result<Glyph, DocumentError> {
    GlifParser::from_xml(xml, DEFAULT_UNITS_PER_EM)
}

pub(crate) struct GlifParser {
    glyph: Glyph,
    default_metric: i32,
}

impl GlifParser {
    pub(crate) fn from_xml(xml: &[u8], default_metric: i32) -> Result<Glyph, DocumentError> {
        let mut reader = Reader::from_reader(xml);

        start(&mut reader, default_metric).and_then(|glyph| {
            GlifParser { glyph, default_metric }.parse_body(&mut reader, xml)
        })
    }

    fn parse_body(mut self, reader: &mut Reader<&[u8]>, raw_xml: &[u8]) -> Result<Glyph, DocumentError> {
        let mut seen_advance = false;
        let mut seen_lib = false;
        let mut seen_outline = false;

        loop {
            match reader.read_event()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"outline" if !seen_outline => {
                        seen_outline = true;
                        self.parse_outline(reader)?
                    }
                    b"lib" if !seen_lib => {
                        seen_lib = true;
                        self.parse_lib(reader, raw_xml)?
                    }
                    b"note" if self.glyph.properties.note.is_none() => {
                        self.glyph.properties.note = Some(plist_codec::read_text(reader, b"note")?);
                    }
                    b"advance" if !seen_advance => {
                        seen_advance = true;
                        self.parse_advance(&start)?;
                        reader.read_to_end(start.name())?;
                    }
                    b"unicode" => {
                        self.parse_unicode(&start)?;
                        reader.read_to_end(start.name())?;
                    }
                    b"anchor" => {
                        self.parse_anchor(&start)?;
                        reader.read_to_end(start.name())?;
                    }
                    // guideline, image and anything unknown
                    _other => {
                        reader.read_to_end(start.name())?;
                    }
                },
                Event::Empty(start) => match start.name().as_ref() {
                    b"outline" => seen_outline = true,
                    b"advance" if !seen_advance => {
                        seen_advance = true;
                        self.parse_advance(&start)?
                    }
                    b"unicode" => self.parse_unicode(&start)?,
                    b"anchor" => self.parse_anchor(&start)?,
                    _other => (),
                },
                Event::End(ref end) if end.name().as_ref() == b"glyph" => break,
                Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
                _other => (),
            }
        }

        Ok(self.glyph)
    }

    fn parse_outline(&mut self, reader: &mut Reader<&[u8]>) -> Result<(), DocumentError> {
        let outline = &mut self.glyph.outline_data;
        loop {
            match reader.read_event()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"contour" => outline.contours.push(parse_contour(reader)?),
                    b"component" => {
                        outline.components.push(parse_component(&start)?);
                        reader.read_to_end(start.name())?;
                    }
                    _other => {
                        reader.read_to_end(start.name())?;
                    }
                },
                Event::Empty(start) => match start.name().as_ref() {
                    b"contour" => outline.contours.push(Contour::default()),
                    b"component" => outline.components.push(parse_component(&start)?),
                    _other => (),
                },
                Event::End(ref end) if end.name().as_ref() == b"outline" => break,
                Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
                _other => (),
            }
        }
        Ok(())
    }

    fn parse_lib(&mut self, reader: &mut Reader<&[u8]>, raw_xml: &[u8]) -> Result<(), DocumentError> {
        // The lib is a plist fragment; hand the precise slice of the raw buffer
        // to the plist decoder.
        let start = reader.buffer_position() as usize;
        let mut end = start;
        loop {
            match reader.read_event()? {
                Event::End(ref close) if close.name().as_ref() == b"lib" => break,
                Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
                _other => end = reader.buffer_position() as usize,
            }
        }

        match plist_codec::decode(&raw_xml[start..end]) {
            Ok(plist::Value::Dictionary(dict)) => {
                self.glyph.properties.lib =
                    dict.iter().map(|(key, value)| (key.clone(), json::plist_to_json(value))).collect();
            }
            Ok(_) => log::warn!("glyph '{}' has a lib that is not a dictionary", self.glyph.glyph_name),
            Err(e) => log::warn!("ignoring unreadable lib in glyph '{}': {e}", self.glyph.glyph_name),
        }
        Ok(())
    }

    fn parse_advance(&mut self, data: &BytesStart) -> Result<(), DocumentError> {
        let mut width = self.default_metric;
        let mut height = self.default_metric;
        for attr in data.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"width" => width = parse_metric(&attr.unescape_value()?)?,
                b"height" => height = parse_metric(&attr.unescape_value()?)?,
                _other => (),
            }
        }

        self.glyph.advance_width = width;
        self.glyph.advance_height = height;
        Ok(())
    }

    fn parse_unicode(&mut self, data: &BytesStart) -> Result<(), DocumentError> {
        for attr in data.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"hex" {
                self.glyph.unicodes.push(attr.unescape_value()?.into_owned());
            }
        }
        Ok(())
    }

    fn parse_anchor(&mut self, data: &BytesStart) -> Result<(), DocumentError> {
        let mut x: Option<f64> = None;
        let mut y: Option<f64> = None;
        let mut name: Option<String> = None;

        for attr in data.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"x" => x = Some(parse_number(&value)?),
                b"y" => y = Some(parse_number(&value)?),
                b"name" => name = Some(value.into_owned()),
                _other => (),
            }
        }

        match (x, y) {
            (Some(x), Some(y)) => {
                self.glyph.properties.anchors.push(Anchor { x, y, name });
                Ok(())
            }
            _ => Err(ErrorKind::BadPoint.into()),
        }
    }
}

fn parse_contour(reader: &mut Reader<&[u8]>) -> Result<Contour, DocumentError> {
    let mut contour = Contour::default();
    loop {
        match reader.read_event()? {
            Event::Empty(ref start) if start.name().as_ref() == b"point" => {
                contour.points.push(parse_point(start)?);
            }
            Event::Start(ref start) if start.name().as_ref() == b"point" => {
                contour.points.push(parse_point(start)?);
                reader.read_to_end(start.name())?;
            }
            Event::Start(ref start) => {
                reader.read_to_end(start.name())?;
            }
            Event::End(ref end) if end.name().as_ref() == b"contour" => break,
            Event::Eof => return Err(ErrorKind::UnexpectedEof.into()),
            _other => (),
        }
    }
    Ok(contour)
}

fn parse_point(data: &BytesStart) -> Result<ContourPoint, DocumentError> {
    let mut x: Option<f64> = None;
    let mut y: Option<f64> = None;
    let mut typ: Option<PointType> = None;
    let mut smooth: Option<bool> = None;

    for attr in data.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"x" => x = Some(parse_number(&value)?),
            b"y" => y = Some(parse_number(&value)?),
            b"type" => typ = Some(PointType::from(&*value)),
            b"smooth" => smooth = Some(value == "yes"),
            // name and identifier are not part of the outline model
            _other => (),
        }
    }

    match (x, y) {
        (Some(x), Some(y)) => Ok(ContourPoint { x, y, typ, smooth }),
        _ => Err(ErrorKind::BadPoint.into()),
    }
}

fn parse_component(data: &BytesStart) -> Result<Component, DocumentError> {
    let mut base: Option<String> = None;
    let mut component = Component::default();

    for attr in data.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"base" => base = Some(value.into_owned()),
            b"xScale" => component.x_scale = Some(parse_number(&value)?),
            b"xyScale" => component.xy_scale = Some(parse_number(&value)?),
            b"yxScale" => component.yx_scale = Some(parse_number(&value)?),
            b"yScale" => component.y_scale = Some(parse_number(&value)?),
            b"xOffset" => component.x_offset = Some(parse_number(&value)?),
            b"yOffset" => component.y_offset = Some(parse_number(&value)?),
            _other => (),
        }
    }

    match base {
        Some(base) if !base.is_empty() => Ok(Component { base, ..component }),
        _ => Err(ErrorKind::ComponentMissingBase.into()),
    }
}

fn start(reader: &mut Reader<&[u8]>, default_metric: i32) -> Result<Glyph, DocumentError> {
    loop {
        match reader.read_event()? {
            Event::Comment(_) | Event::Decl(_) | Event::DocType(_) | Event::PI(_) => (),
            Event::Text(ref text) if text.iter().all(u8::is_ascii_whitespace) => (),
            Event::Start(ref start) if start.name().as_ref() == b"glyph" => {
                let mut name: Option<String> = None;
                let mut format: u32 = 1;
                for attr in start.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?;
                    match attr.key.as_ref() {
                        b"name" => name = Some(value.into_owned()),
                        // an unreadable format is treated like a missing one
                        b"format" => format = value.trim().parse().unwrap_or(1),
                        _other => (),
                    }
                }
                let mut glyph = Glyph::new(name.unwrap_or_default());
                glyph.format_version = format;
                glyph.advance_width = default_metric;
                glyph.advance_height = default_metric;
                return Ok(glyph);
            }
            _other => return Err(ErrorKind::WrongFirstElement.into()),
        }
    }
}

fn parse_number(value: &str) -> Result<f64, DocumentError> {
    value.trim().parse().map_err(|_| ErrorKind::BadNumber.into())
}

// Advances are integral in the model; fractional source values are rounded.
fn parse_metric(value: &str) -> Result<i32, DocumentError> {
    let value = value.trim();
    match value.parse::<i32>() {
        Ok(metric) => Ok(metric),
        Err(_) => Ok(parse_number(value)?.round() as i32),
    }
}

impl From<&str> for PointType {
    fn from(s: &str) -> Self {
        match s {
            "move" => PointType::Move,
            "line" => PointType::Line,
            "offcurve" => PointType::OffCurve,
            "curve" => PointType::Curve,
            "qcurve" => PointType::QCurve,
            other => PointType::Other(other.to_string()),
        }
    }
}

impl FromStr for PointType {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}
