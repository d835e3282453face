//! Writing out .glif files

use std::io::{Cursor, Write};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use super::{Anchor, Component, Contour, ContourPoint, Glyph, PointType};
use crate::error::WriteError;
use crate::json;
use crate::write::WriteOptions;

/// The glif format version every glyph is written as.
const GLIF_FORMAT: &str = "2";

impl Glyph {
    #[cfg(test)]
    pub(crate) fn encode_xml(&self) -> Result<Vec<u8>, WriteError> {
        self.encode_xml_with_options(&WriteOptions::default())
    }

    pub(crate) fn encode_xml_with_options(&self, opts: &WriteOptions) -> Result<Vec<u8>, WriteError> {
        let mut writer = Writer::new_with_indent(
            Cursor::new(Vec::new()),
            opts.whitespace_char,
            opts.whitespace_count,
        );
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut start = BytesStart::new("glyph");
        start.push_attribute(("name", self.glyph_name.as_str()));
        start.push_attribute(("format", GLIF_FORMAT));
        writer.write_event(Event::Start(start))?;

        let mut advance = BytesStart::new("advance");
        advance.push_attribute(("width", self.advance_width.to_string().as_str()));
        advance.push_attribute(("height", self.advance_height.to_string().as_str()));
        writer.write_event(Event::Empty(advance))?;

        for hex in &self.unicodes {
            let mut start = BytesStart::new("unicode");
            start.push_attribute(("hex", hex.as_str()));
            writer.write_event(Event::Empty(start))?;
        }

        if let Some(ref note) = self.properties.note {
            writer.write_event(Event::Start(BytesStart::new("note")))?;
            writer.write_event(Event::Text(BytesText::new(note)))?;
            writer.write_event(Event::End(BytesEnd::new("note")))?;
        }

        for anchor in &self.properties.anchors {
            writer.write_event(anchor.to_event())?;
        }

        let outline = &self.outline_data;
        if outline.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("outline")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("outline")))?;
            for contour in &outline.contours {
                contour.write_xml(&mut writer)?;
            }
            for component in &outline.components {
                writer.write_event(component.to_event())?;
            }
            writer.write_event(Event::End(BytesEnd::new("outline")))?;
        }

        if !self.properties.lib.is_empty() {
            write_lib_section(&self.properties.lib, &mut writer, opts)?;
        }

        writer.write_event(Event::End(BytesEnd::new("glyph")))?;
        writer.get_mut().write_all(b"\n")?;

        let mut buf = writer.into_inner().into_inner();
        opts.apply_quote_style(&mut buf);
        Ok(buf)
    }
}

/// Writes the lib section. We delegate to the plist crate for the contents,
/// and then splice them into our document.
fn write_lib_section<T: Write>(
    lib: &serde_json::Map<String, serde_json::Value>,
    writer: &mut Writer<T>,
    options: &WriteOptions,
) -> Result<(), WriteError> {
    let dict = plist::Value::Dictionary(json::json_object_to_dictionary(lib));
    let mut as_plist = Vec::new();
    dict.to_writer_xml_with_options(&mut as_plist, options.xml_options())?;
    let as_plist = String::from_utf8(as_plist).map_err(|_| WriteError::InternalLibWriteError)?;

    // the plist crate writes the full document; we only want the dict
    let header = "<plist version=\"1.0\">\n";
    let footer = "\n</plist>";
    let start_idx = as_plist.find(header).map(|pos| pos + header.len());
    let end_idx = as_plist.rfind(footer);
    let dict_text = match (start_idx, end_idx) {
        (Some(start), Some(end)) if start <= end => &as_plist[start..end],
        _ => return Err(WriteError::InternalLibWriteError),
    };

    let indent = options.indent_str.as_ref();
    writer.write_event(Event::Start(BytesStart::new("lib")))?;
    for line in dict_text.lines() {
        writer.get_mut().write_all(b"\n")?;
        writer.get_mut().write_all(indent.repeat(2).as_bytes())?;
        writer.get_mut().write_all(line.as_bytes())?;
    }
    writer.write_event(Event::End(BytesEnd::new("lib")))?;
    Ok(())
}

impl Anchor {
    fn to_event(&self) -> Event<'_> {
        let mut start = BytesStart::new("anchor");
        start.push_attribute(("x", self.x.to_string().as_str()));
        start.push_attribute(("y", self.y.to_string().as_str()));
        if let Some(name) = &self.name {
            start.push_attribute(("name", name.as_str()));
        }
        Event::Empty(start)
    }
}

impl Component {
    fn to_event(&self) -> Event<'_> {
        let mut start = BytesStart::new("component");
        start.push_attribute(("base", self.base.as_str()));

        let optional = [
            ("xScale", self.x_scale),
            ("xyScale", self.xy_scale),
            ("yxScale", self.yx_scale),
            ("yScale", self.y_scale),
            ("xOffset", self.x_offset),
            ("yOffset", self.y_offset),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                start.push_attribute((key, value.to_string().as_str()));
            }
        }
        Event::Empty(start)
    }
}

impl Contour {
    fn write_xml<T: Write>(&self, writer: &mut Writer<T>) -> Result<(), WriteError> {
        if self.points.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("contour")))?;
            return Ok(());
        }
        writer.write_event(Event::Start(BytesStart::new("contour")))?;
        for point in &self.points {
            writer.write_event(point.to_event())?;
        }
        writer.write_event(Event::End(BytesEnd::new("contour")))?;
        Ok(())
    }
}

impl ContourPoint {
    fn to_event(&self) -> Event<'_> {
        let mut start = BytesStart::new("point");
        start.push_attribute(("x", self.x.to_string().as_str()));
        start.push_attribute(("y", self.y.to_string().as_str()));

        if let Some(typ) = &self.typ {
            start.push_attribute(("type", typ.as_str()));
        }
        if let Some(smooth) = self.smooth {
            start.push_attribute(("smooth", if smooth { "yes" } else { "no" }));
        }
        Event::Empty(start)
    }
}

impl PointType {
    /// The name of this point type in glif documents.
    pub fn as_str(&self) -> &str {
        match self {
            PointType::Move => "move",
            PointType::Line => "line",
            PointType::OffCurve => "offcurve",
            PointType::Curve => "curve",
            PointType::QCurve => "qcurve",
            PointType::Other(name) => name,
        }
    }
}
