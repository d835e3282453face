//! Data related to individual glyphs.

mod parse;
mod serialize;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, GlifWriteError};
use crate::font::DEFAULT_LAYER_NAME;
use crate::project::DEFAULT_UNITS_PER_EM;
use crate::WriteOptions;

/// A glyph, as decoded from a [`.glif` file][glif].
///
/// Glyphs of glif format 1 and 2 can be read; glyphs are always written
/// as format 2.
///
/// [glif]: http://unifiedfontobject.org/versions/ufo3/glyphs/glif/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    /// The name of the glyph, unique within its layer.
    pub glyph_name: String,
    /// Unicode code points as hexadecimal strings, in document order.
    ///
    /// The first entry is the primary code point for this glyph.
    #[serde(default)]
    pub unicodes: Vec<String>,
    /// Horizontal advance.
    pub advance_width: i32,
    /// Vertical advance.
    pub advance_height: i32,
    /// The glif format version the glyph was read from.
    pub format_version: u32,
    /// The layer this glyph belongs to.
    pub layer_name: String,
    /// Position of the glyph in the font's glyph order, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
    /// Contours and components.
    #[serde(default)]
    pub outline_data: Outline,
    /// Glyph data outside of the outline: note, anchors and lib.
    #[serde(default)]
    pub properties: GlyphProperties,
}

impl Glyph {
    /// Returns a new, empty [`Glyph`] in the default layer.
    ///
    /// Both advances are set to the default units-per-em.
    pub fn new(name: impl Into<String>) -> Self {
        Glyph {
            glyph_name: name.into(),
            unicodes: Vec::new(),
            advance_width: DEFAULT_UNITS_PER_EM,
            advance_height: DEFAULT_UNITS_PER_EM,
            format_version: 2,
            layer_name: DEFAULT_LAYER_NAME.into(),
            sort_order: None,
            outline_data: Outline::default(),
            properties: GlyphProperties::default(),
        }
    }

    /// Decode a glyph from the bytes of a `.glif` document.
    ///
    /// `default_metric` replaces any advance width or height the document
    /// does not declare; callers pass the font's units-per-em.
    pub fn parse_glif(xml: &[u8], default_metric: i32) -> Result<Self, DocumentError> {
        parse::GlifParser::from_xml(xml, default_metric)
    }

    /// Serialize this glyph as a format 2 `.glif` document.
    pub fn encode_glif(&self, options: &WriteOptions) -> Result<Vec<u8>, GlifWriteError> {
        self.encode_xml_with_options(options)
            .map_err(|inner| GlifWriteError { name: self.glyph_name.clone(), inner })
    }

    /// Returns true if the outline has neither contours nor components.
    pub fn is_empty(&self) -> bool {
        self.outline_data.is_empty()
    }
}

/// The drawing of a glyph: its contours and components.
///
/// An empty outline serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Contours, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contours: Vec<Contour>,
    /// Components, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

impl Outline {
    /// Returns true if there are no contours and no components.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty() && self.components.is_empty()
    }
}

/// A single path, made up of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// The points of the contour.
    #[serde(default)]
    pub points: Vec<ContourPoint>,
}

/// A point in a [`Contour`].
///
/// `typ` and `smooth` are only present when the source declared them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// The point type. A missing type means an off-curve point.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<PointType>,
    /// Whether the point was marked smooth (`smooth="yes"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
}

impl ContourPoint {
    /// Create a new point.
    pub fn new(x: f64, y: f64, typ: Option<PointType>, smooth: Option<bool>) -> Self {
        ContourPoint { x, y, typ, smooth }
    }
}

/// Possible types of a [`ContourPoint`].
///
/// Names outside the five UFO point types are kept verbatim as
/// [`PointType::Other`] and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    /// A point of this type must be the first in a contour; it starts an
    /// open contour.
    Move,
    /// Draw a straight line from the previous point to this point.
    Line,
    /// This point is part of a curve segment that goes up to the next point
    /// that is either a curve or a qcurve.
    OffCurve,
    /// Draw a cubic bezier curve from the last non-offcurve point to this point.
    Curve,
    /// Similar to curve, but uses quadratic curves, using the TrueType
    /// "implied on-curve points" principle.
    QCurve,
    /// A type name this crate does not know about.
    #[serde(untagged)]
    Other(String),
}

/// Another glyph inserted as part of the outline.
///
/// Each transform field is only present if the source declared it; absent
/// fields take the identity value when the font is compiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// The name of the base glyph.
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xy_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yx_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_offset: Option<f64>,
}

impl Component {
    /// A component referencing `base` with no explicit transform.
    pub fn new(base: impl Into<String>) -> Self {
        Component { base: base.into(), ..Default::default() }
    }
}

/// Glyph data that is not part of the outline.
///
/// Empty fields are omitted, so a glyph without extras serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphProperties {
    /// Arbitrary glyph note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Attachment anchors, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<Anchor>,
    /// The glyph's lib dictionary, in its JSON form.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub lib: serde_json::Map<String, serde_json::Value>,
}

impl GlyphProperties {
    /// Returns true if there is no note, no anchor and no lib.
    pub fn is_empty(&self) -> bool {
        self.note.is_none() && self.anchors.is_empty() && self.lib.is_empty()
    }
}

/// A reference position in a glyph, such as for attaching accents.
///
/// See the [Anchor section] of the UFO spec for more information.
///
/// [Anchor section]: https://unifiedfontobject.org/versions/ufo3/glyphs/glif/#anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Anchor x coordinate value.
    pub x: f64,
    /// Anchor y coordinate value.
    pub y: f64,
    /// Optional arbitrary name for the anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
