//! The font-level record produced by import and consumed by export.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::features::Features;
use crate::Error;

/// The units-per-em assumed when `fontinfo.plist` does not declare one.
pub const DEFAULT_UNITS_PER_EM: i32 = 1000;

/// The creator written to `metainfo.plist`.
pub static DEFAULT_METAINFO_CREATOR: &str = "org.ufo-codec";

/// Title used when neither the caller nor the font provides one.
pub static DEFAULT_TITLE: &str = "Imported Project";

/// Everything about a font except its glyphs.
///
/// Each plist document of the UFO is kept as a JSON tree, so unknown keys
/// survive an import/export cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Display title.
    pub title: String,
    /// Identifier of the owning user.
    pub owner_id: i64,
    /// `metainfo.plist`.
    pub meta_info: JsonValue,
    /// `fontinfo.plist`.
    pub font_info: JsonValue,
    /// `groups.plist`.
    pub groups: JsonValue,
    /// `kerning.plist`.
    pub kerning: JsonValue,
    /// `features.fea`, segmented.
    #[serde(default)]
    pub features: Features,
    /// `layercontents.plist`.
    pub layer_config: JsonValue,
    /// `lib.plist`.
    pub lib: JsonValue,
}

impl Default for Project {
    fn default() -> Self {
        let empty = || JsonValue::Object(Default::default());
        Project {
            title: DEFAULT_TITLE.into(),
            owner_id: 0,
            meta_info: serde_json::to_value(MetaInfo::default()).unwrap_or_else(|_| empty()),
            font_info: empty(),
            groups: empty(),
            kerning: empty(),
            features: Features::default(),
            layer_config: default_layer_config(),
            lib: empty(),
        }
    }
}

impl Project {
    /// The font's units-per-em, rounded, or [`DEFAULT_UNITS_PER_EM`].
    pub fn units_per_em(&self) -> i32 {
        self.font_info
            .get("unitsPerEm")
            .and_then(JsonValue::as_f64)
            .map(|upm| upm.round() as i32)
            .unwrap_or(DEFAULT_UNITS_PER_EM)
    }

    /// The title derived from `familyName` and `styleName` in the font info.
    ///
    /// Returns `None` when there is no non-empty family name.
    pub fn title_from_font_info(&self) -> Option<String> {
        let family = self.font_info.get("familyName").and_then(JsonValue::as_str)?;
        if family.is_empty() {
            return None;
        }
        let style = self.font_info.get("styleName").and_then(JsonValue::as_str).unwrap_or("");
        Some(format!("{family} {style}"))
    }
}

/// The layer configuration used when a font has no `layercontents.plist`.
pub fn default_layer_config() -> JsonValue {
    serde_json::json!({
        "layers": [{ "name": "public.default", "color": "#000000" }]
    })
}

/// A version of the [UFO spec].
///
/// [UFO spec]: http://unifiedfontobject.org
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum FormatVersion {
    /// UFO version 1.
    V1 = 1,
    /// UFO version 2.
    V2 = 2,
    /// UFO version 3.
    V3 = 3,
}

/// The contents of the [`metainfo.plist`] file.
///
/// [`metainfo.plist`]: http://unifiedfontobject.org/versions/ufo3/metainfo.plist/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    /// Creator field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// UFO specification major version field.
    pub format_version: FormatVersion,
    /// UFO specification minor version field.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub format_version_minor: u32,
}

fn is_zero(minor: &u32) -> bool {
    *minor == 0
}

impl Default for MetaInfo {
    fn default() -> Self {
        MetaInfo {
            creator: Some(DEFAULT_METAINFO_CREATOR.to_string()),
            format_version: FormatVersion::V3,
            format_version_minor: 0,
        }
    }
}

impl MetaInfo {
    /// Check that a decoded `metainfo.plist` declares UFO format version 3.
    pub fn validate(meta_info: &JsonValue) -> Result<MetaInfo, Error> {
        let found = || match meta_info.get("formatVersion") {
            Some(version) => version.to_string(),
            None => "missing".to_string(),
        };
        match serde_json::from_value::<MetaInfo>(meta_info.clone()) {
            Ok(meta) if meta.format_version == FormatVersion::V3 => Ok(meta),
            Ok(_) | Err(_) => Err(Error::UnsupportedFormatVersion(found())),
        }
    }
}
