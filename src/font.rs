//! Importing UFO3 fonts.

use std::path::Path;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use serde_json::Value as JsonValue;

use crate::container::FileMap;
use crate::error::ErrorKind;
use crate::features::Features;
use crate::glyph::Glyph;
use crate::json;
use crate::plist_codec;
use crate::project::{default_layer_config, MetaInfo, Project, DEFAULT_TITLE};
use crate::write::{self, WriteOptions};
use crate::Error;

pub(crate) static METAINFO_FILE: &str = "metainfo.plist";
pub(crate) static FONTINFO_FILE: &str = "fontinfo.plist";
pub(crate) static LIB_FILE: &str = "lib.plist";
pub(crate) static GROUPS_FILE: &str = "groups.plist";
pub(crate) static KERNING_FILE: &str = "kerning.plist";
pub(crate) static FEATURES_FILE: &str = "features.fea";
pub(crate) static LAYER_CONTENTS_FILE: &str = "layercontents.plist";
pub(crate) static CONTENTS_FILE: &str = "contents.plist";
pub(crate) static DEFAULT_LAYER_NAME: &str = "public.default";
pub(crate) static DEFAULT_GLYPHS_DIRNAME: &str = "glyphs";

/// Options for importing a font.
///
/// ```
/// # use ufo_codec::ImportOptions;
/// let options = ImportOptions::new(42).title("My Font");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub(crate) owner_id: i64,
    pub(crate) title: Option<String>,
}

impl ImportOptions {
    /// Options for a project owned by `owner_id`.
    pub fn new(owner_id: i64) -> Self {
        ImportOptions { owner_id, title: None }
    }

    /// Builder-style method to set the project title.
    ///
    /// An explicit title always wins over the one derived from the font info.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A font: the [`Project`] record and its glyphs, in glyph order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    /// Font-level data.
    pub project: Project,
    /// The glyphs of the default layer.
    pub glyphs: Vec<Glyph>,
}

impl Font {
    /// Import a font from the bytes of a zipped UFO.
    pub fn load_zip(bytes: &[u8], options: &ImportOptions) -> Result<Font, Error> {
        Font::from_files(&FileMap::from_zip(bytes)?, options)
    }

    /// Import a font from a directory containing a UFO.
    ///
    /// The directory may be the `.ufo` itself or any directory above it.
    pub fn load_dir(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Font, Error> {
        Font::from_files(&FileMap::from_dir(path)?, options)
    }

    /// Import a font from a container already read into memory.
    ///
    /// Only a missing `metainfo.plist` or a format version other than 3 make
    /// the import fail. Unreadable plists are treated as empty and unreadable
    /// glyphs are skipped.
    pub fn from_files(files: &FileMap, options: &ImportOptions) -> Result<Font, Error> {
        let root = files.font_root()?;
        let file = |name: &str| files.get(&format!("{root}{name}"));

        let meta_info = decode_plist(file(METAINFO_FILE));
        MetaInfo::validate(&meta_info)?;

        let mut project = Project {
            title: String::new(),
            owner_id: options.owner_id,
            meta_info,
            font_info: decode_plist(file(FONTINFO_FILE)),
            groups: decode_plist(file(GROUPS_FILE)),
            kerning: decode_plist(file(KERNING_FILE)),
            features: file(FEATURES_FILE)
                .map(|bytes| Features::parse(&String::from_utf8_lossy(bytes)))
                .unwrap_or_default(),
            layer_config: match file(LAYER_CONTENTS_FILE) {
                Some(bytes) => json::plist_to_json(&plist_codec::decode_or_empty(bytes)),
                None => default_layer_config(),
            },
            lib: decode_plist(file(LIB_FILE)),
        };
        project.title = match &options.title {
            Some(title) => title.clone(),
            None => project.title_from_font_info().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        };

        let glyphs = load_glyphs(files, &root, project.units_per_em());
        log::debug!("imported '{}' with {} glyphs", project.title, glyphs.len());
        Ok(Font { project, glyphs })
    }

    /// Export this font as a zipped UFO.
    pub fn to_zip(&self, options: &WriteOptions) -> Result<Vec<u8>, Error> {
        write::export_zip(&self.project, &self.glyphs, options)
    }

    /// Export this font as a `.ufo` directory at `path`.
    pub fn save(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<(), Error> {
        write::save_dir(path, &self.project, &self.glyphs, options)
    }
}

// A missing plist decodes to an empty object, like a broken one.
fn decode_plist(bytes: Option<&[u8]>) -> JsonValue {
    match bytes {
        Some(bytes) => json::plist_to_json(&plist_codec::decode_or_empty(bytes)),
        None => JsonValue::Object(Default::default()),
    }
}

/// One glyph to decode: the name from `contents.plist` if known, and the
/// path of its file.
struct GlyphJob<'a> {
    name: Option<&'a str>,
    path: String,
    data: &'a [u8],
}

fn load_glyphs(files: &FileMap, root: &str, units_per_em: i32) -> Vec<Glyph> {
    let glyphs_dir = format!("{root}{DEFAULT_GLYPHS_DIRNAME}/");
    let contents = files
        .get(&format!("{glyphs_dir}{CONTENTS_FILE}"))
        .and_then(|bytes| match plist_codec::decode(bytes) {
            Ok(plist::Value::Dictionary(dict)) => Some(dict),
            Ok(_) => {
                log::warn!("{CONTENTS_FILE} is not a dictionary, scanning for glyph files");
                None
            }
            Err(e) => {
                log::warn!("failed to read {CONTENTS_FILE} ({e}), scanning for glyph files");
                None
            }
        });
    let ordered = contents.is_some();

    let jobs: Vec<GlyphJob> = match &contents {
        Some(contents) => contents
            .iter()
            .filter_map(|(name, file_name)| {
                let Some(file_name) = file_name.as_string() else {
                    log::warn!("{CONTENTS_FILE} entry for '{name}' is not a string");
                    return None;
                };
                let path = format!("{glyphs_dir}{file_name}");
                match files.get(&path) {
                    Some(data) => Some(GlyphJob { name: Some(name.as_str()), path, data }),
                    None => {
                        log::warn!("glyph file '{path}' for '{name}' is missing");
                        None
                    }
                }
            })
            .collect(),
        None => files
            .paths()
            .filter(|path| path.starts_with(&glyphs_dir) && path.ends_with(".glif"))
            .filter_map(|path| {
                files.get(path).map(|data| GlyphJob { name: None, path: path.to_string(), data })
            })
            .collect(),
    };

    #[cfg(feature = "rayon")]
    let iter = jobs.par_iter();
    #[cfg(not(feature = "rayon"))]
    let iter = jobs.iter();

    let decoded: Vec<Option<Glyph>> = iter.map(|job| load_glyph(job, units_per_em)).collect();

    let mut glyphs: Vec<Glyph> = decoded.into_iter().flatten().collect();
    if ordered {
        for (i, glyph) in glyphs.iter_mut().enumerate() {
            glyph.sort_order = Some(i as u32);
        }
    }
    glyphs
}

fn load_glyph(job: &GlyphJob, units_per_em: i32) -> Option<Glyph> {
    let mut glyph = match Glyph::parse_glif(job.data, units_per_em) {
        Ok(glyph) => glyph,
        Err(e) => {
            log::warn!("skipping glyph file '{}': {e}", job.path);
            return None;
        }
    };
    if glyph.glyph_name.is_empty() {
        match job.name {
            Some(name) => glyph.glyph_name = name.to_string(),
            None => {
                log::warn!("skipping glyph file '{}': {}", job.path, ErrorKind::MissingGlyphName);
                return None;
            }
        }
    }
    glyph.layer_name = DEFAULT_LAYER_NAME.to_string();
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    static META: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>creator</key>
    <string>com.example</string>
    <key>formatVersion</key>
    <integer>3</integer>
</dict>
</plist>
"#;

    fn glif(name: &str) -> Vec<u8> {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><glyph name="{name}" format="2"><outline/></glyph>"#)
            .into_bytes()
    }

    fn contents(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut out = String::from("<plist version=\"1.0\"><dict>");
        for (name, file) in pairs {
            out.push_str(&format!("<key>{name}</key><string>{file}</string>"));
        }
        out.push_str("</dict></plist>");
        out.into_bytes()
    }

    #[test]
    fn glyph_order_from_contents() {
        let mut files = FileMap::default();
        files.insert("Font.ufo/metainfo.plist", META.into());
        files.insert("Font.ufo/glyphs/contents.plist", contents(&[("b", "b.glif"), ("a", "a.glif")]));
        files.insert("Font.ufo/glyphs/a.glif", glif("a"));
        files.insert("Font.ufo/glyphs/b.glif", glif("b"));

        let font = Font::from_files(&files, &ImportOptions::new(7)).unwrap();
        let order: Vec<_> =
            font.glyphs.iter().map(|g| (g.glyph_name.as_str(), g.sort_order)).collect();
        assert_eq!(order, vec![("b", Some(0)), ("a", Some(1))]);
        assert_eq!(font.project.owner_id, 7);
        assert_eq!(font.project.title, "Imported Project");
    }

    #[test]
    fn missing_and_broken_glyphs_are_skipped() {
        let mut files = FileMap::default();
        files.insert("metainfo.plist", META.into());
        files.insert(
            "glyphs/contents.plist",
            contents(&[("a", "a.glif"), ("gone", "gone.glif"), ("bad", "bad.glif"), ("c", "c.glif")]),
        );
        files.insert("glyphs/a.glif", glif("a"));
        files.insert("glyphs/bad.glif", b"<glyph name=\"bad\"><outline><contour>".to_vec());
        files.insert("glyphs/c.glif", glif("c"));

        let font = Font::from_files(&files, &ImportOptions::default()).unwrap();
        let order: Vec<_> =
            font.glyphs.iter().map(|g| (g.glyph_name.as_str(), g.sort_order)).collect();
        assert_eq!(order, vec![("a", Some(0)), ("c", Some(1))]);
    }

    #[test]
    fn nameless_glyph_takes_contents_key() {
        let mut files = FileMap::default();
        files.insert("metainfo.plist", META.into());
        files.insert("glyphs/contents.plist", contents(&[("space", "space.glif")]));
        files.insert("glyphs/space.glif", b"<glyph format=\"2\"><advance width=\"250\"/></glyph>".to_vec());

        let font = Font::from_files(&files, &ImportOptions::default()).unwrap();
        assert_eq!(font.glyphs[0].glyph_name, "space");
        assert_eq!(font.glyphs[0].advance_width, 250);
        assert_eq!(font.glyphs[0].advance_height, 1000);
    }

    #[test]
    fn broken_plists_degrade() {
        let mut files = FileMap::default();
        files.insert("metainfo.plist", META.into());
        files.insert("fontinfo.plist", b"<plist><dict><key>unitsPerEm".to_vec());

        let font = Font::from_files(&files, &ImportOptions::default()).unwrap();
        assert_eq!(font.project.font_info, json!({}));
        assert_eq!(font.project.groups, json!({}));
        assert_eq!(font.project.layer_config, default_layer_config());
        assert!(font.project.features.is_empty());
        assert!(font.glyphs.is_empty());
    }

    #[test]
    fn wrong_format_version() {
        let mut files = FileMap::default();
        files.insert("metainfo.plist", META.replace("<integer>3</integer>", "<integer>2</integer>").into());
        let err = Font::from_files(&files, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormatVersion(ref v) if v == "2"));
    }
}
