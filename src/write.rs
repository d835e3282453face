//! Customize serialization behaviour, and assemble UFO documents for export.

use std::borrow::Cow;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use indexmap::IndexMap;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use plist::{Dictionary, Value, XmlWriteOptions};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::font::{
    CONTENTS_FILE, DEFAULT_GLYPHS_DIRNAME, DEFAULT_LAYER_NAME, FEATURES_FILE, FONTINFO_FILE,
    GROUPS_FILE, KERNING_FILE, LAYER_CONTENTS_FILE, LIB_FILE, METAINFO_FILE,
};
use crate::glyph::Glyph;
use crate::json;
use crate::plist_codec;
use crate::project::{MetaInfo, Project};
use crate::util::GlyphFileNames;
use crate::Error;

static DOUBLE_QUOTE_DECL: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
static SINGLE_QUOTE_DECL: &[u8] = b"<?xml version='1.0' encoding='UTF-8'?>";

/// Options that can be set when writing UFO documents.
///
/// You construct `WriteOptions` using builder semantics:
///
/// ```
/// # use ufo_codec::{QuoteChar, WriteOptions};
/// let single_tab = WriteOptions::default();
///
/// let two_tabs = WriteOptions::default()
///     .whitespace("\t\t");
///
/// let spaces = WriteOptions::default()
///     .whitespace("  ");
///
/// let spaces_and_singlequotes = WriteOptions::default()
///     .whitespace("  ")
///     .quote_char(QuoteChar::Single);
/// ```
#[derive(Debug, Clone)]
pub struct WriteOptions {
    // quick-xml and plist each want the indentation in their own form
    pub(crate) indent_str: Cow<'static, str>,
    xml_opts: XmlWriteOptions,
    pub(crate) whitespace_char: u8,
    pub(crate) whitespace_count: usize,
    pub(crate) quote_style: QuoteChar,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            indent_str: "\t".into(),
            xml_opts: Default::default(),
            whitespace_char: b'\t',
            whitespace_count: 1,
            quote_style: QuoteChar::Double,
        }
    }
}

impl WriteOptions {
    /// Builder-style method to customize the whitespace.
    ///
    /// By default, we indent with a single tab ("\t").
    ///
    /// The string can contain any number of *a single ASCII character*, but
    /// must not contain multiple different characters. "\t\t" is fine,
    /// "\t  \t" is not. An empty or mixed string leaves the current
    /// indentation unchanged.
    pub fn whitespace(mut self, indent_str: impl Into<Cow<'static, str>>) -> Self {
        let indent_str = indent_str.into();
        let Some(first) = indent_str.bytes().next() else {
            log::warn!("ignoring empty indentation string");
            return self;
        };
        if !indent_str.bytes().all(|c| c == first) {
            log::warn!("ignoring indentation string {indent_str:?} with mixed characters");
            return self;
        }
        self.whitespace_char = first;
        self.whitespace_count = indent_str.len();
        self.xml_opts = XmlWriteOptions::default().indent_string(indent_str.clone());
        self.indent_str = indent_str;
        self
    }

    /// Builder-style method to customize the XML declaration attribute
    /// definition quote char.
    ///
    /// By default, we use double quotes.
    pub fn quote_char(mut self, quote_style: QuoteChar) -> Self {
        self.quote_style = quote_style;
        self
    }

    /// Return a reference to [`XmlWriteOptions`] for use with the `plist` crate.
    pub fn xml_options(&self) -> &XmlWriteOptions {
        &self.xml_opts
    }

    /// Rewrite the XML declaration at the start of `buf` in the requested
    /// quote style. Both declarations have the same length.
    pub(crate) fn apply_quote_style(&self, buf: &mut [u8]) {
        if let QuoteChar::Single = self.quote_style {
            if buf.starts_with(DOUBLE_QUOTE_DECL) {
                buf[..SINGLE_QUOTE_DECL.len()].copy_from_slice(SINGLE_QUOTE_DECL);
            }
        }
    }
}

/// The quote character used to write the XML declaration.
///
/// This is exposed to allow the user to match the output of other tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteChar {
    /// Single quotes: 'UTF-8'.
    Single,
    /// Double quotes: "UTF-8".
    Double,
}

/// Render every document of a UFO3 font, in archive order.
///
/// Paths are relative to the font root. `glyphs/contents.plist` comes last,
/// with its keys in glyph order. A glyph whose name was already seen is
/// skipped.
pub fn export_files(
    project: &Project,
    glyphs: &[Glyph],
    options: &WriteOptions,
) -> Result<Vec<(String, Vec<u8>)>, Error> {
    let mut files = Vec::with_capacity(glyphs.len() + 8);

    files.push((METAINFO_FILE.to_string(), write_serde_plist(&MetaInfo::default(), options)?));
    files.push((FONTINFO_FILE.to_string(), write_json_slot(&project.font_info, options)?));
    files.push((GROUPS_FILE.to_string(), write_json_slot(&project.groups, options)?));
    files.push((KERNING_FILE.to_string(), write_json_slot(&project.kerning, options)?));
    files.push((LIB_FILE.to_string(), write_json_slot(&project.lib, options)?));

    let layer_contents = vec![vec![DEFAULT_LAYER_NAME, DEFAULT_GLYPHS_DIRNAME]];
    files.push((LAYER_CONTENTS_FILE.to_string(), write_serde_plist(&layer_contents, options)?));
    files.push((FEATURES_FILE.to_string(), project.features.to_fea().into_bytes()));

    let mut names = GlyphFileNames::default();
    let mut contents: IndexMap<&str, String> = IndexMap::with_capacity(glyphs.len());
    let mut jobs = Vec::with_capacity(glyphs.len());
    for glyph in glyphs {
        if contents.contains_key(glyph.glyph_name.as_str()) {
            log::warn!("skipping duplicate glyph '{}'", glyph.glyph_name);
            continue;
        }
        let file_name = names.assign(&glyph.glyph_name);
        contents.insert(glyph.glyph_name.as_str(), file_name.clone());
        jobs.push((glyph, file_name));
    }

    #[cfg(feature = "rayon")]
    let iter = jobs.par_iter();
    #[cfg(not(feature = "rayon"))]
    let iter = jobs.iter();

    let encoded = iter
        .map(|(glyph, file_name)| {
            let data = glyph.encode_glif(options)?;
            Ok((format!("{DEFAULT_GLYPHS_DIRNAME}/{file_name}"), data))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    files.extend(encoded);

    files.push((
        format!("{DEFAULT_GLYPHS_DIRNAME}/{CONTENTS_FILE}"),
        write_serde_plist(&contents, options)?,
    ));

    log::debug!("rendered {} documents for {} glyphs", files.len(), jobs.len());
    Ok(files)
}

/// Export a font as a zip archive.
///
/// Every document is rendered before the archive is started, so an encoding
/// failure never leaves a partial archive behind. Entries live under
/// `<sanitized title>.ufo/`.
pub fn export_zip(
    project: &Project,
    glyphs: &[Glyph],
    options: &WriteOptions,
) -> Result<Vec<u8>, Error> {
    let files = export_files(project, glyphs, options)?;
    let root = format!("{}.ufo", sanitize_title(&project.title));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options: FileOptions<()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (path, data) in &files {
        zip.start_file(format!("{root}/{path}"), file_options)?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Export a font as a `.ufo` directory at `path`.
///
/// The directory must not already exist.
pub fn save_dir(
    path: impl AsRef<Path>,
    project: &Project,
    glyphs: &[Glyph],
    options: &WriteOptions,
) -> Result<(), Error> {
    let path = path.as_ref();
    let files = export_files(project, glyphs, options)?;

    fs::create_dir(path)?;
    fs::create_dir(path.join(DEFAULT_GLYPHS_DIRNAME))?;
    for (rel_path, data) in &files {
        fs::write(path.join(rel_path), data)?;
    }
    Ok(())
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

// A JSON slot that is null or not an object is written as an empty dict.
fn write_json_slot(slot: &serde_json::Value, options: &WriteOptions) -> Result<Vec<u8>, Error> {
    let dict = match slot {
        serde_json::Value::Object(map) => json::json_object_to_dictionary(map),
        serde_json::Value::Null => Dictionary::new(),
        _other => {
            log::warn!("expected a JSON object for a plist document, writing an empty dict");
            Dictionary::new()
        }
    };
    plist_codec::encode(&Value::Dictionary(dict), options)
}

fn write_serde_plist(value: &impl serde::Serialize, options: &WriteOptions) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    {
        let writer = plist::stream::XmlWriter::new_with_options(&mut buf, options.xml_options());
        let mut ser = plist::Serializer::new(writer);
        value.serialize(&mut ser)?;
    }
    options.apply_quote_style(&mut buf);
    Ok(buf)
}
