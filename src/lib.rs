//! Converting [Unified Font Object][ufo] fonts to and from a JSON-friendly
//! project model.
//!
//! A UFO3 font, zipped or on disk, is imported as a [`Project`] (the font
//! level plists, kept as JSON trees, plus segmented feature code) and a list
//! of [`Glyph`]s in glyph order. Export renders the same model back into a
//! UFO3 archive.
//!
//! [ufo]: http://unifiedfontobject.org/versions/ufo3
//!
//! # Basic usage:
//!
//! ```no_run
//! use ufo_codec::{Font, ImportOptions, WriteOptions};
//!
//! let bytes = std::fs::read("RoflsSansLight.ufo.zip").expect("failed to read archive");
//! let font = Font::load_zip(&bytes, &ImportOptions::new(1)).expect("failed to load font");
//! let glyph_a = font.glyphs.iter().find(|g| g.glyph_name == "A").expect("missing glyph");
//! assert_eq!(glyph_a.unicodes, vec!["0041".to_string()]);
//!
//! let zipped = font.to_zip(&WriteOptions::default()).expect("failed to export");
//! ```

#![deny(rustdoc::broken_intra_doc_links, unsafe_code)]

pub mod container;
pub mod error;
pub mod features;
mod font;
pub mod glyph;
pub mod json;
pub mod plist_codec;
pub mod project;
pub mod util;
mod write;

pub use container::FileMap;
pub use error::{DocumentError, Error, ErrorKind, GlifWriteError, WriteError};
pub use features::{Features, NamedBlock, TaggedBlock};
pub use font::{Font, ImportOptions};
pub use glyph::{Anchor, Component, Contour, ContourPoint, Glyph, GlyphProperties, Outline, PointType};
pub use project::{FormatVersion, MetaInfo, Project, DEFAULT_UNITS_PER_EM};
pub use util::{user_name_to_file_name, GlyphFileNames};
pub use write::{export_files, export_zip, sanitize_title, save_dir, QuoteChar, WriteOptions};
