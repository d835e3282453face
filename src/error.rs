//! Error types.

use std::io::Error as IoError;
use std::path::PathBuf;

use plist::Error as PlistError;
use quick_xml::events::attributes::AttrError;
use quick_xml::Error as XmlError;
use thiserror::Error;

/// Errors that abort an import or export.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No `metainfo.plist` was found, so there is no font root.
    #[error("no font root found: the archive does not contain a metainfo.plist")]
    InvalidArchive,
    /// `metainfo.plist` does not declare UFO format version 3.
    #[error("unsupported UFO format version {0}; only version 3 can be imported")]
    UnsupportedFormatVersion(String),
    /// The zip container could not be read or written.
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A file in a source directory could not be read.
    #[error("failed to read '{path}'")]
    ReadFile {
        /// The file or directory that failed.
        path: PathBuf,
        /// The underlying error.
        source: IoError,
    },
    /// An input/output problem while assembling or writing an archive.
    #[error(transparent)]
    Io(#[from] IoError),
    /// A plist document could not be serialized.
    #[error("failed to write plist: {0}")]
    PlistWrite(#[from] PlistError),
    /// A glyph could not be serialized.
    #[error(transparent)]
    GlifWrite(#[from] GlifWriteError),
}

/// A single plist or glif document that could not be decoded.
///
/// Import never surfaces this error: a bad plist degrades to an empty
/// document and a bad glif skips that one glyph.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The XML itself is broken.
    #[error("xml error: {0}")]
    Xml(#[from] XmlError),
    /// An attribute is malformed.
    #[error("xml attribute error: {0}")]
    Attribute(#[from] AttrError),
    /// The XML is well formed but does not describe a valid document.
    #[error("{0}")]
    Parse(ErrorKind),
}

/// The reason a document failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The document ended inside an open element.
    #[error("unexpected end of document")]
    UnexpectedEof,
    /// A plist contains no value element.
    #[error("no plist value found")]
    MissingRoot,
    /// The first element of a glif is not `<glyph>`.
    #[error("wrong first element, expected <glyph>")]
    WrongFirstElement,
    /// The glyph has no name.
    #[error("glyph has no name")]
    MissingGlyphName,
    /// A numeric attribute or element could not be parsed.
    #[error("bad number")]
    BadNumber,
    /// A point is missing a coordinate.
    #[error("bad point definition")]
    BadPoint,
    /// A component is missing its `base` attribute.
    #[error("component has no base glyph")]
    ComponentMissingBase,
    /// A `<data>` element does not contain valid base64.
    #[error("bad base64 data")]
    BadData,
    /// Text content is not valid UTF-8.
    #[error("invalid utf-8")]
    InvalidUtf8,
}

/// An error representing a failure during .glif file serialization.
#[derive(Debug, Error)]
#[error("failed to write glyph '{name}': {inner}")]
pub struct GlifWriteError {
    /// The name of the glyph where the error occured.
    pub name: String,
    /// The actual error.
    #[source]
    pub inner: WriteError,
}

/// The possible inner error types that can occur when attempting to write
/// out a .glif type.
#[derive(Debug, Error)]
pub enum WriteError {
    /// XML serialzation error.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// When writing out the 'lib' section, we use the plist crate to generate
    /// the plist xml, and then strip the preface and closing </plist> tag.
    ///
    /// If for some reason the implementation of that crate changes, we could
    /// be affected, although this is very unlikely.
    #[error("internal error while writing lib data")]
    InternalLibWriteError,
    /// Generic serialization error.
    #[error(transparent)]
    Io(#[from] IoError),
    /// Plist serialization error.
    #[error(transparent)]
    Plist(#[from] PlistError),
}

#[doc(hidden)]
impl From<ErrorKind> for DocumentError {
    fn from(src: ErrorKind) -> DocumentError {
        DocumentError::Parse(src)
    }
}
