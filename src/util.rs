//! Common utilities.
//!
//! The glyph file naming follows the "user name to file name" convention
//! from the UFO3 spec:
//! <https://unifiedfontobject.org/versions/ufo3/conventions/#usernametofilename>

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// The extension of every glyph file.
pub const GLIF_SUFFIX: &str = ".glif";
/// The longest file name, in characters, including the suffix.
pub const MAX_FILE_NAME_LEN: usize = 255;
/// The longest file stem before the suffix is added.
pub const MAX_STEM_LEN: usize = MAX_FILE_NAME_LEN - GLIF_SUFFIX.len();
/// Width of the zero-padded counter appended on a name clash.
pub const CLASH_COUNTER_WIDTH: usize = 15;
/// The longest stem kept when a clash counter has to be appended.
pub const MAX_CLASH_STEM_LEN: usize = MAX_STEM_LEN - CLASH_COUNTER_WIDTH;
/// Exclusive upper bound of the clash counter.
pub const MAX_CLASH_COUNTER: u64 = 1_000_000_000_000_000;

static SPECIAL_ILLEGAL: &[char] = &['"', '*', '+', '/', ':', '<', '>', '?', '[', '\\', ']', '|'];

// Device names that Windows refuses as file names, with or without extension.
static RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "clock$", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Tracks the glyph file names handed out during one export.
///
/// Names are compared case-insensitively, so two glyphs can never end up in
/// files that collide on a case-insensitive file system.
#[derive(Debug, Clone, Default)]
pub struct GlyphFileNames {
    existing: HashSet<String>,
}

impl GlyphFileNames {
    /// Compute a file name for `glyph_name` and reserve it.
    pub fn assign(&mut self, glyph_name: &str) -> String {
        let file_name = user_name_to_file_name(glyph_name, &self.existing);
        self.existing.insert(file_name.to_lowercase());
        file_name
    }

    /// The number of file names handed out so far.
    pub fn len(&self) -> usize {
        self.existing.len()
    }

    /// Returns `true` if no file name was handed out yet.
    pub fn is_empty(&self) -> bool {
        self.existing.is_empty()
    }
}

/// Given a glyph name, compute an appropriate file name, including the
/// `.glif` suffix.
///
/// `existing` holds the lower-cased file names already in use; the result is
/// guaranteed not to be one of them. The caller is responsible for adding the
/// result to `existing`.
pub fn user_name_to_file_name(name: &str, existing: &HashSet<String>) -> String {
    let stem = escape_stem(name);
    let stem = truncate_chars(&stem, MAX_STEM_LEN);

    let candidate = format!("{stem}{GLIF_SUFFIX}");
    if !existing.contains(&candidate.to_lowercase()) {
        return candidate;
    }

    let prefix = truncate_chars(stem, MAX_CLASH_STEM_LEN);
    for counter in 1..MAX_CLASH_COUNTER {
        let candidate = format!("{prefix}{counter:0width$}{GLIF_SUFFIX}", width = CLASH_COUNTER_WIDTH);
        if !existing.contains(&candidate.to_lowercase()) {
            return candidate;
        }
    }

    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    log::warn!("file name counter exhausted for glyph '{name}', using a timestamp");
    format!("{prefix}_{millis}{GLIF_SUFFIX}")
}

fn escape_stem(name: &str) -> String {
    let mut result = String::with_capacity(name.len() * 2);
    for c in name.chars() {
        match c {
            c if (c as u32) < 32 || (c as u32) == 0x7f || SPECIAL_ILLEGAL.contains(&c) => {
                result.push('_')
            }
            c if c.is_uppercase() => {
                result.push(c);
                result.push('_');
            }
            c => result.push(c),
        }
    }

    if result.starts_with('.') {
        result.replace_range(..1, "_");
    }

    let parts: Vec<_> = result
        .split('.')
        .map(|part| {
            if RESERVED_NAMES.contains(&part.to_lowercase().as_str()) {
                format!("_{part}")
            } else {
                part.to_string()
            }
        })
        .collect();
    parts.join(".")
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
