//! Splitting `features.fea` into named blocks.
//!
//! This is not a parser for the feature file syntax. Top-level `table`,
//! `feature` and `lookup` blocks, glyph class definitions and
//! `languagesystem` statements are cut out of the text by pattern; bodies are
//! kept verbatim and everything left over is kept as an opaque prefix.
//!
//! Rendering the pieces back produces them in a fixed order, so the original
//! ordering between categories (and any comments or whitespace between
//! blocks) is not preserved.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The passes run by [`Features::parse`], in order.
///
/// Each pass removes what it matched, so a lookup nested in a feature block
/// belongs to that feature and is never reported as a standalone lookup.
pub const EXTRACTION_ORDER: [BlockKind; 5] = [
    BlockKind::Table,
    BlockKind::Feature,
    BlockKind::Lookup,
    BlockKind::Class,
    BlockKind::LanguageSystem,
];

/// The categories of text recognized in a feature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `table TAG { ... } TAG;`
    Table,
    /// `feature TAG { ... } TAG;`
    Feature,
    /// `lookup NAME { ... } NAME;`
    Lookup,
    /// `@NAME = [ ... ];`
    Class,
    /// `languagesystem SCRIPT LANG;`
    LanguageSystem,
}

impl BlockKind {
    fn keyword(self) -> Option<&'static str> {
        match self {
            BlockKind::Table => Some("table"),
            BlockKind::Feature => Some("feature"),
            BlockKind::Lookup => Some("lookup"),
            BlockKind::Class | BlockKind::LanguageSystem => None,
        }
    }
}

/// A block identified by a name: a lookup or a glyph class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBlock {
    /// Lookup name, or class name including its leading `@`.
    pub name: String,
    /// The trimmed body.
    pub code: String,
}

/// A block identified by a tag: a table or a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedBlock {
    /// The table or feature tag.
    pub tag: String,
    /// The trimmed body.
    pub code: String,
}

/// The contents of a `features.fea` file, segmented into blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// `languagesystem` statements, verbatim.
    pub languagesystems: Vec<String>,
    /// Glyph class definitions.
    pub classes: Vec<NamedBlock>,
    /// Lookups defined outside any feature block.
    pub lookups: Vec<NamedBlock>,
    /// Table blocks.
    pub tables: Vec<TaggedBlock>,
    /// Feature blocks, including their nested lookups.
    pub features: Vec<TaggedBlock>,
    /// Text not matched by any pass, trimmed.
    pub prefix: String,
}

impl Features {
    /// Segment feature file text.
    pub fn parse(text: &str) -> Self {
        let mut remaining = text.to_string();
        let mut features = Features::default();

        for kind in EXTRACTION_ORDER {
            match kind {
                BlockKind::Table => {
                    features.tables = extract_blocks(&mut remaining, kind)
                        .into_iter()
                        .map(|(tag, code)| TaggedBlock { tag, code })
                        .collect();
                }
                BlockKind::Feature => {
                    features.features = extract_blocks(&mut remaining, kind)
                        .into_iter()
                        .map(|(tag, code)| TaggedBlock { tag, code })
                        .collect();
                }
                BlockKind::Lookup => {
                    features.lookups = extract_blocks(&mut remaining, kind)
                        .into_iter()
                        .map(|(name, code)| NamedBlock { name, code })
                        .collect();
                }
                BlockKind::Class => features.classes = extract_classes(&mut remaining),
                BlockKind::LanguageSystem => {
                    features.languagesystems = extract_languagesystems(&mut remaining)
                }
            }
        }

        features.prefix = remaining.trim().to_string();
        features
    }

    /// Render the blocks back into feature file text.
    ///
    /// The order is languagesystems, classes, tables, lookups, features and
    /// then the prefix.
    pub fn to_fea(&self) -> String {
        let mut out = String::new();
        for statement in &self.languagesystems {
            out.push_str(statement);
            out.push('\n');
        }
        for class in &self.classes {
            if !class.name.starts_with('@') {
                out.push('@');
            }
            out.push_str(&format!("{} = [{}];\n", class.name, class.code));
        }
        for table in &self.tables {
            push_block(&mut out, "table", &table.tag, &table.code);
        }
        for lookup in &self.lookups {
            push_block(&mut out, "lookup", &lookup.name, &lookup.code);
        }
        for feature in &self.features {
            push_block(&mut out, "feature", &feature.tag, &feature.code);
        }
        if !self.prefix.is_empty() {
            out.push_str(&self.prefix);
            out.push('\n');
        }
        out
    }

    /// Returns `true` if nothing was found at all.
    pub fn is_empty(&self) -> bool {
        self == &Features::default()
    }
}

fn push_block(out: &mut String, keyword: &str, name: &str, code: &str) {
    out.push_str(&format!("{keyword} {name} {{\n{code}\n}} {name};\n"));
}

fn opener(kind: BlockKind) -> Option<&'static Regex> {
    static TABLE: OnceLock<Regex> = OnceLock::new();
    static FEATURE: OnceLock<Regex> = OnceLock::new();
    static LOOKUP: OnceLock<Regex> = OnceLock::new();

    let (cell, keyword) = match kind {
        BlockKind::Table => (&TABLE, "table"),
        BlockKind::Feature => (&FEATURE, "feature"),
        BlockKind::Lookup => (&LOOKUP, "lookup"),
        BlockKind::Class | BlockKind::LanguageSystem => return None,
    };
    cell.get_or_init(|| {
        Regex::new(&format!(r"\b{keyword}\s+([^\s{{}};]+)\s*\{{"))
            .unwrap_or_else(|e| panic!("bad {keyword} pattern: {e}"))
    })
    .into()
}

/// Cut every `KEYWORD NAME { ... } NAME;` block out of `text`.
///
/// The block ends at the brace that balances its opener, provided it is
/// followed by `NAME;`. If braces do not balance, the first `} NAME;` after
/// the opener ends it instead. An opener without a matching close stays in
/// the text.
fn extract_blocks(text: &mut String, kind: BlockKind) -> Vec<(String, String)> {
    let (Some(opener), Some(keyword)) = (opener(kind), kind.keyword()) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut search_from = 0;
    loop {
        let found = opener.captures_at(text, search_from).and_then(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps.get(1)?.as_str().to_string()))
        });
        let Some((start, body_start, name)) = found else {
            break;
        };

        let closing = Regex::new(&format!(r"^\}}\s*{}\s*;", regex::escape(&name)));
        let close = match closing {
            Ok(closing) => {
                let balanced = balanced_close(text, body_start).and_then(|brace| {
                    closing.find(&text[brace..]).map(|m| (brace, brace + m.end()))
                });
                balanced.or_else(|| first_close(text, body_start, &name))
            }
            Err(e) => {
                log::warn!("cannot match the end of {keyword} '{name}': {e}");
                None
            }
        };

        match close {
            Some((close_start, close_end)) => {
                let code = text[body_start..close_start].trim().to_string();
                text.replace_range(start..close_end, "");
                search_from = start;
                blocks.push((name, code));
            }
            None => {
                log::debug!("{keyword} '{name}' is never closed, leaving it in place");
                search_from = body_start;
            }
        }
    }
    blocks
}

/// The byte offset of the `}` closing a block whose body starts at `from`.
///
/// Braces inside `#` comments and quoted strings are not counted.
fn balanced_close(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut in_comment = false;
    let mut in_string = false;
    for (i, c) in text[from..].char_indices() {
        match c {
            '\n' => in_comment = false,
            _ if in_comment => (),
            '"' => in_string = !in_string,
            _ if in_string => (),
            '#' => in_comment = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i);
                }
            }
            _ => (),
        }
    }
    None
}

/// The span of the first `} NAME;` at or after `from`.
fn first_close(text: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let closing = Regex::new(&format!(r"\}}\s*{}\s*;", regex::escape(name))).ok()?;
    closing.find_at(text, from).map(|m| (m.start(), m.end()))
}

fn extract_classes(text: &mut String) -> Vec<NamedBlock> {
    static CLASS: OnceLock<Regex> = OnceLock::new();
    let class = CLASS.get_or_init(|| {
        Regex::new(r"(@[A-Za-z0-9_.\-]+)\s*=\s*\[([^\]]*)\]\s*;")
            .unwrap_or_else(|e| panic!("bad class pattern: {e}"))
    });

    let classes = class
        .captures_iter(text)
        .map(|caps| NamedBlock { name: caps[1].to_string(), code: caps[2].trim().to_string() })
        .collect();
    *text = class.replace_all(text, "").into_owned();
    classes
}

fn extract_languagesystems(text: &mut String) -> Vec<String> {
    static LANGUAGESYSTEM: OnceLock<Regex> = OnceLock::new();
    let statement = LANGUAGESYSTEM.get_or_init(|| {
        Regex::new(r"\blanguagesystem\s+[^\s;]+\s+[^\s;]+\s*;")
            .unwrap_or_else(|e| panic!("bad languagesystem pattern: {e}"))
    });

    let found = statement.find_iter(text).map(|m| m.as_str().to_string()).collect();
    *text = statement.replace_all(text, "").into_owned();
    found
}
