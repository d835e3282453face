//! Reading a UFO container, zipped or on disk, into memory.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::font::METAINFO_FILE;
use crate::Error;

/// Every regular file of a container, keyed by its `/`-separated path
/// relative to the container root.
///
/// Paths are normalized on insertion: backslashes become `/` and a leading
/// `./` or `/` is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileMap {
    /// Read every file entry of a zip archive.
    ///
    /// Directory entries are skipped. An unreadable archive is an error.
    pub fn from_zip(bytes: &[u8]) -> Result<Self, Error> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut map = FileMap::default();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            map.insert(entry.name(), data);
        }
        log::debug!("read {} files from zip archive", map.len());
        Ok(map)
    }

    /// Read every regular file below `root`.
    ///
    /// Symbolic links are not followed.
    pub fn from_dir(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let mut map = FileMap::default();

        let mut dir_queue: Vec<PathBuf> = vec![root.to_path_buf()];
        while let Some(dir_path) = dir_queue.pop() {
            let read_error = |source: std::io::Error| Error::ReadFile { path: dir_path.clone(), source };
            for entry in std::fs::read_dir(&dir_path).map_err(read_error)? {
                let entry = entry.map_err(read_error)?;
                let path = entry.path();
                let file_type = entry
                    .file_type() // does not traverse symlinks
                    .map_err(|source| Error::ReadFile { path: path.clone(), source })?;

                if file_type.is_dir() {
                    dir_queue.push(path);
                } else if file_type.is_file() {
                    let data = std::fs::read(&path)
                        .map_err(|source| Error::ReadFile { path: path.clone(), source })?;
                    // read_dir only yields paths below root
                    if let Ok(rel_path) = path.strip_prefix(root) {
                        let key: Vec<_> = rel_path
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy())
                            .collect();
                        map.insert(&key.join("/"), data);
                    }
                }
            }
        }
        log::debug!("read {} files from {}", map.len(), root.display());
        Ok(map)
    }

    /// Add a file, replacing any file at the same normalized path.
    pub fn insert(&mut self, path: &str, data: Vec<u8>) {
        let mut path = path.replace('\\', "/");
        while let Some(rest) = path.strip_prefix("./").or_else(|| path.strip_prefix('/')) {
            path = rest.to_string();
        }
        self.files.insert(path, data);
    }

    /// The contents of the file at `path`, if present.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// All paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// The number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if there are no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Locate the font root: the directory prefix of the shallowest
    /// `metainfo.plist`.
    ///
    /// The returned prefix is empty or ends with `/`. Resource-fork entries
    /// (`__MACOSX/`, `._*`) are never considered.
    pub fn font_root(&self) -> Result<String, Error> {
        let root = self
            .paths()
            .filter(|path| !is_resource_fork(path))
            .filter_map(|path| {
                if path == METAINFO_FILE {
                    Some("")
                } else {
                    path.strip_suffix(METAINFO_FILE).filter(|prefix| prefix.ends_with('/'))
                }
            })
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(str::to_string)
            .ok_or(Error::InvalidArchive)?;
        log::debug!("font root is '{root}'");
        Ok(root)
    }
}

fn is_resource_fork(path: &str) -> bool {
    path.contains("__MACOSX") || path.starts_with("._") || path.contains("/._")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    fn map(paths: &[&str]) -> FileMap {
        let mut map = FileMap::default();
        for path in paths {
            map.insert(path, Vec::new());
        }
        map
    }

    #[test]
    fn root_at_top_level() {
        let files = map(&["metainfo.plist", "fontinfo.plist"]);
        assert_eq!(files.font_root().unwrap(), "");
    }

    #[test]
    fn shortest_root_wins() {
        let files = map(&[
            "Test.ufo/sub/Other.ufo/metainfo.plist",
            "Test.ufo/metainfo.plist",
            "Test.ufo/glyphs/a.glif",
        ]);
        assert_eq!(files.font_root().unwrap(), "Test.ufo/");
    }

    #[test]
    fn resource_forks_are_ignored() {
        let files = map(&["__MACOSX/Test.ufo/metainfo.plist", "__MACOSX/metainfo.plist"]);
        assert!(matches!(files.font_root(), Err(Error::InvalidArchive)));

        let files = map(&["Test.ufo/._metainfo.plist", "Deep/Test.ufo/metainfo.plist"]);
        assert_eq!(files.font_root().unwrap(), "Deep/Test.ufo/");
    }

    #[test]
    fn similar_names_are_not_metainfo() {
        let files = map(&["Test.ufo/oldmetainfo.plist"]);
        assert!(matches!(files.font_root(), Err(Error::InvalidArchive)));
    }

    #[test]
    fn paths_are_normalized() {
        let files = map(&["./Test.ufo\\glyphs\\a.glif", "/b.txt"]);
        let paths: Vec<_> = files.paths().collect();
        assert_eq!(paths, vec!["Test.ufo/glyphs/a.glif", "b.txt"]);
    }

    #[test]
    fn zip_entries() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.add_directory("Test.ufo/", options).unwrap();
        zip.start_file("Test.ufo/metainfo.plist", options).unwrap();
        zip.write_all(b"<plist/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let files = FileMap::from_zip(&bytes).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("Test.ufo/metainfo.plist"), Some(&b"<plist/>"[..]));
    }

    #[test]
    fn not_a_zip() {
        assert!(matches!(FileMap::from_zip(b"definitely not a zip"), Err(Error::Zip(_))));
    }
}
