use byteorder::{WriteBytesExt, LE};
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use walkdir::WalkDir;

use crate::error::{Result, VpkError};

pub const VPK_SIGNATURE: u32 = 0x55AA_1234;
pub const VPK_VERSION: u32 = 2;
pub const HEADER_SIZE: usize = 28;

/// Archive index meaning "stored in the directory file itself".
pub const DIR_ARCHIVE_INDEX: u16 = 0x7FFF;

const ENTRY_TERMINATOR: u16 = 0xFFFF;

/// Stands in for a missing directory or extension in the tree.
const EMPTY_COMPONENT: &str = " ";

/// Tree position of a file. Ordering groups entries by extension, then
/// directory, which is the nesting the tree is written in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct EntryKey {
    extension: String,
    directory: String,
    name: String,
}

impl EntryKey {
    fn from_path(path: &str) -> Result<Self> {
        let normalized = path.replace('\\', "/");
        let invalid = normalized.is_empty()
            || normalized.starts_with('/')
            || normalized.contains('\0')
            || normalized
                .split('/')
                .any(|component| component.is_empty() || component == "." || component == "..");
        if invalid {
            return Err(VpkError::InvalidPath(path.to_string()));
        }

        let (directory, file) = normalized
            .rsplit_once('/')
            .unwrap_or((EMPTY_COMPONENT, normalized.as_str()));
        let (name, extension) = match file.rsplit_once('.') {
            Some((name, extension)) if !name.is_empty() && !extension.is_empty() => {
                (name, extension)
            }
            _ => (file, EMPTY_COMPONENT),
        };

        Ok(Self {
            extension: extension.to_string(),
            directory: directory.to_string(),
            name: name.to_string(),
        })
    }
}

/// Collects files and writes them as a single `_dir` VPK with all data
/// stored inline after the directory tree.
#[derive(Debug, Clone, Default)]
pub struct VpkBuilder {
    entries: BTreeMap<EntryKey, Vec<u8>>,
}

impl VpkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file under a relative, `/`-separated path.
    pub fn add_file(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        let key = EntryKey::from_path(path)?;
        if self.entries.contains_key(&key) {
            return Err(VpkError::DuplicateEntry(path.to_string()));
        }
        self.entries.insert(key, data);
        Ok(())
    }

    pub fn with_file(mut self, path: &str, data: Vec<u8>) -> Result<Self> {
        self.add_file(path, data)?;
        Ok(self)
    }

    /// Add every file below `root`, keyed by its path relative to `root`.
    pub fn from_directory(root: impl AsRef<Utf8Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(VpkError::NotADirectory(root.to_path_buf()));
        }

        let mut builder = Self::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .ok()
                .and_then(|path| path.to_str())
                .ok_or_else(|| VpkError::InvalidPath(entry.path().display().to_string()))?;
            builder.add_file(relative, fs::read(entry.path())?)?;
        }

        tracing::debug!(%root, files = builder.len(), "collected vpk entries");
        Ok(builder)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the archive to the given writer.
    pub fn build_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let (tree, data_size) = self.write_tree()?;
        let tree_size = u32::try_from(tree.len()).map_err(|_| VpkError::TooLarge)?;

        let mut writer = BufWriter::new(writer);
        Self::write_header(&mut writer, tree_size, data_size)?;
        writer.write_all(&tree)?;
        for data in self.entries.values() {
            writer.write_all(data)?;
        }
        writer.flush()?;

        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Utf8Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        self.build_to_writer(&mut file)?;
        tracing::info!(%path, files = self.len(), "wrote vpk");
        Ok(())
    }

    fn write_header<W: io::Write>(writer: &mut W, tree_size: u32, data_size: u32) -> io::Result<()> {
        writer.write_u32::<LE>(VPK_SIGNATURE)?;
        writer.write_u32::<LE>(VPK_VERSION)?;
        writer.write_u32::<LE>(tree_size)?;
        writer.write_u32::<LE>(data_size)?;

        // Archive MD5, other MD5 and signature sections are left empty
        writer.write_u32::<LE>(0)?;
        writer.write_u32::<LE>(0)?;
        writer.write_u32::<LE>(0)?;
        Ok(())
    }

    /// Serialize the directory tree, returning it with the total data size.
    fn write_tree(&self) -> Result<(Vec<u8>, u32)> {
        let mut tree = Vec::new();
        let mut offset = 0u32;
        let mut current_extension: Option<&str> = None;
        let mut current_directory: Option<&str> = None;

        for (key, data) in &self.entries {
            if current_extension != Some(key.extension.as_str()) {
                if current_extension.is_some() {
                    tree.write_u8(0)?; // end of files
                    tree.write_u8(0)?; // end of directories
                }
                write_cstr(&mut tree, &key.extension)?;
                current_extension = Some(key.extension.as_str());
                current_directory = None;
            }
            if current_directory != Some(key.directory.as_str()) {
                if current_directory.is_some() {
                    tree.write_u8(0)?;
                }
                write_cstr(&mut tree, &key.directory)?;
                current_directory = Some(key.directory.as_str());
            }

            let length = u32::try_from(data.len()).map_err(|_| VpkError::TooLarge)?;
            write_cstr(&mut tree, &key.name)?;
            tree.write_u32::<LE>(crc32fast::hash(data))?;
            tree.write_u16::<LE>(0)?; // preload bytes
            tree.write_u16::<LE>(DIR_ARCHIVE_INDEX)?;
            tree.write_u32::<LE>(offset)?;
            tree.write_u32::<LE>(length)?;
            tree.write_u16::<LE>(ENTRY_TERMINATOR)?;

            offset = offset.checked_add(length).ok_or(VpkError::TooLarge)?;
        }

        if current_extension.is_some() {
            tree.write_u8(0)?;
            tree.write_u8(0)?;
        }
        tree.write_u8(0)?; // end of extensions

        Ok((tree, offset))
    }
}

fn write_cstr<W: io::Write>(writer: &mut W, s: &str) -> io::Result<()> {
    writer.write_all(s.as_bytes())?;
    writer.write_u8(0)
}
