//! Directory-backed library table used by the CLI.
//!
//! ```text
//! root/
//!   Resistors/          <- library "Resistors"
//!     R_0603.toml       <- part "R_0603"
//!     R_0805.toml
//!   Connectors/
//!     ...
//! ```
//!
//! A part file holds `description`, `keywords` and `pads` (pad names; an empty name is an
//! unnumbered pad and is not counted).

use anyhow::{Context, Result};
use log::warn;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::error::{LoadError, LoadResult};
use crate::table::LibraryTable;
use crate::types::{LibraryId, PartName, PartRecord};
use crate::utils::config::PART_FILE_EXTENSION;

#[derive(Debug, Default, Deserialize)]
struct PartFile {
    #[serde(default)]
    description: String,
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    pads: Vec<String>,
}

impl From<PartFile> for PartRecord {
    fn from(f: PartFile) -> Self {
        let numbered: Vec<&str> = f
            .pads
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        let unique: BTreeSet<&str> = numbered.iter().copied().collect();
        PartRecord {
            description: f.description,
            keywords: f.keywords,
            pad_count: numbered.len() as u32,
            unique_pad_count: unique.len() as u32,
        }
    }
}

/// Every non-hidden sub-directory of `root` is a library; every `*.toml` inside is a part.
pub struct DirLibraryTable {
    root: PathBuf,
    /// Part files per library, filled by `warm`.
    listings: Mutex<HashMap<LibraryId, Vec<PathBuf>>>,
}

impl DirLibraryTable {
    pub fn open(root: &Path) -> Result<Self> {
        let root = root.canonicalize().context("canonicalize library root")?;
        if !root.is_dir() {
            anyhow::bail!("library root is not a directory: {}", root.display());
        }
        Ok(Self {
            root,
            listings: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lib_dir(&self, lib: &str) -> PathBuf {
        self.root.join(lib)
    }

    /// Sorted part files of `lib`, read from disk.
    fn list_part_files(&self, lib: &str) -> LoadResult<Vec<PathBuf>> {
        let dir = self.lib_dir(lib);
        if !dir.is_dir() {
            return Err(LoadError::lookup(lib, "library directory not found"));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LoadError::lookup(lib, e))?;
            if entry.file_type().is_file() && is_part_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Hash of one library's directory state: nickname, dir mtime, then each part file's
    /// name, mtime and size.
    fn library_digest(&self, lib: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(lib.as_bytes());
        let dir = self.lib_dir(lib);
        match std::fs::metadata(&dir) {
            Ok(meta) => {
                hasher.update(&mtime_ns(&meta).to_le_bytes());
                for path in self.list_part_files(lib).unwrap_or_default() {
                    if let Some(name) = path.file_name() {
                        hasher.update(name.as_encoded_bytes());
                    }
                    if let Ok(meta) = std::fs::metadata(&path) {
                        hasher.update(&mtime_ns(&meta).to_le_bytes());
                        hasher.update(&meta.len().to_le_bytes());
                    }
                }
            }
            Err(_) => {
                hasher.update(b"<missing>");
            }
        }
        *hasher.finalize().as_bytes()
    }
}

fn is_part_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PART_FILE_EXTENSION)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn mtime_ns(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

impl LibraryTable for DirLibraryTable {
    fn enumerate_library_ids(&self) -> Vec<LibraryId> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(e) if e.file_type().is_dir() => {
                    if let Some(name) = e.file_name().to_str()
                        && !is_hidden(name)
                    {
                        ids.push(name.to_string());
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry in library root: {}", e),
            }
        }
        ids
    }

    fn warm(&self, lib: &str) -> LoadResult<()> {
        let files = self.list_part_files(lib)?;
        self.listings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lib.to_string(), files);
        Ok(())
    }

    fn enumerate_parts(&self, lib: &str) -> LoadResult<Vec<PartName>> {
        let cached = self
            .listings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lib)
            .cloned();
        let files = match cached {
            Some(files) => files,
            None => self.list_part_files(lib)?,
        };
        Ok(files
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
            .map(str::to_string)
            .collect())
    }

    fn lookup_part(&self, lib: &str, name: &str) -> LoadResult<PartRecord> {
        let path = self
            .lib_dir(lib)
            .join(format!("{name}.{PART_FILE_EXTENSION}"));
        let text = std::fs::read_to_string(&path)
            .map_err(|e| LoadError::lookup(lib, format!("{}: {}", name, e)))?;
        let file: PartFile =
            toml::from_str(&text).map_err(|e| LoadError::format(lib, format!("{}: {}", name, e)))?;
        Ok(file.into())
    }

    fn freshness_signature(&self, lib: Option<&str>) -> i64 {
        let libs = match lib {
            Some(l) => vec![l.to_string()],
            None => self.enumerate_library_ids(),
        };
        let digests: Vec<[u8; 32]> = libs.par_iter().map(|l| self.library_digest(l)).collect();
        let mut hasher = blake3::Hasher::new();
        for d in &digests {
            hasher.update(d);
        }
        let bytes = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&bytes.as_bytes()[..8]);
        match i64::from_le_bytes(head) {
            0 => 1,
            sig => sig,
        }
    }
}
