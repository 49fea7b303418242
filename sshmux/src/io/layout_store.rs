//! Layout files on disk: one `<name>.layout` file per layout.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::layout::{
    LAYOUT_EXTENSION, WindowSpec, encode_record, parse_layout, validate_layout_name,
};
use crate::error::Error;

/// Directory of layout files.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    dir: PathBuf,
}

impl LayoutStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_layout_name(name)?;
        Ok(self.dir.join(format!("{name}.{LAYOUT_EXTENSION}")))
    }

    /// Names of all stored layouts. A missing directory is an empty store.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("read {}", self.dir.display()));
            }
        };
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("read {}", self.dir.display()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(LAYOUT_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_layout_name(stem).is_ok()
            {
                names.insert(stem.to_string());
            }
        }
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    /// Append one record, creating the directory and file if needed.
    #[instrument(skip_all, fields(layout = name, target = %spec.target, label = %spec.label))]
    pub fn append(&self, name: &str, spec: &WindowSpec) -> Result<()> {
        spec.validate()?;
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create directory {}", self.dir.display()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(encode_record(spec).as_bytes())
            .with_context(|| format!("append to {}", path.display()))?;
        debug!(path = %path.display(), "record appended");
        Ok(())
    }

    /// All records of `name`, in file order.
    pub fn read_all(&self, name: &str) -> Result<Vec<WindowSpec>> {
        let path = self.path_for(name)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound {
                    name: name.to_string(),
                }
                .into());
            }
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };
        let windows = parse_layout(&path, &contents)?;
        debug!(layout = name, windows = windows.len(), "layout read");
        Ok(windows)
    }

    /// Delete the file for `name`. Missing layouts are not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
        }
    }
}
