//! Code units: jar archives read on demand.
//!
//! A [`CodeUnit`] lazily indexes the class entries of one archive the first
//! time it is asked, then answers membership queries from that index. Loaders
//! share units through `Arc`, so cloning a loader never re-reads archives.

use crate::classfile::read_summary;
use brokerpad_plugin::{ClassSummary, UnitLocation};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("{0} is not a jar archive")]
    NotAnArchive(UnitLocation),
    #[error("malformed class file: {0}")]
    ClassFormat(String),
    #[error("class {name} not present in {location}")]
    MissingClass { name: String, location: UnitLocation },
    #[error("unreadable archive {location}: {reason}")]
    Unreadable {
        location: UnitLocation,
        reason: String,
    },
}

/// One compiled-code archive and its lazily built class index
#[derive(Debug)]
pub struct CodeUnit {
    location: UnitLocation,
    index: OnceLock<Result<Arc<BTreeSet<String>>, String>>,
}

impl CodeUnit {
    pub fn new(location: UnitLocation) -> Self {
        Self {
            location,
            index: OnceLock::new(),
        }
    }

    pub fn location(&self) -> &UnitLocation {
        &self.location
    }

    /// Fully qualified names of every class in the archive.
    ///
    /// A failure to read is remembered: an archive that could not be indexed
    /// once is treated as unreadable for the lifetime of this unit.
    pub fn class_names(&self) -> Result<Arc<BTreeSet<String>>, ArchiveError> {
        self.index
            .get_or_init(|| {
                let result = self.open().and_then(|mut archive| index_classes(&mut archive));
                match result {
                    Ok(names) => {
                        debug!("Indexed {} classes in {}", names.len(), self.location);
                        Ok(Arc::new(names))
                    }
                    Err(e) => Err(e.to_string()),
                }
            })
            .clone()
            .map_err(|reason| ArchiveError::Unreadable {
                location: self.location.clone(),
                reason,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.class_names()
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }

    /// Read the summary of one class held by this unit
    pub fn read_class(&self, name: &str) -> Result<ClassSummary, ArchiveError> {
        let mut archive = self.open()?;
        let entry_name = entry_name_of(name);
        let mut entry = match archive.by_name(&entry_name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ArchiveError::MissingClass {
                    name: name.to_string(),
                    location: self.location.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        read_summary(bytes)
    }

    /// Summaries of every class in the archive, opening it once.
    ///
    /// Individual class files that fail to parse are skipped.
    pub fn summaries(&self) -> Result<Vec<ClassSummary>, ArchiveError> {
        let mut archive = self.open()?;
        let mut summaries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if class_name_of_entry(entry.name()).is_none() {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            match read_summary(bytes) {
                Ok(summary) => summaries.push(summary),
                Err(e) => debug!("Skipping {} in {}: {}", entry.name(), self.location, e),
            }
        }
        Ok(summaries)
    }

    fn open(&self) -> Result<ZipArchive<File>, ArchiveError> {
        let mut file = File::open(self.location.path())?;

        // ZIP magic: PK\x03\x04 or PK\x05\x06 (empty archive)
        let mut magic = [0u8; 4];
        if file.read_exact(&mut magic).is_err() || magic[..2] != [0x50, 0x4B] {
            return Err(ArchiveError::NotAnArchive(self.location.clone()));
        }
        file.seek(SeekFrom::Start(0))?;

        Ok(ZipArchive::new(file)?)
    }
}

fn index_classes(archive: &mut ZipArchive<File>) -> Result<BTreeSet<String>, ArchiveError> {
    let mut names = BTreeSet::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if let Some(name) = class_name_of_entry(entry.name()) {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Map an archive entry to the class it defines, if it defines one
pub fn class_name_of_entry(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(".class")?;
    if stem.starts_with("META-INF/")
        || stem.ends_with("module-info")
        || stem.ends_with("package-info")
    {
        return None;
    }
    Some(stem.replace('/', "."))
}

fn entry_name_of(class_name: &str) -> String {
    class_name.replace('.', "/") + ".class"
}
