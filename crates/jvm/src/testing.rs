//! Fixture writers: minimal class files and jar archives.
//!
//! Class files produced here carry only a constant pool, access flags and
//! the class/super/interface references, which is all the loader reads.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Abstract,
    Interface,
}

impl ClassKind {
    fn access_flags(self) -> u16 {
        match self {
            ClassKind::Class => ACC_PUBLIC | ACC_SUPER,
            ClassKind::Abstract => ACC_PUBLIC | ACC_SUPER | ACC_ABSTRACT,
            ClassKind::Interface => ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
        }
    }
}

/// Encode a class file. Names are internal (`a/b/C`); a missing super class
/// defaults to `java/lang/Object`.
pub fn class_bytes(
    name: &str,
    super_name: Option<&str>,
    interfaces: &[&str],
    kind: ClassKind,
) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    let mut class_ref = |internal: &str| -> u16 {
        let mut utf8 = vec![1u8];
        utf8.extend_from_slice(&(internal.len() as u16).to_be_bytes());
        utf8.extend_from_slice(internal.as_bytes());
        pool.push(utf8);
        let name_index = pool.len() as u16;

        let mut class = vec![7u8];
        class.extend_from_slice(&name_index.to_be_bytes());
        pool.push(class);
        pool.len() as u16
    };

    let this_index = class_ref(name);
    let super_index = class_ref(super_name.unwrap_or("java/lang/Object"));
    let interface_indices: Vec<u16> = interfaces.iter().map(|i| class_ref(i)).collect();

    let mut out = Vec::new();
    out.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&52u16.to_be_bytes());
    out.extend_from_slice(&(pool.len() as u16 + 1).to_be_bytes());
    for constant in &pool {
        out.extend_from_slice(constant);
    }
    out.extend_from_slice(&kind.access_flags().to_be_bytes());
    out.extend_from_slice(&this_index.to_be_bytes());
    out.extend_from_slice(&super_index.to_be_bytes());
    out.extend_from_slice(&(interface_indices.len() as u16).to_be_bytes());
    for index in interface_indices {
        out.extend_from_slice(&index.to_be_bytes());
    }
    // fields, methods, attributes
    out.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    out
}

/// Builds jar archives from dotted class names
#[derive(Debug, Default)]
pub struct JarBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(self, name: &str, super_name: Option<&str>, interfaces: &[&str]) -> Self {
        self.with_kind(name, super_name, interfaces, ClassKind::Class)
    }

    pub fn abstract_class(self, name: &str, super_name: Option<&str>, interfaces: &[&str]) -> Self {
        self.with_kind(name, super_name, interfaces, ClassKind::Abstract)
    }

    pub fn interface(self, name: &str, extends: &[&str]) -> Self {
        self.with_kind(name, None, extends, ClassKind::Interface)
    }

    pub fn resource(mut self, path: &str, bytes: &[u8]) -> Self {
        self.entries.push((path.to_string(), bytes.to_vec()));
        self
    }

    fn with_kind(
        mut self,
        name: &str,
        super_name: Option<&str>,
        interfaces: &[&str],
        kind: ClassKind,
    ) -> Self {
        let internal = |n: &str| n.replace('.', "/");
        let super_internal = super_name.map(internal);
        let interfaces_internal: Vec<String> = interfaces.iter().map(|i| internal(i)).collect();
        let interface_refs: Vec<&str> = interfaces_internal.iter().map(String::as_str).collect();

        let bytes = class_bytes(
            &internal(name),
            super_internal.as_deref(),
            &interface_refs,
            kind,
        );
        self.entries.push((format!("{}.class", internal(name)), bytes));
        self
    }

    pub fn write(self, path: &Path) -> std::io::Result<PathBuf> {
        let file = File::create(path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        for (name, bytes) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        zip.finish()?;
        Ok(path.to_path_buf())
    }
}
