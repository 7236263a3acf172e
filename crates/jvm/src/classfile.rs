use crate::archive::ArchiveError;
use brokerpad_plugin::ClassSummary;
use ristretto_classfile::{ClassAccessFlags, ClassFile, Constant, ConstantPool};
use std::io::Cursor;

/// Parse the header of a class file into a [`ClassSummary`].
///
/// Only the constant pool, access flags and the class/super/interface
/// references are consulted; members are ignored.
pub fn read_summary(bytes: Vec<u8>) -> Result<ClassSummary, ArchiveError> {
    let class = ClassFile::from_bytes(&mut Cursor::new(bytes))
        .map_err(|e| ArchiveError::ClassFormat(format!("{e:?}")))?;
    let pool = &class.constant_pool;

    let name = class_name_at(pool, class.this_class)?;
    let super_name = match class.super_class {
        0 => None,
        index => Some(class_name_at(pool, index)?),
    };
    let interfaces = class
        .interfaces
        .iter()
        .map(|index| class_name_at(pool, *index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassSummary {
        name,
        super_name,
        interfaces,
        is_public: class.access_flags.contains(ClassAccessFlags::PUBLIC),
        is_interface: class.access_flags.contains(ClassAccessFlags::INTERFACE),
        is_abstract: class.access_flags.contains(ClassAccessFlags::ABSTRACT),
    })
}

fn class_name_at(pool: &ConstantPool, index: u16) -> Result<String, ArchiveError> {
    match pool.get(index) {
        Some(Constant::Class(name_index)) => pool
            .try_get_utf8(*name_index)
            .map(|internal| internal.replace('/', "."))
            .map_err(|e| ArchiveError::ClassFormat(format!("{e:?}"))),
        _ => Err(ArchiveError::ClassFormat(format!(
            "constant #{index} is not a class reference"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ClassKind, class_bytes};

    #[test]
    fn test_read_summary_of_class() {
        let bytes = class_bytes(
            "com/example/Order",
            Some("com/example/Base"),
            &["java/io/Serializable"],
            ClassKind::Class,
        );

        let summary = read_summary(bytes).unwrap();
        assert_eq!(summary.name, "com.example.Order");
        assert_eq!(summary.super_name.as_deref(), Some("com.example.Base"));
        assert_eq!(summary.interfaces, vec!["java.io.Serializable".to_string()]);
        assert!(summary.is_public);
        assert!(summary.is_concrete());
    }

    #[test]
    fn test_read_summary_of_interface() {
        let bytes = class_bytes("com/example/Api", None, &[], ClassKind::Interface);

        let summary = read_summary(bytes).unwrap();
        assert!(summary.is_interface);
        assert!(!summary.is_concrete());
    }

    #[test]
    fn test_garbage_is_class_format_error() {
        let result = read_summary(vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00]);
        assert!(matches!(result, Err(ArchiveError::ClassFormat(_))));
    }
}
