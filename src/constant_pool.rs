use crate::error::{ParseError, ParseResult};
use crate::ir::MemberRef;
use crate::reader::ByteReader;

mod tag {
    pub(super) const UTF8: u8 = 1;
    pub(super) const INTEGER: u8 = 3;
    pub(super) const FLOAT: u8 = 4;
    pub(super) const LONG: u8 = 5;
    pub(super) const DOUBLE: u8 = 6;
    pub(super) const CLASS: u8 = 7;
    pub(super) const STRING: u8 = 8;
    pub(super) const FIELD_REF: u8 = 9;
    pub(super) const METHOD_REF: u8 = 10;
    pub(super) const INTERFACE_METHOD_REF: u8 = 11;
    pub(super) const NAME_AND_TYPE: u8 = 12;
    pub(super) const METHOD_HANDLE: u8 = 15;
    pub(super) const METHOD_TYPE: u8 = 16;
    pub(super) const DYNAMIC: u8 = 17;
    pub(super) const INVOKE_DYNAMIC: u8 = 18;
    pub(super) const MODULE: u8 = 19;
    pub(super) const PACKAGE: u8 = 20;
}

/// Method handle reference kinds 1..=4 point at fields, 5..=9 at methods.
const REF_PUT_STATIC: u8 = 4;

/// One decoded constant pool slot.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ConstantPoolEntry {
    /// Index 0 and the slot following a Long or Double.
    Reserved,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
}

impl ConstantPoolEntry {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            ConstantPoolEntry::Reserved => "reserved",
            ConstantPoolEntry::Utf8(_) => "Utf8",
            ConstantPoolEntry::Integer(_) => "Integer",
            ConstantPoolEntry::Float(_) => "Float",
            ConstantPoolEntry::Long(_) => "Long",
            ConstantPoolEntry::Double(_) => "Double",
            ConstantPoolEntry::Class { .. } => "Class",
            ConstantPoolEntry::String { .. } => "String",
            ConstantPoolEntry::FieldRef { .. } => "Fieldref",
            ConstantPoolEntry::MethodRef { .. } => "Methodref",
            ConstantPoolEntry::InterfaceMethodRef { .. } => "InterfaceMethodref",
            ConstantPoolEntry::NameAndType { .. } => "NameAndType",
            ConstantPoolEntry::MethodHandle { .. } => "MethodHandle",
            ConstantPoolEntry::MethodType { .. } => "MethodType",
            ConstantPoolEntry::Dynamic { .. } => "Dynamic",
            ConstantPoolEntry::InvokeDynamic { .. } => "InvokeDynamic",
            ConstantPoolEntry::Module { .. } => "Module",
            ConstantPoolEntry::Package { .. } => "Package",
        }
    }

    fn is_wide(&self) -> bool {
        matches!(self, ConstantPoolEntry::Long(_) | ConstantPoolEntry::Double(_))
    }
}

/// Resolved target of a `MethodHandle` constant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum HandleTarget {
    Field(MemberRef),
    Method(MemberRef),
}

/// Immutable, 1-based constant pool of one class file.
#[derive(Clone, Debug)]
pub(crate) struct ConstantPool {
    entries: Vec<ConstantPoolEntry>,
}

impl ConstantPool {
    /// Decode `count - 1` slots; `count` is the raw `constant_pool_count`.
    pub(crate) fn parse(reader: &mut ByteReader<'_>, count: u16) -> ParseResult<Self> {
        if count == 0 {
            return Err(ParseError::malformed("constant_pool_count must be at least 1"));
        }
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(ConstantPoolEntry::Reserved);

        let mut index = 1u16;
        while index < count {
            let entry = read_entry(reader, index)?;
            let wide = entry.is_wide();
            entries.push(entry);
            if wide {
                if index + 1 >= count {
                    return Err(ParseError::malformed(format!(
                        "two-slot constant at index {index} overruns the pool"
                    )));
                }
                entries.push(ConstantPoolEntry::Reserved);
                index += 1;
            }
            index += 1;
        }

        Ok(Self { entries })
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<ConstantPoolEntry>) -> Self {
        let mut all = vec![ConstantPoolEntry::Reserved];
        all.extend(entries);
        Self { entries: all }
    }

    /// Number of slots including the reserved index 0.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn resolve(&self, index: u16) -> ParseResult<&ConstantPoolEntry> {
        match self.entries.get(index as usize) {
            None | Some(ConstantPoolEntry::Reserved) => Err(ParseError::MalformedIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn resolve_utf8(&self, index: u16) -> ParseResult<&str> {
        match self.resolve(index)? {
            ConstantPoolEntry::Utf8(value) => Ok(value.as_str()),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    pub(crate) fn resolve_class_name(&self, index: u16) -> ParseResult<&str> {
        match self.resolve(index)? {
            ConstantPoolEntry::Class { name_index } => self.resolve_utf8(*name_index),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    /// Returns `(name, descriptor)`.
    pub(crate) fn resolve_name_and_type(&self, index: u16) -> ParseResult<(&str, &str)> {
        match self.resolve(index)? {
            ConstantPoolEntry::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((
                self.resolve_utf8(*name_index)?,
                self.resolve_utf8(*descriptor_index)?,
            )),
            other => Err(mismatch(index, "NameAndType", other)),
        }
    }

    pub(crate) fn resolve_field_ref(&self, index: u16) -> ParseResult<MemberRef> {
        match self.resolve(index)? {
            ConstantPoolEntry::FieldRef {
                class_index,
                name_and_type_index,
            } => self.member_ref(*class_index, *name_and_type_index),
            other => Err(mismatch(index, "Fieldref", other)),
        }
    }

    /// Accepts both `Methodref` and `InterfaceMethodref`.
    pub(crate) fn resolve_method_ref(&self, index: u16) -> ParseResult<MemberRef> {
        match self.resolve(index)? {
            ConstantPoolEntry::MethodRef {
                class_index,
                name_and_type_index,
            }
            | ConstantPoolEntry::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => self.member_ref(*class_index, *name_and_type_index),
            other => Err(mismatch(index, "Methodref", other)),
        }
    }

    pub(crate) fn resolve_method_handle(&self, index: u16) -> ParseResult<HandleTarget> {
        match self.resolve(index)? {
            ConstantPoolEntry::MethodHandle {
                reference_kind,
                reference_index,
            } => match *reference_kind {
                1..=REF_PUT_STATIC => Ok(HandleTarget::Field(
                    self.resolve_field_ref(*reference_index)?,
                )),
                5..=9 => Ok(HandleTarget::Method(
                    self.resolve_method_ref(*reference_index)?,
                )),
                kind => Err(ParseError::malformed(format!(
                    "method handle {index} has invalid reference kind {kind}"
                ))),
            },
            other => Err(mismatch(index, "MethodHandle", other)),
        }
    }

    pub(crate) fn resolve_method_type(&self, index: u16) -> ParseResult<&str> {
        match self.resolve(index)? {
            ConstantPoolEntry::MethodType { descriptor_index } => {
                self.resolve_utf8(*descriptor_index)
            }
            other => Err(mismatch(index, "MethodType", other)),
        }
    }

    fn member_ref(&self, class_index: u16, name_and_type_index: u16) -> ParseResult<MemberRef> {
        let owner = self.resolve_class_name(class_index)?;
        let (name, descriptor) = self.resolve_name_and_type(name_and_type_index)?;
        Ok(MemberRef::new(owner, name, descriptor))
    }
}

fn mismatch(index: u16, expected: &'static str, found: &ConstantPoolEntry) -> ParseError {
    ParseError::TypeMismatch {
        index,
        expected,
        found: found.kind_name(),
    }
}

fn read_entry(reader: &mut ByteReader<'_>, index: u16) -> ParseResult<ConstantPoolEntry> {
    let tag = reader.read_u1()?;
    let entry = match tag {
        tag::UTF8 => {
            let length = reader.read_u2()? as usize;
            ConstantPoolEntry::Utf8(reader.read_utf8(length)?)
        }
        tag::INTEGER => ConstantPoolEntry::Integer(reader.read_i4()?),
        tag::FLOAT => ConstantPoolEntry::Float(f32::from_bits(reader.read_u4()?)),
        tag::LONG => ConstantPoolEntry::Long(reader.read_u64()? as i64),
        tag::DOUBLE => ConstantPoolEntry::Double(f64::from_bits(reader.read_u64()?)),
        tag::CLASS => ConstantPoolEntry::Class {
            name_index: reader.read_u2()?,
        },
        tag::STRING => ConstantPoolEntry::String {
            string_index: reader.read_u2()?,
        },
        tag::FIELD_REF => ConstantPoolEntry::FieldRef {
            class_index: reader.read_u2()?,
            name_and_type_index: reader.read_u2()?,
        },
        tag::METHOD_REF => ConstantPoolEntry::MethodRef {
            class_index: reader.read_u2()?,
            name_and_type_index: reader.read_u2()?,
        },
        tag::INTERFACE_METHOD_REF => ConstantPoolEntry::InterfaceMethodRef {
            class_index: reader.read_u2()?,
            name_and_type_index: reader.read_u2()?,
        },
        tag::NAME_AND_TYPE => ConstantPoolEntry::NameAndType {
            name_index: reader.read_u2()?,
            descriptor_index: reader.read_u2()?,
        },
        tag::METHOD_HANDLE => ConstantPoolEntry::MethodHandle {
            reference_kind: reader.read_u1()?,
            reference_index: reader.read_u2()?,
        },
        tag::METHOD_TYPE => ConstantPoolEntry::MethodType {
            descriptor_index: reader.read_u2()?,
        },
        tag::DYNAMIC => ConstantPoolEntry::Dynamic {
            bootstrap_method_attr_index: reader.read_u2()?,
            name_and_type_index: reader.read_u2()?,
        },
        tag::INVOKE_DYNAMIC => ConstantPoolEntry::InvokeDynamic {
            bootstrap_method_attr_index: reader.read_u2()?,
            name_and_type_index: reader.read_u2()?,
        },
        tag::MODULE => ConstantPoolEntry::Module {
            name_index: reader.read_u2()?,
        },
        tag::PACKAGE => ConstantPoolEntry::Package {
            name_index: reader.read_u2()?,
        },
        other => return Err(ParseError::UnknownConstantTag { tag: other, index }),
    };
    Ok(entry)
}
