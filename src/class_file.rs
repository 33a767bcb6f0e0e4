use crate::constant_pool::ConstantPool;
use crate::error::{ParseError, ParseResult};
use crate::ir::{ClassAccess, ClassRecord, ROOT_CLASS};
use crate::reader::ByteReader;

const MAGIC: u32 = 0xCAFEBABE;
/// JDK 1.0.2.
const MIN_MAJOR_VERSION: u16 = 45;
/// JDK 26.
const MAX_MAJOR_VERSION: u16 = 70;

/// Structural view of one class file; borrows code bytes from the input.
#[derive(Debug)]
pub(crate) struct ParsedClass<'a> {
    pub(crate) record: ClassRecord,
    pub(crate) major_version: u16,
    pub(crate) pool: ConstantPool,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo<'a>>,
    pub(crate) bootstrap_methods: Vec<BootstrapMethod>,
}

#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FieldInfo {
    pub(crate) access: u16,
    pub(crate) name: String,
    pub(crate) descriptor: String,
}

#[allow(dead_code)]
#[derive(Clone, Debug)]
pub(crate) struct MethodInfo<'a> {
    pub(crate) access: u16,
    pub(crate) name: String,
    pub(crate) descriptor: String,
    /// Classes listed in the `Exceptions` attribute.
    pub(crate) exceptions: Vec<String>,
    pub(crate) code: Option<CodeAttribute<'a>>,
}

/// Instruction bytes of a `Code` attribute plus its exception table.
#[derive(Clone, Debug)]
pub(crate) struct CodeAttribute<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) exception_handlers: Vec<ExceptionHandler>,
}

#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExceptionHandler {
    pub(crate) start_pc: u16,
    pub(crate) end_pc: u16,
    pub(crate) handler_pc: u16,
    pub(crate) catch_type: Option<String>,
}

/// Entry of the `BootstrapMethods` class attribute, as raw pool indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BootstrapMethod {
    pub(crate) method_handle: u16,
    pub(crate) arguments: Vec<u16>,
}

pub(crate) fn parse_class(data: &[u8]) -> ParseResult<ParsedClass<'_>> {
    let mut reader = ByteReader::new(data);
    let magic = reader.read_u4()?;
    if magic != MAGIC {
        return Err(ParseError::malformed(format!("bad magic 0x{magic:08x}")));
    }
    let _minor = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
        return Err(ParseError::malformed(format!(
            "unsupported major version {major_version}"
        )));
    }

    let pool_count = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader, pool_count)?;

    let access = ClassAccess::from_bits(reader.read_u2()?);
    let this_class = reader.read_u2()?;
    let name = pool.resolve_class_name(this_class)?.to_string();
    let super_class = reader.read_u2()?;
    let super_name = if super_class == 0 {
        if name != ROOT_CLASS && !access.is_module() {
            return Err(ParseError::malformed(format!(
                "{name} has no super class"
            )));
        }
        None
    } else {
        Some(pool.resolve_class_name(super_class)?.to_string())
    };

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        let index = reader.read_u2()?;
        interfaces.push(pool.resolve_class_name(index)?.to_string());
    }

    let fields = parse_fields(&mut reader, &pool)?;
    let methods = parse_methods(&mut reader, &pool)?;

    let mut bootstrap_methods = Vec::new();
    read_attributes(&mut reader, &pool, |name, reader| {
        if name == "BootstrapMethods" {
            bootstrap_methods = parse_bootstrap_methods(reader)?;
        }
        Ok(())
    })?;

    if reader.remaining() != 0 {
        return Err(ParseError::malformed(format!(
            "{} trailing bytes after class attributes",
            reader.remaining()
        )));
    }

    Ok(ParsedClass {
        record: ClassRecord {
            name,
            super_name,
            interfaces,
            access,
        },
        major_version,
        pool,
        fields,
        methods,
        bootstrap_methods,
    })
}

fn parse_fields(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> ParseResult<Vec<FieldInfo>> {
    let count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access = reader.read_u2()?;
        let name = pool.resolve_utf8(reader.read_u2()?)?.to_string();
        let descriptor = pool.resolve_utf8(reader.read_u2()?)?.to_string();
        read_attributes(reader, pool, |_, _| Ok(()))?;
        fields.push(FieldInfo {
            access,
            name,
            descriptor,
        });
    }
    Ok(fields)
}

fn parse_methods<'a>(
    reader: &mut ByteReader<'a>,
    pool: &ConstantPool,
) -> ParseResult<Vec<MethodInfo<'a>>> {
    let count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access = reader.read_u2()?;
        let name = pool.resolve_utf8(reader.read_u2()?)?.to_string();
        let descriptor = pool.resolve_utf8(reader.read_u2()?)?.to_string();
        let mut code = None;
        let mut exceptions = Vec::new();
        read_attributes(reader, pool, |attribute, reader| {
            match attribute {
                "Code" => {
                    if code.is_some() {
                        return Err(ParseError::malformed(format!(
                            "method {name}{descriptor} has more than one Code attribute"
                        )));
                    }
                    code = Some(parse_code(reader, pool)?);
                }
                "Exceptions" => {
                    let count = reader.read_u2()?;
                    for _ in 0..count {
                        exceptions.push(pool.resolve_class_name(reader.read_u2()?)?.to_string());
                    }
                }
                _ => {}
            }
            Ok(())
        })?;
        methods.push(MethodInfo {
            access,
            name,
            descriptor,
            exceptions,
            code,
        });
    }
    Ok(methods)
}

fn parse_code<'a>(reader: &mut ByteReader<'a>, pool: &ConstantPool) -> ParseResult<CodeAttribute<'a>> {
    let _max_stack = reader.read_u2()?;
    let _max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    if code_length == 0 || code_length > u16::MAX as usize {
        return Err(ParseError::malformed(format!(
            "invalid code length {code_length}"
        )));
    }
    let bytes = reader.read_bytes(code_length)?;

    let table_length = reader.read_u2()?;
    let mut exception_handlers = Vec::with_capacity(table_length as usize);
    for _ in 0..table_length {
        let start_pc = reader.read_u2()?;
        let end_pc = reader.read_u2()?;
        let handler_pc = reader.read_u2()?;
        let catch_index = reader.read_u2()?;
        let catch_type = if catch_index == 0 {
            None
        } else {
            Some(pool.resolve_class_name(catch_index)?.to_string())
        };
        exception_handlers.push(ExceptionHandler {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        });
    }

    // LineNumberTable, StackMapTable and friends carry no symbolic references we index.
    read_attributes(reader, pool, |_, _| Ok(()))?;

    Ok(CodeAttribute {
        bytes,
        exception_handlers,
    })
}

fn parse_bootstrap_methods(reader: &mut ByteReader<'_>) -> ParseResult<Vec<BootstrapMethod>> {
    let count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let method_handle = reader.read_u2()?;
        let argument_count = reader.read_u2()?;
        let mut arguments = Vec::with_capacity(argument_count as usize);
        for _ in 0..argument_count {
            arguments.push(reader.read_u2()?);
        }
        methods.push(BootstrapMethod {
            method_handle,
            arguments,
        });
    }
    Ok(methods)
}

/// Walk an attribute table, handing each body to `visit` and then
/// repositioning at the declared end regardless of how much was consumed.
fn read_attributes<'a, F>(
    reader: &mut ByteReader<'a>,
    pool: &ConstantPool,
    mut visit: F,
) -> ParseResult<()>
where
    F: FnMut(&str, &mut ByteReader<'a>) -> ParseResult<()>,
{
    let count = reader.read_u2()?;
    for _ in 0..count {
        let name = pool.resolve_utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        if length > reader.remaining() {
            return Err(ParseError::TruncatedInput {
                offset: reader.position(),
                needed: length,
                remaining: reader.remaining(),
            });
        }
        let end = reader.position() + length;
        visit(name, reader)?;
        if reader.position() > end {
            return Err(ParseError::malformed(format!(
                "attribute {name} overran its declared length of {length} bytes"
            )));
        }
        reader.seek(end)?;
    }
    Ok(())
}
