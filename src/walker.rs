use crate::class_file::{BootstrapMethod, CodeAttribute};
use crate::constant_pool::{ConstantPool, ConstantPoolEntry, HandleTarget};
use crate::descriptor::{method_descriptor_classes, normalize_class_name};
use crate::error::{ParseError, ParseResult};
use crate::ir::{Referrer, UsageKind};
use crate::opcodes::{self, Layout, PoolOperand};
use crate::reader::ByteReader;
use crate::recorder::Recorder;

/// Decode every instruction of `code` and report the symbols its constant
/// pool operands and exception handlers refer to.
pub(crate) fn walk_code<R: Recorder + ?Sized>(
    code: &CodeAttribute<'_>,
    pool: &ConstantPool,
    bootstrap_methods: &[BootstrapMethod],
    referrer: &Referrer,
    recorder: &mut R,
) -> ParseResult<()> {
    let mut walker = Walker {
        pool,
        bootstrap_methods,
        referrer,
        recorder,
    };
    let mut reader = ByteReader::new(code.bytes);
    while reader.remaining() > 0 {
        let offset = reader.position();
        let opcode = reader.read_u1()?;
        walker
            .step(opcode, offset, &mut reader)
            .map_err(|err| match err {
                ParseError::TruncatedInput { .. } => ParseError::InstructionDesync {
                    method: referrer.to_string(),
                    offset,
                    code_length: code.bytes.len(),
                },
                other => other,
            })?;
    }

    for handler in &code.exception_handlers {
        if let Some(catch_type) = &handler.catch_type {
            walker.class(catch_type);
        }
    }
    Ok(())
}

struct Walker<'a, R: ?Sized> {
    pool: &'a ConstantPool,
    bootstrap_methods: &'a [BootstrapMethod],
    referrer: &'a Referrer,
    recorder: &'a mut R,
}

impl<R: Recorder + ?Sized> Walker<'_, R> {
    fn step(&mut self, opcode: u8, offset: usize, reader: &mut ByteReader<'_>) -> ParseResult<()> {
        match opcodes::layout(opcode) {
            Layout::Plain(width) => reader.skip(width),
            Layout::PoolU1(operand) => {
                let index = u16::from(reader.read_u1()?);
                self.pool_operand(operand, index)
            }
            Layout::PoolU2 { operand, extra } => {
                let index = reader.read_u2()?;
                reader.skip(extra)?;
                self.pool_operand(operand, index)
            }
            Layout::TableSwitch => {
                reader.skip(opcodes::switch_padding(offset))?;
                let _default = reader.read_i4()?;
                let low = reader.read_i4()?;
                let high = reader.read_i4()?;
                if high < low {
                    return Err(self.desync(offset, reader));
                }
                let entries = (i64::from(high) - i64::from(low) + 1) as usize;
                reader.skip(entries * 4)
            }
            Layout::LookupSwitch => {
                reader.skip(opcodes::switch_padding(offset))?;
                let _default = reader.read_i4()?;
                let pairs = reader.read_i4()?;
                if pairs < 0 {
                    return Err(self.desync(offset, reader));
                }
                reader.skip(pairs as usize * 8)
            }
            Layout::Wide => {
                let widened = reader.read_u1()?;
                if !opcodes::is_widenable(widened) {
                    return Err(self.desync(offset, reader));
                }
                // index, plus a signed constant for iinc
                reader.skip(if widened == opcodes::IINC { 4 } else { 2 })
            }
            Layout::Unassigned => Err(ParseError::UnknownOpcode {
                method: self.referrer.to_string(),
                opcode,
                offset,
            }),
        }
    }

    fn pool_operand(&mut self, operand: PoolOperand, index: u16) -> ParseResult<()> {
        let pool = self.pool;
        match operand {
            PoolOperand::Loadable => self.loadable(index),
            PoolOperand::Field => {
                let field = pool.resolve_field_ref(index)?;
                self.emit(field.symbol(), UsageKind::Field);
                Ok(())
            }
            PoolOperand::Method => {
                let method = pool.resolve_method_ref(index)?;
                self.emit(method.symbol(), UsageKind::Method);
                Ok(())
            }
            PoolOperand::InvokeDynamic => match pool.resolve(index)? {
                ConstantPoolEntry::InvokeDynamic {
                    bootstrap_method_attr_index,
                    ..
                } => self.bootstrap(*bootstrap_method_attr_index),
                other => Err(ParseError::TypeMismatch {
                    index,
                    expected: "InvokeDynamic",
                    found: other.kind_name(),
                }),
            },
            PoolOperand::Class => {
                let name = pool.resolve_class_name(index)?;
                self.class(name);
                Ok(())
            }
        }
    }

    fn loadable(&mut self, index: u16) -> ParseResult<()> {
        let pool = self.pool;
        match pool.resolve(index)? {
            ConstantPoolEntry::Dynamic {
                bootstrap_method_attr_index,
                ..
            } => self.bootstrap(*bootstrap_method_attr_index),
            _ => self.constant_argument(index, "loadable constant"),
        }
    }

    /// Record the bootstrap method handle of a call site and its static
    /// arguments.
    fn bootstrap(&mut self, attr_index: u16) -> ParseResult<()> {
        let bootstrap_methods = self.bootstrap_methods;
        let method = bootstrap_methods.get(attr_index as usize).ok_or_else(|| {
            ParseError::malformed(format!(
                "bootstrap method {attr_index} missing from BootstrapMethods"
            ))
        })?;
        self.method_handle(method.method_handle)?;
        for argument in &method.arguments {
            self.constant_argument(*argument, "bootstrap argument")?;
        }
        Ok(())
    }

    /// Constants that may appear as an `ldc` operand or a bootstrap argument.
    /// Nested `Dynamic` arguments are not followed.
    fn constant_argument(&mut self, index: u16, expected: &'static str) -> ParseResult<()> {
        let pool = self.pool;
        match pool.resolve(index)? {
            ConstantPoolEntry::Class { .. } => {
                let name = pool.resolve_class_name(index)?;
                self.class(name);
            }
            ConstantPoolEntry::MethodHandle { .. } => self.method_handle(index)?,
            ConstantPoolEntry::MethodType { .. } => {
                let descriptor = pool.resolve_method_type(index)?;
                for class in method_descriptor_classes(descriptor)? {
                    self.emit(class, UsageKind::Class);
                }
            }
            ConstantPoolEntry::Integer(_)
            | ConstantPoolEntry::Float(_)
            | ConstantPoolEntry::Long(_)
            | ConstantPoolEntry::Double(_)
            | ConstantPoolEntry::String { .. }
            | ConstantPoolEntry::Dynamic { .. } => {}
            other => {
                return Err(ParseError::TypeMismatch {
                    index,
                    expected,
                    found: other.kind_name(),
                });
            }
        }
        Ok(())
    }

    fn method_handle(&mut self, index: u16) -> ParseResult<()> {
        match self.pool.resolve_method_handle(index)? {
            HandleTarget::Field(field) => self.emit(field.symbol(), UsageKind::Field),
            HandleTarget::Method(method) => self.emit(method.symbol(), UsageKind::Method),
        }
        Ok(())
    }

    fn class(&mut self, raw: &str) {
        if let Some(name) = normalize_class_name(raw) {
            self.emit(name, UsageKind::Class);
        }
    }

    fn emit(&mut self, symbol: String, kind: UsageKind) {
        self.recorder.record_usage(symbol, kind, self.referrer);
    }

    fn desync(&self, offset: usize, reader: &ByteReader<'_>) -> ParseError {
        ParseError::InstructionDesync {
            method: self.referrer.to_string(),
            offset,
            code_length: reader.position() + reader.remaining(),
        }
    }
}
