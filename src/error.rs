use thiserror::Error;

/// Failure while parsing or walking a single class buffer.
///
/// Every variant is scoped to one class file; callers report it and move on
/// to the next buffer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub(crate) enum ParseError {
    #[error("truncated input: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("constant pool index {index} is out of range or a reserved slot")]
    MalformedIndex { index: u16 },
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("constant pool index {index} is {found}, expected {expected}")]
    TypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed class file: {0}")]
    MalformedClassFile(String),
    #[error("instruction stream desynchronized in {method} at offset {offset} (code length {code_length})")]
    InstructionDesync {
        method: String,
        offset: usize,
        code_length: usize,
    },
    #[error("unassigned opcode 0x{opcode:02x} in {method} at offset {offset}")]
    UnknownOpcode {
        method: String,
        opcode: u8,
        offset: usize,
    },
}

impl ParseError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ParseError::MalformedClassFile(message.into())
    }
}

pub(crate) type ParseResult<T> = Result<T, ParseError>;
