//! JVM opcode values and the operand layout of every byte value.
#![allow(dead_code)]

pub(crate) const NOP: u8 = 0x00;
pub(crate) const ILOAD: u8 = 0x15;
pub(crate) const ALOAD: u8 = 0x19;
pub(crate) const ALOAD_0: u8 = 0x2a;
pub(crate) const ISTORE: u8 = 0x36;
pub(crate) const ASTORE: u8 = 0x3a;
pub(crate) const POP: u8 = 0x57;
pub(crate) const IINC: u8 = 0x84;
pub(crate) const GOTO: u8 = 0xa7;
pub(crate) const RET: u8 = 0xa9;
pub(crate) const LDC: u8 = 0x12;
pub(crate) const LDC_W: u8 = 0x13;
pub(crate) const LDC2_W: u8 = 0x14;
pub(crate) const TABLESWITCH: u8 = 0xaa;
pub(crate) const LOOKUPSWITCH: u8 = 0xab;
pub(crate) const RETURN: u8 = 0xb1;
pub(crate) const GETSTATIC: u8 = 0xb2;
pub(crate) const PUTSTATIC: u8 = 0xb3;
pub(crate) const GETFIELD: u8 = 0xb4;
pub(crate) const PUTFIELD: u8 = 0xb5;
pub(crate) const INVOKEVIRTUAL: u8 = 0xb6;
pub(crate) const INVOKESPECIAL: u8 = 0xb7;
pub(crate) const INVOKESTATIC: u8 = 0xb8;
pub(crate) const INVOKEINTERFACE: u8 = 0xb9;
pub(crate) const INVOKEDYNAMIC: u8 = 0xba;
pub(crate) const NEW: u8 = 0xbb;
pub(crate) const ANEWARRAY: u8 = 0xbd;
pub(crate) const CHECKCAST: u8 = 0xc0;
pub(crate) const INSTANCEOF: u8 = 0xc1;
pub(crate) const WIDE: u8 = 0xc4;
pub(crate) const MULTIANEWARRAY: u8 = 0xc5;

/// What a constant pool operand designates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PoolOperand {
    /// `ldc` family: any loadable constant.
    Loadable,
    /// `Fieldref`.
    Field,
    /// `Methodref` or `InterfaceMethodref`.
    Method,
    /// `InvokeDynamic` call site.
    InvokeDynamic,
    /// `Class`, possibly naming an array type.
    Class,
}

/// How the bytes after an opcode are laid out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Layout {
    /// `n` operand bytes without a constant pool reference.
    Plain(usize),
    /// One-byte constant pool index (`ldc`).
    PoolU1(PoolOperand),
    /// Two-byte constant pool index followed by `extra` bytes.
    PoolU2 { operand: PoolOperand, extra: usize },
    /// Padding to a 4-byte boundary, then default, low, high and jump table.
    TableSwitch,
    /// Padding to a 4-byte boundary, then default, npairs and match pairs.
    LookupSwitch,
    /// Widened local-variable form of the following opcode.
    Wide,
    /// No instruction is assigned to this byte value.
    Unassigned,
}

/// Closed mapping from every byte value to its operand layout.
///
/// No wildcard arm: the match must stay exhaustive over all 256 values.
pub(crate) const fn layout(opcode: u8) -> Layout {
    match opcode {
        // nop, aconst_null, iconst_*, lconst_*, fconst_*, dconst_*
        0x00..=0x0f => Layout::Plain(0),
        // bipush
        0x10 => Layout::Plain(1),
        // sipush
        0x11 => Layout::Plain(2),
        LDC => Layout::PoolU1(PoolOperand::Loadable),
        LDC_W | LDC2_W => pool(PoolOperand::Loadable, 0),
        // iload..aload
        ILOAD..=ALOAD => Layout::Plain(1),
        // *load_<n>, array loads
        0x1a..=0x35 => Layout::Plain(0),
        // istore..astore
        ISTORE..=ASTORE => Layout::Plain(1),
        // *store_<n>, array stores, stack, arithmetic, shifts, logic
        0x3b..=0x83 => Layout::Plain(0),
        IINC => Layout::Plain(2),
        // conversions and comparisons
        0x85..=0x98 => Layout::Plain(0),
        // if*, if_icmp*, if_acmp*, goto, jsr
        0x99..=0xa8 => Layout::Plain(2),
        RET => Layout::Plain(1),
        TABLESWITCH => Layout::TableSwitch,
        LOOKUPSWITCH => Layout::LookupSwitch,
        // *return
        0xac..=RETURN => Layout::Plain(0),
        GETSTATIC..=PUTFIELD => pool(PoolOperand::Field, 0),
        INVOKEVIRTUAL..=INVOKESTATIC => pool(PoolOperand::Method, 0),
        // count byte and a zero byte
        INVOKEINTERFACE => pool(PoolOperand::Method, 2),
        // two zero bytes
        INVOKEDYNAMIC => pool(PoolOperand::InvokeDynamic, 2),
        NEW => pool(PoolOperand::Class, 0),
        // newarray
        0xbc => Layout::Plain(1),
        ANEWARRAY => pool(PoolOperand::Class, 0),
        // arraylength, athrow
        0xbe..=0xbf => Layout::Plain(0),
        CHECKCAST | INSTANCEOF => pool(PoolOperand::Class, 0),
        // monitorenter, monitorexit
        0xc2..=0xc3 => Layout::Plain(0),
        WIDE => Layout::Wide,
        // dimensions byte
        MULTIANEWARRAY => pool(PoolOperand::Class, 1),
        // ifnull, ifnonnull
        0xc6..=0xc7 => Layout::Plain(2),
        // goto_w, jsr_w
        0xc8..=0xc9 => Layout::Plain(4),
        // breakpoint
        0xca => Layout::Plain(0),
        0xcb..=0xfd => Layout::Unassigned,
        // impdep1, impdep2
        0xfe..=0xff => Layout::Plain(0),
    }
}

const fn pool(operand: PoolOperand, extra: usize) -> Layout {
    Layout::PoolU2 { operand, extra }
}

/// Opcodes that may follow `wide`.
pub(crate) fn is_widenable(opcode: u8) -> bool {
    matches!(opcode, ILOAD..=ALOAD | ISTORE..=ASTORE | RET | IINC)
}

/// Alignment padding after a switch opcode at `offset`.
pub(crate) fn switch_padding(offset: usize) -> usize {
    (4 - ((offset + 1) % 4)) % 4
}
