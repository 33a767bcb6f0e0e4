use std::fmt;

use serde::Serialize;

/// Implicit super class of every class that declares none.
pub(crate) const ROOT_CLASS: &str = "java/lang/Object";

/// Structural record of one parsed class, keyed by `name` in the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct ClassRecord {
    pub(crate) name: String,
    pub(crate) super_name: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) access: ClassAccess,
}

impl ClassRecord {
    /// Render as `name|super|flags|iface1,iface2`. The super column is empty
    /// for the root type and for classes extending it directly.
    pub(crate) fn table_row(&self) -> String {
        let super_name = match self.super_name.as_deref() {
            None | Some(ROOT_CLASS) => "",
            Some(name) => name,
        };
        format!(
            "{}|{}|{}|{}",
            self.name,
            super_name,
            self.access.bits(),
            self.interfaces.join(",")
        )
    }

    pub(crate) fn extends_or_implements(&self, name: &str) -> bool {
        self.super_name.as_deref() == Some(name) || self.interfaces.iter().any(|i| i == name)
    }

    /// Super class first, then interfaces in declaration order.
    pub(crate) fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.super_name
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}

/// Raw `access_flags` of a class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub(crate) struct ClassAccess(u16);

#[allow(dead_code)]
impl ClassAccess {
    pub(crate) const PUBLIC: u16 = 0x0001;
    pub(crate) const FINAL: u16 = 0x0010;
    pub(crate) const SUPER: u16 = 0x0020;
    pub(crate) const INTERFACE: u16 = 0x0200;
    pub(crate) const ABSTRACT: u16 = 0x0400;
    pub(crate) const SYNTHETIC: u16 = 0x1000;
    pub(crate) const ANNOTATION: u16 = 0x2000;
    pub(crate) const ENUM: u16 = 0x4000;
    pub(crate) const MODULE: u16 = 0x8000;

    pub(crate) fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub(crate) fn bits(self) -> u16 {
        self.0
    }

    pub(crate) fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub(crate) fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    pub(crate) fn is_module(self) -> bool {
        self.contains(Self::MODULE)
    }
}

/// Kind of symbol a usage edge points at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub(crate) enum UsageKind {
    Class,
    Method,
    Field,
}

/// Field or method reference resolved from the constant pool.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub(crate) struct MemberRef {
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) descriptor: String,
}

impl MemberRef {
    pub(crate) fn new(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Index key of the member: `owner:name:descriptor`.
    pub(crate) fn symbol(&self) -> String {
        format!("{}:{}:{}", self.owner, self.name, self.descriptor)
    }
}

/// Declaration a reference was found in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Referrer {
    Class(String),
    Field(MemberRef),
    Method(MemberRef),
}

impl Referrer {
    /// Usage descriptor stored in the index: `c:`, `f:` or `m:` prefixed.
    pub(crate) fn usage_descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referrer::Class(name) => write!(f, "c:{name}"),
            Referrer::Field(member) => write!(f, "f:{}", member.symbol()),
            Referrer::Method(member) => write!(f, "m:{}", member.symbol()),
        }
    }
}
