//! Class file writer used by unit tests to produce real class bytes.

/// Minimal class file writer covering the structures the indexer reads.
pub(crate) struct ClassFileBuilder {
    cp: Vec<CpEntry>,
    major_version: u16,
    access: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<(u16, u16)>,
    methods: Vec<MethodEntry>,
    bootstrap_methods: Vec<(u16, Vec<u16>)>,
    attributes: Vec<(u16, Vec<u8>)>,
    code_index: u16,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self {
            cp: Vec::new(),
            major_version: 52,
            access: 0x0021,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            bootstrap_methods: Vec::new(),
            attributes: Vec::new(),
            code_index: 0,
        };
        builder.code_index = builder.add_utf8("Code");
        builder.this_class = builder.add_class(class_name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.add_class(super_name);
        }
        builder
    }

    pub(crate) fn access(&mut self, access: u16) {
        self.access = access;
    }

    pub(crate) fn major_version(&mut self, major_version: u16) {
        self.major_version = major_version;
    }

    pub(crate) fn add_interface(&mut self, name: &str) {
        let index = self.add_class(name);
        self.interfaces.push(index);
    }

    pub(crate) fn add_utf8(&mut self, value: &str) -> u16 {
        self.push(CpEntry::Utf8(value.to_string()))
    }

    pub(crate) fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.push(CpEntry::Class(name_index))
    }

    pub(crate) fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.push(CpEntry::NameAndType(name_index, descriptor_index))
    }

    pub(crate) fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::FieldRef(class_index, name_and_type))
    }

    pub(crate) fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::MethodRef(class_index, name_and_type))
    }

    pub(crate) fn add_method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        self.push(CpEntry::MethodHandle(kind, reference))
    }

    pub(crate) fn add_method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor_index = self.add_utf8(descriptor);
        self.push(CpEntry::MethodType(descriptor_index))
    }

    /// Register a bootstrap method and an `InvokeDynamic` constant using it.
    pub(crate) fn add_invoke_dynamic(
        &mut self,
        bootstrap_handle: u16,
        arguments: Vec<u16>,
        name: &str,
        descriptor: &str,
    ) -> u16 {
        let bootstrap_index = self.bootstrap_methods.len() as u16;
        self.bootstrap_methods.push((bootstrap_handle, arguments));
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::InvokeDynamic(bootstrap_index, name_and_type))
    }

    pub(crate) fn add_field(&mut self, name: &str, descriptor: &str) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.fields.push((name_index, descriptor_index));
    }

    pub(crate) fn add_method(&mut self, spec: MethodSpec) {
        let name_index = self.add_utf8(&spec.name);
        let descriptor_index = self.add_utf8(&spec.descriptor);
        let exceptions = if spec.throws.is_empty() {
            None
        } else {
            let attribute_name = self.add_utf8("Exceptions");
            let classes = spec
                .throws
                .iter()
                .map(|name| self.add_class(name))
                .collect::<Vec<_>>();
            Some((attribute_name, classes))
        };
        self.methods.push(MethodEntry {
            name_index,
            descriptor_index,
            code: spec.code,
            handlers: spec.handlers,
            exceptions,
        });
    }

    /// Append a raw class-level attribute body.
    pub(crate) fn add_class_attribute(&mut self, name: &str, body: Vec<u8>) {
        let name_index = self.add_utf8(name);
        self.attributes.push((name_index, body));
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        if !self.bootstrap_methods.is_empty() {
            let mut body = Vec::new();
            write_u16(&mut body, self.bootstrap_methods.len() as u16);
            for (handle, arguments) in &self.bootstrap_methods {
                write_u16(&mut body, *handle);
                write_u16(&mut body, arguments.len() as u16);
                for argument in arguments {
                    write_u16(&mut body, *argument);
                }
            }
            self.add_class_attribute("BootstrapMethods", body);
        }

        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0xCAFEBABE);
        write_u16(&mut bytes, 0);
        write_u16(&mut bytes, self.major_version);
        write_u16(&mut bytes, (self.cp.len() + 1) as u16);
        for entry in &self.cp {
            entry.write(&mut bytes);
        }
        write_u16(&mut bytes, self.access);
        write_u16(&mut bytes, self.this_class);
        write_u16(&mut bytes, self.super_class);
        write_u16(&mut bytes, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            write_u16(&mut bytes, *interface);
        }
        write_u16(&mut bytes, self.fields.len() as u16);
        for (name_index, descriptor_index) in &self.fields {
            write_u16(&mut bytes, 0x0002);
            write_u16(&mut bytes, *name_index);
            write_u16(&mut bytes, *descriptor_index);
            write_u16(&mut bytes, 0);
        }
        write_u16(&mut bytes, self.methods.len() as u16);
        for method in &self.methods {
            method.write(self.code_index, &mut bytes);
        }
        write_u16(&mut bytes, self.attributes.len() as u16);
        for (name_index, body) in &self.attributes {
            write_u16(&mut bytes, *name_index);
            write_u32(&mut bytes, body.len() as u32);
            bytes.extend_from_slice(body);
        }
        bytes
    }

    fn push(&mut self, entry: CpEntry) -> u16 {
        self.cp.push(entry);
        self.cp.len() as u16
    }
}

/// Method definition for generated class files.
pub(crate) struct MethodSpec {
    name: String,
    descriptor: String,
    code: Vec<u8>,
    handlers: Vec<[u16; 4]>,
    throws: Vec<String>,
}

impl MethodSpec {
    pub(crate) fn new(name: &str, descriptor: &str, code: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code,
            handlers: Vec::new(),
            throws: Vec::new(),
        }
    }

    /// Exception table row; `catch_type` is a Class constant index or 0.
    pub(crate) fn handler(mut self, start: u16, end: u16, handler: u16, catch_type: u16) -> Self {
        self.handlers.push([start, end, handler, catch_type]);
        self
    }

    pub(crate) fn throws(mut self, class: &str) -> Self {
        self.throws.push(class.to_string());
        self
    }
}

struct MethodEntry {
    name_index: u16,
    descriptor_index: u16,
    code: Vec<u8>,
    handlers: Vec<[u16; 4]>,
    exceptions: Option<(u16, Vec<u16>)>,
}

impl MethodEntry {
    fn write(&self, code_index: u16, bytes: &mut Vec<u8>) {
        write_u16(bytes, 0x0001);
        write_u16(bytes, self.name_index);
        write_u16(bytes, self.descriptor_index);
        let has_code = !self.code.is_empty();
        let attribute_count = u16::from(has_code) + u16::from(self.exceptions.is_some());
        write_u16(bytes, attribute_count);
        if has_code {
            write_u16(bytes, code_index);
            let attr_len = 12 + self.code.len() as u32 + 8 * self.handlers.len() as u32;
            write_u32(bytes, attr_len);
            write_u16(bytes, 4);
            write_u16(bytes, 4);
            write_u32(bytes, self.code.len() as u32);
            bytes.extend_from_slice(&self.code);
            write_u16(bytes, self.handlers.len() as u16);
            for handler in &self.handlers {
                for value in handler {
                    write_u16(bytes, *value);
                }
            }
            write_u16(bytes, 0);
        }
        if let Some((name_index, classes)) = &self.exceptions {
            write_u16(bytes, *name_index);
            write_u32(bytes, 2 + 2 * classes.len() as u32);
            write_u16(bytes, classes.len() as u16);
            for class in classes {
                write_u16(bytes, *class);
            }
        }
    }
}

/// Constant pool entries needed by generated class files.
enum CpEntry {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    InvokeDynamic(u16, u16),
}

impl CpEntry {
    fn write(&self, bytes: &mut Vec<u8>) {
        match self {
            CpEntry::Utf8(value) => {
                bytes.push(1);
                write_u16(bytes, value.len() as u16);
                bytes.extend_from_slice(value.as_bytes());
            }
            CpEntry::Class(name_index) => {
                bytes.push(7);
                write_u16(bytes, *name_index);
            }
            CpEntry::NameAndType(name_index, descriptor_index) => {
                bytes.push(12);
                write_u16(bytes, *name_index);
                write_u16(bytes, *descriptor_index);
            }
            CpEntry::FieldRef(class_index, name_and_type) => {
                bytes.push(9);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::MethodRef(class_index, name_and_type) => {
                bytes.push(10);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::MethodHandle(kind, reference) => {
                bytes.push(15);
                bytes.push(*kind);
                write_u16(bytes, *reference);
            }
            CpEntry::MethodType(descriptor_index) => {
                bytes.push(16);
                write_u16(bytes, *descriptor_index);
            }
            CpEntry::InvokeDynamic(bootstrap_index, name_and_type) => {
                bytes.push(18);
                write_u16(bytes, *bootstrap_index);
                write_u16(bytes, *name_and_type);
            }
        }
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn high(value: u16) -> u8 {
    (value >> 8) as u8
}

pub(crate) fn low(value: u16) -> u8 {
    (value & 0xff) as u8
}
