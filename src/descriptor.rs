use std::str::FromStr;

use jdescriptor::{MethodDescriptor, TypeDescriptor};

use crate::error::{ParseError, ParseResult};

/// Class names referenced by a JVM method descriptor, parameters first.
pub(crate) fn method_descriptor_classes(descriptor: &str) -> ParseResult<Vec<String>> {
    let parsed = MethodDescriptor::from_str(descriptor).map_err(|err| {
        ParseError::malformed(format!("invalid method descriptor {descriptor}: {err}"))
    })?;
    let mut classes = Vec::new();
    for param in parsed.parameter_types() {
        collect_classes(param, &mut classes);
    }
    collect_classes(parsed.return_type(), &mut classes);
    Ok(classes)
}

/// Class names referenced by a JVM field descriptor.
pub(crate) fn field_descriptor_classes(descriptor: &str) -> ParseResult<Vec<String>> {
    // A field descriptor is a valid method return type.
    let parsed = MethodDescriptor::from_str(&format!("(){descriptor}")).map_err(|err| {
        ParseError::malformed(format!("invalid field descriptor {descriptor}: {err}"))
    })?;
    if matches!(parsed.return_type(), TypeDescriptor::Void) {
        return Err(ParseError::malformed(format!(
            "invalid field descriptor {descriptor}"
        )));
    }
    let mut classes = Vec::new();
    collect_classes(parsed.return_type(), &mut classes);
    Ok(classes)
}

fn collect_classes(ty: &TypeDescriptor, classes: &mut Vec<String>) {
    match ty {
        TypeDescriptor::Object(class) => classes.push(class.to_string()),
        TypeDescriptor::Array(inner, _) => collect_classes(inner, classes),
        _ => {}
    }
}

/// Reduce a `CONSTANT_Class` name to the class it designates; array names
/// collapse to their element class and primitive arrays to `None`.
pub(crate) fn normalize_class_name(raw: &str) -> Option<String> {
    if !raw.starts_with('[') {
        return Some(raw.to_string());
    }
    let element = raw.trim_start_matches('[');
    element
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .map(str::to_string)
}
