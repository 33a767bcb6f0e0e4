use tracing::trace;

use crate::class_file::parse_class;
use crate::descriptor::{field_descriptor_classes, method_descriptor_classes};
use crate::error::ParseResult;
use crate::ir::{MemberRef, Referrer, UsageKind};
use crate::recorder::Recorder;
use crate::walker::walk_code;

/// Parse one class buffer and report its inheritance record and every
/// symbol it references to `recorder`. Returns the class name.
pub(crate) fn visit_class<R: Recorder + ?Sized>(
    data: &[u8],
    recorder: &mut R,
) -> ParseResult<String> {
    let parsed = parse_class(data)?;
    let class_name = parsed.record.name.clone();
    trace!(class = %class_name, major_version = parsed.major_version, "visiting class");
    let header = Referrer::Class(class_name.clone());
    let super_name = parsed.record.super_name.clone();
    let interfaces = parsed.record.interfaces.clone();
    recorder.record_inheritance(parsed.record);

    if let Some(super_name) = super_name {
        recorder.record_usage(super_name, UsageKind::Class, &header);
    }
    for interface in interfaces {
        recorder.record_usage(interface, UsageKind::Class, &header);
    }

    for field in &parsed.fields {
        let referrer = Referrer::Field(MemberRef::new(&class_name, &field.name, &field.descriptor));
        for class in field_descriptor_classes(&field.descriptor)? {
            recorder.record_usage(class, UsageKind::Class, &referrer);
        }
    }

    for method in &parsed.methods {
        let referrer =
            Referrer::Method(MemberRef::new(&class_name, &method.name, &method.descriptor));
        for class in method_descriptor_classes(&method.descriptor)? {
            recorder.record_usage(class, UsageKind::Class, &referrer);
        }
        for exception in &method.exceptions {
            recorder.record_usage(exception.clone(), UsageKind::Class, &referrer);
        }
        if let Some(code) = &method.code {
            walk_code(
                code,
                &parsed.pool,
                &parsed.bootstrap_methods,
                &referrer,
                recorder,
            )?;
        }
    }

    Ok(class_name)
}
