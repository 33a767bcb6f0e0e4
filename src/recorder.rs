use crate::ir::{ClassRecord, Referrer, UsageKind};

/// Sink for the events produced while visiting one class.
pub(crate) trait Recorder {
    fn record_inheritance(&mut self, record: ClassRecord);

    /// Called once per resolved reference; deduplication is left to the sink.
    fn record_usage(&mut self, symbol: String, kind: UsageKind, referrer: &Referrer);
}

/// A usage event as received by a [`Recorder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct UsageEvent {
    pub(crate) symbol: String,
    pub(crate) kind: UsageKind,
    pub(crate) usage: String,
}

/// Buffers the events of a single class so they can be committed to the
/// index in one step, or dropped if the class fails to parse.
#[derive(Debug, Default)]
pub(crate) struct ClassEvents {
    pub(crate) record: Option<ClassRecord>,
    pub(crate) usages: Vec<UsageEvent>,
}

impl Recorder for ClassEvents {
    fn record_inheritance(&mut self, record: ClassRecord) {
        self.record = Some(record);
    }

    fn record_usage(&mut self, symbol: String, kind: UsageKind, referrer: &Referrer) {
        self.usages.push(UsageEvent {
            symbol,
            kind,
            usage: referrer.usage_descriptor(),
        });
    }
}
