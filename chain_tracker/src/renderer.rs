use types::nonstandard::TimelineRecord;

/// Consumer of classified records.
///
/// The tracker never emits the same slot twice, so renderers need no deduplication.
pub trait TimelineRenderer {
    fn accept_record(&mut self, record: TimelineRecord);
}

impl<R: TimelineRenderer + ?Sized> TimelineRenderer for &mut R {
    fn accept_record(&mut self, record: TimelineRecord) {
        (**self).accept_record(record);
    }
}

impl<R: TimelineRenderer + ?Sized> TimelineRenderer for Box<R> {
    fn accept_record(&mut self, record: TimelineRecord) {
        (**self).accept_record(record);
    }
}
