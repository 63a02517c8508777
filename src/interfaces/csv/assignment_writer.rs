use crate::application::service::AssignmentRecord;
use crate::error::Result;
use std::io::Write;

/// Writes the organizer's assignment export as CSV.
pub struct AssignmentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AssignmentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes a header followed by one row per record, then flushes.
    pub fn write_assignments<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = AssignmentRecord>,
    {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
