use crate::application::service::NewParticipant;
use crate::error::{Result, SantaError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ParticipantRow {
    name: String,
    #[serde(default)]
    email: Option<String>,
}

/// Reads participants from a CSV source with a `name,email` header.
///
/// Whitespace is trimmed and the email column may be empty or missing.
pub struct ParticipantReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ParticipantReader<R> {
    /// Creates a new `ParticipantReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads participant rows.
    pub fn participants(self) -> impl Iterator<Item = Result<NewParticipant>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map(|row: ParticipantRow| NewParticipant {
                    name: row.name,
                    email: row.email.filter(|e| !e.is_empty()),
                })
                .map_err(SantaError::from)
        })
    }
}
