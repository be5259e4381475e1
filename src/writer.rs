use std::{fs::File, io::BufWriter, path::Path, sync::mpsc::Receiver};

use log::warn;
use serde_jsonlines::JsonLinesWriter;

use crate::{CheckOnError, session::SessionEvent};

/// Drain `events` into a JSON-lines journal at `file` until every sender
/// is dropped. Meant to run on its own thread.
pub fn write_session_events(
    file: &Path,
    events: Receiver<SessionEvent>,
) -> Result<usize, CheckOnError> {
    let journal_file = File::create(file).map_err(|e| CheckOnError::WriterError { source: e })?;
    let mut journal_writer = JsonLinesWriter::new(BufWriter::new(journal_file));
    let mut written = 0;
    for event in &events {
        match journal_writer.write(&event) {
            Ok(()) => written += 1,
            Err(e) => warn!("Error while writing session event to journal: {}", e),
        }
    }
    journal_writer
        .flush()
        .map_err(|e| CheckOnError::WriterError { source: e })?;
    Ok(written)
}

pub fn read_session_events(file: &Path) -> Result<Vec<SessionEvent>, CheckOnError> {
    serde_jsonlines::json_lines(file)
        .map_err(|e| CheckOnError::JournalLoadError { source: e })?
        .collect::<Result<Vec<SessionEvent>, std::io::Error>>()
        .map_err(|e| CheckOnError::JournalLoadError { source: e })
}
