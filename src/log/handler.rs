//! Read callbacks
//!
//! Single-method capabilities handed to a scan: one receives every
//! reassembled record, the other decides what happens on a corrupted chunk.
//! Closures with the matching signature implement both.

use crate::error::RecordCorrupted;

/// Receives each logical record, in file order
pub trait RecordConsumer {
    /// `position` is the file offset the scan has reached. Return `false`
    /// to stop the scan early (not an error).
    fn consume(&mut self, record: &[u8], position: u64) -> bool;
}

impl<F> RecordConsumer for F
where
    F: FnMut(&[u8], u64) -> bool,
{
    fn consume(&mut self, record: &[u8], position: u64) -> bool {
        self(record, position)
    }
}

/// Decides whether a scan continues past a corrupted chunk
pub trait CorruptionHandler {
    /// Return `true` to resynchronize on the next record boundary and keep
    /// reading, `false` to end the scan.
    fn handle(&mut self, error: &RecordCorrupted) -> bool;
}

impl<F> CorruptionHandler for F
where
    F: FnMut(&RecordCorrupted) -> bool,
{
    fn handle(&mut self, error: &RecordCorrupted) -> bool {
        self(error)
    }
}

/// Logs the corruption and keeps scanning. The default policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAndContinue;

impl CorruptionHandler for LogAndContinue {
    fn handle(&mut self, error: &RecordCorrupted) -> bool {
        tracing::warn!(
            expected = error.expected_checksum,
            calculated = error.calculated_checksum,
            "Corrupted record skipped: {}",
            error
        );
        true
    }
}

/// Logs the corruption and ends the scan
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAndStop;

impl CorruptionHandler for LogAndStop {
    fn handle(&mut self, error: &RecordCorrupted) -> bool {
        tracing::error!(
            expected = error.expected_checksum,
            calculated = error.calculated_checksum,
            "Corrupted record, stopping read: {}",
            error
        );
        false
    }
}
