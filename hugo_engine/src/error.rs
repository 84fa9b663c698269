use std::io;

use hugo_formats::{ActionRef, FormatError, Opcode};
use thiserror::Error;

use crate::pool::EventId;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("corrupt save data: {0}")]
    CorruptSave(String),
    #[error("action list {0} does not exist")]
    UnknownList(u16),
    #[error("action {reference} should be {expected:?} but is {found:?}")]
    UnexpectedAction {
        reference: ActionRef,
        expected: Opcode,
        found: Opcode,
    },
    #[error("event pool exhausted ({capacity} slots in use)")]
    PoolExhausted { capacity: usize },
    #[error("event pool capacity {0} outside 1..=32767")]
    InvalidCapacity(usize),
    #[error("event {0} does not exist")]
    UnknownEvent(EventId),
    #[error("event {0} released twice")]
    DoubleRelease(EventId),
    #[error("event {0} is still queued; remove it instead of releasing it")]
    StillQueued(EventId),
    #[error("event {0} was not acquired before insertion")]
    NotAcquired(EventId),
    #[error("event {0} is not queued")]
    NotQueued(EventId),
    #[error("event {0} was acquired but never queued")]
    Unsettled(EventId),
    #[error("action {0} referenced by an event is missing from the action table")]
    MissingAction(ActionRef),
    #[error("save stream failed: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification used by hosts to decide whether a session can go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Corrupt script or save data; the load is abandoned.
    Format,
    /// The event pool ran dry, a content defect.
    ResourceExhausted,
    /// The save stream failed; the running session is unaffected.
    Io,
    /// Internal bookkeeping is inconsistent, a programming error.
    InvariantViolation,
    /// A caller broke the handle protocol (double release and friends).
    Misuse,
}

impl SchedulerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SchedulerError::Format(_)
            | SchedulerError::CorruptSave(_)
            | SchedulerError::UnknownList(_)
            | SchedulerError::UnexpectedAction { .. } => ErrorCategory::Format,
            SchedulerError::PoolExhausted { .. } => ErrorCategory::ResourceExhausted,
            SchedulerError::Io(_) => ErrorCategory::Io,
            SchedulerError::MissingAction(_) => ErrorCategory::InvariantViolation,
            SchedulerError::InvalidCapacity(_)
            | SchedulerError::UnknownEvent(_)
            | SchedulerError::DoubleRelease(_)
            | SchedulerError::StillQueued(_)
            | SchedulerError::NotAcquired(_)
            | SchedulerError::NotQueued(_)
            | SchedulerError::Unsettled(_) => ErrorCategory::Misuse,
        }
    }

    /// Everything except a failed save/restore stream ends the session.
    pub fn is_fatal(&self) -> bool {
        self.category() != ErrorCategory::Io
    }
}
