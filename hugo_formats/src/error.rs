use std::io;

use thiserror::Error;

/// Failures while decoding the script resource. All of them abort the load.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown action opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("unknown action opcode {opcode:#04x} in variant {variant}, list {list}, action {index}")]
    UnknownOpcodeAt {
        opcode: u8,
        variant: usize,
        list: usize,
        index: usize,
    },
    #[error("variant {selected} requested but the resource stores {count}")]
    VariantOutOfRange { selected: usize, count: usize },
    #[error("list {list} holds {len} actions, too many to tag with a 16-bit offset")]
    ListTooLong { list: usize, len: usize },
    #[error("script resource read failed: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    /// True when the stream ended before the declared content did.
    pub fn is_truncation(&self) -> bool {
        matches!(self, FormatError::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof)
    }
}
