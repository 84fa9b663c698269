pub mod action;
pub mod error;
pub mod record;
pub mod table;

pub use action::{Action, ActionKind, ActionRef, Opcode};
pub use error::FormatError;
pub use record::{read_record, write_record};
pub use table::{ActionList, ActionTable, read_variant_index};
