//! Event scheduler and action interpreter for the Hugo adventure games.
//!
//! A [`Scheduler`] owns the clock, the time-ordered event queue and the
//! action table loaded from the script resource. Each call to
//! [`Scheduler::run`] dispatches every event that has come due against a
//! [`GameHost`], which supplies the world state the actions read and change.

pub mod clock;
pub mod config;
pub mod error;
pub mod host;
mod interpreter;
pub mod maze;
mod persist;
pub mod pool;
pub mod queue;
pub mod release;
pub mod sandbox;
pub mod scheduler;

pub use clock::{Clock, MillisSource, TickSource, WallMillis};
pub use config::{SchedulerConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_VARIANT_COUNT};
pub use error::{ErrorCategory, SchedulerError};
pub use host::{
    Dialog, GameHost, GameStatus, ImageBox, ObjectStore, ScoreLedger, ScreenDisplay,
    ScreenLoader, SoundPlayer, WordParser, CYCLE_FORWARD,
};
pub use hugo_formats::{Action, ActionKind, ActionList, ActionRef, ActionTable, Opcode};
pub use maze::{HeroBounds, MazeExit, MazeState, SHIFT_SIZE};
pub use pool::{Event, EventId, EventPool, EventScope, MAX_CAPACITY};
pub use queue::EventQueue;
pub use release::{GameRelease, PromptMatch, ReleaseProfile, TextCipher};
pub use sandbox::{HostEvent, SandboxHost, SandboxObject};
pub use scheduler::{Dispatched, Scheduler, TickReport};
