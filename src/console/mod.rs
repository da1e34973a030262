//! Interactive console for the hosted agents.

pub mod render;
mod session;

pub use session::{
    command_names, parse_line, ConsoleInput, ConsoleSession, SessionCommand, SessionEvent,
    COMMAND_PREFIX,
};
