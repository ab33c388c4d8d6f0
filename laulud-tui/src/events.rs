//! Event types for the TUI event loop.

use crossterm::event::KeyEvent;
use laulud_client::{AuthStatus, MutationKind};
use laulud_core::{LauludResult, TaggedItem};

/// Input, plus results of work spawned off the loop.
#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    AuthChecked(AuthStatus),
    MutationFinished {
        kind: MutationKind,
        result: LauludResult<TaggedItem>,
    },
    LoggedOut(LauludResult<()>),
}
