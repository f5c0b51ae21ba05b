use crate::command::Command;
use std::sync::{Mutex, MutexGuard};

/// Multi-producer, single-consumer FIFO of engine commands.
///
/// `drain` swaps the whole queue out under the lock, so every command is
/// delivered to exactly one drain and a batch keeps its push order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Mutex<Vec<Command>>,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Command>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, command: Command) {
        self.lock().push(command);
    }

    /// Takes every queued command, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *self.lock())
    }

    /// True when a `Quit` is waiting to be drained.
    #[must_use]
    pub fn quit_pending(&self) -> bool {
        self.lock().iter().any(|c| matches!(c, Command::Quit))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
