use crate::Database;
use scratchdb_core::{Error, Result};

/// Lifecycle of one provisioned backend.
///
/// Setup walks the states in declaration order up to `Ready`; teardown walks
/// the rest. Teardown may start from any state at or after `ScratchCreated`,
/// and may restart from `ScratchClosing` or `AdminReopened` when an earlier
/// teardown failed to drop the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceState {
    Unprovisioned,
    AdminOpen,
    ScratchCreated,
    Migrated,
    /// The only state in which the storage service may be used.
    Ready,
    ScratchClosing,
    AdminReopened,
    Dropped,
}

impl InstanceState {
    pub fn is_ready(self) -> bool {
        matches!(self, InstanceState::Ready)
    }

    /// True once the scratch database was dropped.
    pub fn is_dropped(self) -> bool {
        matches!(self, InstanceState::Dropped)
    }

    fn can_advance_to(self, next: InstanceState) -> bool {
        use InstanceState::*;

        matches!(
            (self, next),
            (Unprovisioned, AdminOpen)
                | (AdminOpen, ScratchCreated)
                | (ScratchCreated, Migrated)
                | (Migrated, Ready)
                | (
                    ScratchCreated | Migrated | Ready | ScratchClosing | AdminReopened,
                    ScratchClosing
                )
                | (ScratchClosing, AdminReopened)
                | (AdminReopened, Dropped)
        )
    }
}

#[derive(Debug)]
pub(crate) struct ProvisionedInstance<S> {
    index: usize,
    state: InstanceState,

    /// Scratch connection, set once migrations ran.
    pub(crate) database: Option<Database>,

    /// Set when the instance reaches `Ready` and kept after teardown.
    pub(crate) service: Option<S>,
}

impl<S> ProvisionedInstance<S> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            state: InstanceState::Unprovisioned,
            database: None,
            service: None,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn state(&self) -> InstanceState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: InstanceState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(Error::invalid_lifecycle(format!(
                "backend #{} cannot move from {:?} to {next:?}",
                self.index, self.state
            )));
        }

        tracing::debug!(index = self.index, from = ?self.state, to = ?next, "instance state");
        self.state = next;
        Ok(())
    }
}
