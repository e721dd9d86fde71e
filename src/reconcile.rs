//! Client reconciliation protocol: how one drawn shape moves from an
//! ephemeral draft to a persisted record and back.
//!
//! The server never sees this type - it is the rule set a client drives,
//! kept here as the typed contract both sides agree on. One instance
//! tracks one feature:
//!
//! ```text
//! Draft -> Persisting -> Persisted <-> Editing
//!              |              \______ -> Deleted (terminal)
//!              v
//!        Draft (orphaned)
//! ```
//!
//! Two deliberate asymmetries, kept from the observed client behavior:
//! a failed create leaves an orphaned draft that is never retried, and a
//! failed properties edit keeps the local copy (last local edit wins) -
//! the failure is surfaced to the user but nothing rolls back.

use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Properties attached to a freshly drawn shape before its first save.
pub fn default_properties() -> Value {
    json!({ "title": "New drawing", "description": "" })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Exists only in the client's drawing layer. An orphaned draft is one
    /// whose create request failed: still visible, never retried, and
    /// unreachable for server-side edit or delete.
    Draft { orphaned: bool },
    /// Create request in flight.
    Persisting,
    /// Server identity bound; the sole handle for every later operation.
    Persisted { id: Uuid },
    /// Properties edit in flight; the local copy is already updated.
    Editing { id: Uuid },
    /// Removed from client and server. Terminal.
    Deleted,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("feature has no server identity")]
    NotPersisted,
    #[error("a request for this feature is already in flight")]
    RequestInFlight,
    #[error("feature was deleted")]
    Deleted,
}

#[derive(Debug, Clone)]
pub struct FeatureLifecycle {
    state: SyncState,
    geometry: Value,
    properties: Value,
}

impl FeatureLifecycle {
    /// A shape fresh off the drawing tool, carrying default properties.
    pub fn draft(geometry: Value) -> Self {
        Self {
            state: SyncState::Draft { orphaned: false },
            geometry,
            properties: default_properties(),
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn geometry(&self) -> &Value {
        &self.geometry
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    /// The bound server identity, if any.
    pub fn id(&self) -> Option<Uuid> {
        match self.state {
            SyncState::Persisted { id } | SyncState::Editing { id } => Some(id),
            _ => None,
        }
    }

    /// Draft -> Persisting. Orphaned drafts stay orphaned: the protocol has
    /// no automatic retry path.
    pub fn begin_persist(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            SyncState::Draft { orphaned: false } => {
                self.state = SyncState::Persisting;
                Ok(())
            }
            SyncState::Draft { orphaned: true } => Err(ProtocolError::NotPersisted),
            SyncState::Persisting | SyncState::Editing { .. } => Err(ProtocolError::RequestInFlight),
            SyncState::Persisted { .. } => Err(ProtocolError::RequestInFlight),
            SyncState::Deleted => Err(ProtocolError::Deleted),
        }
    }

    /// Persisting -> Persisted, binding the server-assigned identity.
    pub fn persist_succeeded(&mut self, id: Uuid) -> Result<(), ProtocolError> {
        match self.state {
            SyncState::Persisting => {
                self.state = SyncState::Persisted { id };
                Ok(())
            }
            _ => Err(ProtocolError::RequestInFlight),
        }
    }

    /// Persisting -> orphaned Draft. The shape stays visible client-side
    /// but can never reach the server again.
    pub fn persist_failed(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            SyncState::Persisting => {
                self.state = SyncState::Draft { orphaned: true };
                Ok(())
            }
            _ => Err(ProtocolError::RequestInFlight),
        }
    }

    /// Persisted -> Editing. The local copy is updated immediately
    /// (optimistically); returns the identity to address the request to.
    pub fn begin_edit(&mut self, new_properties: Value) -> Result<Uuid, ProtocolError> {
        match self.state {
            SyncState::Persisted { id } => {
                self.properties = new_properties;
                self.state = SyncState::Editing { id };
                Ok(id)
            }
            SyncState::Editing { .. } | SyncState::Persisting => {
                Err(ProtocolError::RequestInFlight)
            }
            SyncState::Draft { .. } => Err(ProtocolError::NotPersisted),
            SyncState::Deleted => Err(ProtocolError::Deleted),
        }
    }

    /// Editing -> Persisted.
    pub fn edit_succeeded(&mut self) -> Result<(), ProtocolError> {
        self.finish_edit()
    }

    /// Editing -> Persisted, keeping the optimistic local copy. Last local
    /// edit wins; the caller surfaces the failure but performs no rollback.
    pub fn edit_failed(&mut self) -> Result<(), ProtocolError> {
        self.finish_edit()
    }

    fn finish_edit(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            SyncState::Editing { id } => {
                self.state = SyncState::Persisted { id };
                Ok(())
            }
            _ => Err(ProtocolError::RequestInFlight),
        }
    }

    /// The identity to delete by. A shape without one cannot be deleted
    /// server-side; that is a client-only error.
    pub fn request_delete(&self) -> Result<Uuid, ProtocolError> {
        match self.state {
            SyncState::Persisted { id } | SyncState::Editing { id } => Ok(id),
            SyncState::Draft { .. } | SyncState::Persisting => Err(ProtocolError::NotPersisted),
            SyncState::Deleted => Err(ProtocolError::Deleted),
        }
    }

    /// -> Deleted. Terminal on both sides.
    pub fn delete_succeeded(&mut self) -> Result<(), ProtocolError> {
        match self.state {
            SyncState::Persisted { .. } | SyncState::Editing { .. } => {
                self.state = SyncState::Deleted;
                Ok(())
            }
            SyncState::Deleted => Err(ProtocolError::Deleted),
            _ => Err(ProtocolError::NotPersisted),
        }
    }
}
