use std::collections::VecDeque;

use mapsketch_types::Position;
use thiserror::Error;

use crate::draw::{PointId, SessionId};

/// Identifier of a mode pushed to the [`InteractionModeStack`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ModeId(u64);

/// Entity found under the pointer when a pick is resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PickedEntity {
    /// A point of a drawing session.
    Point {
        /// Session owning the point.
        session: SessionId,
        /// Id of the point in the session's store.
        point: PointId,
    },
    /// A vertex of a finalized shape.
    Shape {
        /// Index of the shape in the renderer.
        index: usize,
    },
}

/// Resolved user pick on the map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PickEvent {
    /// World position of the pick.
    pub position: Position,
    /// Entities found at the pick position, the closest first.
    pub picked: Vec<PickedEntity>,
}

impl PickEvent {
    /// Creates a pick event with nothing under the pointer.
    pub fn at(position: Position) -> Self {
        Self {
            position,
            picked: vec![],
        }
    }
}

/// Error returned by the [`InteractionModeStack`].
#[derive(Debug, Error, PartialEq)]
pub enum ModeStackError {
    /// A drawing session already has a mode in the stack.
    #[error("pick mode '{active}' is already active")]
    Occupied {
        /// Name of the active mode.
        active: String,
    },
}

#[derive(Debug)]
struct PickMode {
    id: ModeId,
    name: String,
    owner: Option<SessionId>,
    pending: VecDeque<PickEvent>,
}

/// Stack of modes that decide where the user's picks on the map go.
///
/// Every pick is delivered to the mode on top of the stack, and is queued there until the mode
/// owner takes it. At most one mode owned by a drawing session can be in the stack at a time;
/// host modes (without an owner) can be stacked freely.
#[derive(Debug, Default)]
pub struct InteractionModeStack {
    modes: Vec<PickMode>,
    next_id: u64,
}

impl InteractionModeStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a host mode that is not owned by a drawing session.
    pub fn push(&mut self, name: impl Into<String>) -> ModeId {
        self.push_internal(name.into(), None)
    }

    /// Pushes a mode owned by a drawing session.
    ///
    /// Fails if a mode of another session is already in the stack.
    pub fn push_owned(
        &mut self,
        name: impl Into<String>,
        owner: SessionId,
    ) -> Result<ModeId, ModeStackError> {
        if let Some(active) = self.modes.iter().find(|m| m.owner.is_some()) {
            return Err(ModeStackError::Occupied {
                active: active.name.clone(),
            });
        }

        Ok(self.push_internal(name.into(), Some(owner)))
    }

    fn push_internal(&mut self, name: String, owner: Option<SessionId>) -> ModeId {
        let id = ModeId(self.next_id);
        self.next_id += 1;

        log::debug!("Pushing interaction mode '{name}'");
        self.modes.push(PickMode {
            id,
            name,
            owner,
            pending: VecDeque::new(),
        });

        id
    }

    /// Pops the top mode, discarding its undelivered picks.
    pub fn pop(&mut self) -> Option<ModeId> {
        let mode = self.modes.pop()?;
        log::debug!("Popped interaction mode '{}'", mode.name);
        Some(mode.id)
    }

    /// Removes the mode wherever it is in the stack. Returns `false` if the mode is not there.
    pub fn remove(&mut self, id: ModeId) -> bool {
        if self.top() == Some(id) {
            return self.pop().is_some();
        }

        match self.modes.iter().position(|m| m.id == id) {
            Some(index) => {
                let mode = self.modes.remove(index);
                log::warn!(
                    "Interaction mode '{}' was removed from under {} other modes",
                    mode.name,
                    self.modes.len() - index
                );
                true
            }
            None => false,
        }
    }

    /// Id of the mode on top of the stack.
    pub fn top(&self) -> Option<ModeId> {
        self.modes.last().map(|m| m.id)
    }

    /// Returns true if the mode is in the stack.
    pub fn contains(&self, id: ModeId) -> bool {
        self.modes.iter().any(|m| m.id == id)
    }

    /// Session owning the mode, if any.
    pub fn owner(&self, id: ModeId) -> Option<SessionId> {
        self.modes.iter().find(|m| m.id == id)?.owner
    }

    /// Number of modes in the stack.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Returns true if there are no modes in the stack.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Queues the pick to the mode on top of the stack and returns the id of that mode.
    ///
    /// Returns `None` if the stack is empty, in which case the pick is dropped.
    pub fn deliver(&mut self, event: PickEvent) -> Option<ModeId> {
        let mode = self.modes.last_mut()?;
        mode.pending.push_back(event);
        Some(mode.id)
    }

    /// Takes all the picks queued for the mode, in delivery order.
    pub fn take_pending(&mut self, id: ModeId) -> Vec<PickEvent> {
        match self.modes.iter_mut().find(|m| m.id == id) {
            Some(mode) => mode.pending.drain(..).collect(),
            None => vec![],
        }
    }
}
