//! The session registry: process-wide room table with a defined eviction
//! rule (both seats vacant), replacing the ad hoc global map of the usual
//! socket-server design.

use std::collections::HashMap;

use tempo_protocol::RoomId;

use crate::{RulesEngine, Session};

/// Maps room ids to sessions. Owned by the coordinator; never shared.
pub struct SessionRegistry<E: RulesEngine> {
    sessions: HashMap<RoomId, Session<E>>,
    /// Engine construction settings, reused for creation and reset.
    config: E::Config,
}

impl<E: RulesEngine> SessionRegistry<E> {
    pub fn new(config: E::Config) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn engine_config(&self) -> &E::Config {
        &self.config
    }

    /// Returns the session for `room_id`, creating a fresh one (new
    /// engine, both seats vacant, initial mover) if absent.
    pub fn get_or_create(&mut self, room_id: &RoomId) -> &mut Session<E> {
        if !self.sessions.contains_key(room_id) {
            tracing::info!(room_id = %room_id, "session created");
            self.sessions.insert(
                room_id.clone(),
                Session::new(room_id.clone(), &self.config),
            );
        }
        self.sessions
            .get_mut(room_id)
            .expect("session present or just inserted")
    }

    /// First session with at least one vacant seat, in registry iteration
    /// order; `None` when every session is full or none exist.
    pub fn find_open(&self) -> Option<&RoomId> {
        self.sessions
            .values()
            .find(|s| s.seats.has_vacancy())
            .map(|s| &s.id)
    }

    /// Deletes the session; no-op if absent.
    pub fn remove(&mut self, room_id: &RoomId) {
        if self.sessions.remove(room_id).is_some() {
            tracing::info!(room_id = %room_id, "session evicted");
        }
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Session<E>> {
        self.sessions.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &RoomId) -> Option<&mut Session<E>> {
        self.sessions.get_mut(room_id)
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.sessions.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
