//! Active session table.
//!
//! Like [`super::queue::WaitQueue`], this is plain data guarded by the
//! matchmaker's mutex.

use std::collections::HashMap;
use std::time::Instant;

use uuid::Uuid;

use tandem_core::protocol::{ChatMode, ChatSummary};

/// A paired two-client session, alive from pairing until either side leaves
/// or drops.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub mode: ChatMode,
    pub clients: [Uuid; 2],
    pub created_at: Instant,
}

impl Session {
    /// The other member, or `None` if `client` is not in this session.
    pub fn partner_of(&self, client: Uuid) -> Option<Uuid> {
        match self.clients {
            [a, b] if a == client => Some(b),
            [a, b] if b == client => Some(a),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct SessionTable {
    sessions: HashMap<Uuid, Session>,
    by_client: HashMap<Uuid, Uuid>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for two clients fresh out of the wait queue.
    ///
    /// Callers must have removed both from any queue first; the pairing
    /// invariant (never queued and in a session at once) is enforced by the
    /// matchmaker's critical section, not here.
    pub fn create(&mut self, mode: ChatMode, a: Uuid, b: Uuid) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            mode,
            clients: [a, b],
            created_at: Instant::now(),
        };
        self.by_client.insert(a, session.id);
        self.by_client.insert(b, session.id);
        self.sessions.insert(session.id, session.clone());
        session
    }

    /// End the session containing `client`, unindexing both members.
    /// Idempotent: a client with no session yields `None`.
    pub fn end_by_client(&mut self, client: Uuid) -> Option<Session> {
        let id = self.by_client.remove(&client)?;
        let session = self.sessions.remove(&id)?;
        for member in session.clients {
            self.by_client.remove(&member);
        }
        Some(session)
    }

    pub fn session_of(&self, client: Uuid) -> Option<&Session> {
        let id = self.by_client.get(&client)?;
        self.sessions.get(id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn snapshot(&self) -> Vec<ChatSummary> {
        self.sessions
            .values()
            .map(|s| ChatSummary {
                id: s.id,
                client1: s.clients[0],
                client2: s.clients[1],
            })
            .collect()
    }
}
