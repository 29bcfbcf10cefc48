//! Per-mode FIFO wait queue.
//!
//! Not synchronized on its own: the matchmaker wraps it, together with the
//! session table, in one mutex so enqueue-and-pair stays atomic.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use tandem_core::protocol::ChatMode;

#[derive(Default)]
pub struct WaitQueue {
    lanes: HashMap<ChatMode, VecDeque<Uuid>>,
    members: HashMap<Uuid, ChatMode>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `client` to the tail of the `mode` lane.
    ///
    /// Re-enqueueing with the same mode is a no-op so a nervous client
    /// re-sending `find_partner` keeps its place in line. A different mode
    /// moves the client to the tail of the new lane.
    pub fn enqueue(&mut self, client: Uuid, mode: ChatMode) {
        match self.members.get(&client) {
            Some(current) if *current == mode => return,
            Some(_) => {
                self.remove(client);
            }
            None => {}
        }
        self.lanes.entry(mode).or_default().push_back(client);
        self.members.insert(client, mode);
    }

    /// Drop `client` from whatever lane holds it. Returns false if it was not
    /// waiting.
    pub fn remove(&mut self, client: Uuid) -> bool {
        let Some(mode) = self.members.remove(&client) else {
            return false;
        };
        if let Some(lane) = self.lanes.get_mut(&mode) {
            lane.retain(|c| *c != client);
        }
        true
    }

    /// Pop the two longest-waiting clients of `mode`, oldest first.
    pub fn pop_pair(&mut self, mode: ChatMode) -> Option<(Uuid, Uuid)> {
        let lane = self.lanes.get_mut(&mode)?;
        if lane.len() < 2 {
            return None;
        }
        let first = lane.pop_front()?;
        let second = lane.pop_front()?;
        self.members.remove(&first);
        self.members.remove(&second);
        Some((first, second))
    }

    pub fn is_waiting(&self, client: Uuid) -> bool {
        self.members.contains_key(&client)
    }

    pub fn waiting_count(&self) -> usize {
        self.members.len()
    }
}
