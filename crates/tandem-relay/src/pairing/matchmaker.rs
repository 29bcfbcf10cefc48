//! Matchmaker: the one critical section for all pairing state.
//!
//! Queue and session table live under a single mutex so that
//! dequeue-two-and-create-session is one atomic step per operation: no client
//! can be placed into two sessions, or stay queued after being paired, no
//! matter how connection tasks interleave. The lock is held only for map
//! mutation; every notification happens after release, driven by the outcome
//! structs returned here.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use tandem_core::protocol::{ChatMode, ChatSummary};

use super::queue::WaitQueue;
use super::sessions::{Session, SessionTable};

/// Why a session ended. Affects logging only; the survivor always hears
/// `partner_disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Partner sent an explicit `leave`.
    PeerLeft,
    /// Partner's transport dropped.
    PeerDropped,
    /// Partner asked for a new match while still paired.
    PeerRequeued,
}

/// A session torn down by leave, disconnect, or re-queue. The transport layer
/// notifies `survivor` and the admin hub from this.
#[derive(Debug, Clone)]
pub struct EndedSession {
    pub session_id: Uuid,
    pub mode: ChatMode,
    pub survivor: Uuid,
    pub reason: EndReason,
    pub lasted: Duration,
}

/// A fresh pairing; both members get `partner_found`.
#[derive(Debug, Clone, Copy)]
pub struct PairedSession {
    pub session_id: Uuid,
    pub mode: ChatMode,
    pub first: Uuid,
    pub second: Uuid,
}

#[derive(Debug)]
pub enum Enqueued {
    /// Queued; nobody compatible is waiting yet.
    Waiting,
    /// Matched with the longest-waiting compatible client.
    Paired(PairedSession),
}

/// Result of one `find_partner` call. `ended` is set when the caller was
/// still in a session (implicit leave).
#[derive(Debug)]
pub struct EnqueueOutcome {
    pub ended: Option<EndedSession>,
    pub result: Enqueued,
}

#[derive(Default)]
struct PairingState {
    queue: WaitQueue,
    sessions: SessionTable,
}

#[derive(Default)]
pub struct Matchmaker {
    state: Mutex<PairingState>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    // Mutators are short and panic-free, so a poisoned lock only means a
    // sibling task died mid-read; the data is still consistent.
    fn lock(&self) -> MutexGuard<'_, PairingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter the wait queue, ending any current session first, and pair
    /// immediately when a compatible client is already waiting.
    pub fn find_partner(&self, client: Uuid, mode: ChatMode) -> EnqueueOutcome {
        let mut state = self.lock();

        let ended = end_locked(&mut state, client, EndReason::PeerRequeued);

        state.queue.enqueue(client, mode);
        let result = match state.queue.pop_pair(mode) {
            Some((first, second)) => {
                let session = state.sessions.create(mode, first, second);
                Enqueued::Paired(PairedSession {
                    session_id: session.id,
                    mode,
                    first,
                    second,
                })
            }
            None => Enqueued::Waiting,
        };

        EnqueueOutcome { ended, result }
    }

    /// Explicit `leave`: drop any queue entry and end any session.
    pub fn leave(&self, client: Uuid) -> Option<EndedSession> {
        let mut state = self.lock();
        state.queue.remove(client);
        end_locked(&mut state, client, EndReason::PeerLeft)
    }

    /// Transport loss: same teardown as `leave`, different log reason.
    pub fn disconnect(&self, client: Uuid) -> Option<EndedSession> {
        let mut state = self.lock();
        state.queue.remove(client);
        end_locked(&mut state, client, EndReason::PeerDropped)
    }

    pub fn session_of(&self, client: Uuid) -> Option<Session> {
        self.lock().sessions.session_of(client).cloned()
    }

    pub fn session_exists(&self, id: Uuid) -> bool {
        self.lock().sessions.contains(id)
    }

    pub fn snapshot(&self) -> Vec<ChatSummary> {
        self.lock().sessions.snapshot()
    }

    pub fn is_waiting(&self, client: Uuid) -> bool {
        self.lock().queue.is_waiting(client)
    }

    pub fn waiting_count(&self) -> usize {
        self.lock().queue.waiting_count()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}

fn end_locked(
    state: &mut PairingState,
    client: Uuid,
    reason: EndReason,
) -> Option<EndedSession> {
    let session = state.sessions.end_by_client(client)?;
    let survivor = session.partner_of(client)?;
    Some(EndedSession {
        session_id: session.id,
        mode: session.mode,
        survivor,
        reason,
        lasted: session.created_at.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn assert_exclusive(m: &Matchmaker, client: Uuid) {
        let queued = m.is_waiting(client);
        let paired = m.session_of(client).is_some();
        assert!(!(queued && paired), "client {client} both queued and paired");
    }

    #[test]
    fn pairs_in_arrival_order() {
        let m = Matchmaker::new();
        let c = ids(4);

        assert!(matches!(m.find_partner(c[0], ChatMode::Text).result, Enqueued::Waiting));
        let paired = match m.find_partner(c[1], ChatMode::Text).result {
            Enqueued::Paired(p) => p,
            other => panic!("expected pair, got {other:?}"),
        };
        assert_eq!((paired.first, paired.second), (c[0], c[1]));

        // Next two arrivals form the next session.
        assert!(matches!(m.find_partner(c[2], ChatMode::Text).result, Enqueued::Waiting));
        let paired = match m.find_partner(c[3], ChatMode::Text).result {
            Enqueued::Paired(p) => p,
            other => panic!("expected pair, got {other:?}"),
        };
        assert_eq!((paired.first, paired.second), (c[2], c[3]));

        assert_eq!(m.session_count(), 2);
        assert_eq!(m.waiting_count(), 0);
        for client in c {
            assert_exclusive(&m, client);
        }
    }

    #[test]
    fn modes_never_cross() {
        let m = Matchmaker::new();
        let c = ids(2);
        m.find_partner(c[0], ChatMode::Text);
        let outcome = m.find_partner(c[1], ChatMode::Video);

        assert!(matches!(outcome.result, Enqueued::Waiting));
        assert_eq!(m.waiting_count(), 2);
        assert_eq!(m.session_count(), 0);
    }

    #[test]
    fn reenqueue_while_waiting_is_idempotent() {
        let m = Matchmaker::new();
        let c = ids(1);
        m.find_partner(c[0], ChatMode::Text);
        let outcome = m.find_partner(c[0], ChatMode::Text);

        assert!(outcome.ended.is_none());
        assert!(matches!(outcome.result, Enqueued::Waiting));
        assert_eq!(m.waiting_count(), 1);
    }

    #[test]
    fn requeue_while_paired_ends_session_and_notifies_partner() {
        let m = Matchmaker::new();
        let c = ids(2);
        m.find_partner(c[0], ChatMode::Text);
        m.find_partner(c[1], ChatMode::Text);
        let session = m.session_of(c[0]).unwrap();

        // "Next": c0 asks again while paired.
        let outcome = m.find_partner(c[0], ChatMode::Text);
        let ended = outcome.ended.unwrap();
        assert_eq!(ended.session_id, session.id);
        assert_eq!(ended.survivor, c[1]);
        assert_eq!(ended.reason, EndReason::PeerRequeued);
        assert!(matches!(outcome.result, Enqueued::Waiting));

        // Survivor's lookup is gone, seeker is queued.
        assert!(m.session_of(c[1]).is_none());
        assert!(m.is_waiting(c[0]));
        assert_exclusive(&m, c[0]);
        assert_exclusive(&m, c[1]);
    }

    #[test]
    fn leave_ends_session_once() {
        let m = Matchmaker::new();
        let c = ids(2);
        m.find_partner(c[0], ChatMode::Video);
        m.find_partner(c[1], ChatMode::Video);

        let ended = m.leave(c[1]).unwrap();
        assert_eq!(ended.survivor, c[0]);
        assert_eq!(ended.reason, EndReason::PeerLeft);

        // Idempotent: both re-leaves are no-ops.
        assert!(m.leave(c[1]).is_none());
        assert!(m.leave(c[0]).is_none());
        assert_eq!(m.session_count(), 0);
    }

    #[test]
    fn leave_while_waiting_clears_queue_entry() {
        let m = Matchmaker::new();
        let c = ids(2);
        m.find_partner(c[0], ChatMode::Text);

        assert!(m.leave(c[0]).is_none());
        assert_eq!(m.waiting_count(), 0);

        // c0 is gone, so a new seeker waits instead of pairing.
        assert!(matches!(m.find_partner(c[1], ChatMode::Text).result, Enqueued::Waiting));
    }

    #[test]
    fn disconnect_reports_drop_reason_and_clears_state() {
        let m = Matchmaker::new();
        let c = ids(2);
        m.find_partner(c[0], ChatMode::Text);
        m.find_partner(c[1], ChatMode::Text);

        let ended = m.disconnect(c[0]).unwrap();
        assert_eq!(ended.reason, EndReason::PeerDropped);
        assert_eq!(ended.survivor, c[1]);
        assert!(m.session_of(c[1]).is_none());
        assert!(m.disconnect(c[0]).is_none());
    }

    #[test]
    fn survivor_can_requeue_and_pair_again() {
        let m = Matchmaker::new();
        let c = ids(3);
        m.find_partner(c[0], ChatMode::Text);
        m.find_partner(c[1], ChatMode::Text);
        m.disconnect(c[0]);

        m.find_partner(c[1], ChatMode::Text);
        let outcome = m.find_partner(c[2], ChatMode::Text);
        match outcome.result {
            Enqueued::Paired(p) => assert_eq!((p.first, p.second), (c[1], c[2])),
            other => panic!("expected pair, got {other:?}"),
        }
    }

    #[test]
    fn exclusivity_holds_across_random_walk() {
        let m = Matchmaker::new();
        let c = ids(5);

        m.find_partner(c[0], ChatMode::Text);
        m.find_partner(c[1], ChatMode::Text);
        m.find_partner(c[2], ChatMode::Video);
        m.find_partner(c[0], ChatMode::Text); // next
        m.find_partner(c[3], ChatMode::Video);
        m.leave(c[2]);
        m.find_partner(c[4], ChatMode::Text);
        m.disconnect(c[3]);
        m.find_partner(c[1], ChatMode::Video);

        for client in c {
            assert_exclusive(&m, client);
        }
    }
}
