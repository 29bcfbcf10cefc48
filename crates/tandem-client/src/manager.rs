//! Background actor that owns the transport and survives outages.
//!
//! [`ChatClient::start`] spawns the actor and hands back a cheap handle.
//! The handle talks to the actor over an unbounded command channel; the
//! actor reports back on the bounded event channel. When the transport
//! drops unexpectedly the actor redials with exponential backoff, and a
//! partner search that was in flight resumes on the fresh connection.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior, Sleep};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use tandem_core::protocol::{ChatMode, Envelope};
use tandem_core::{Result, TandemError};

use crate::event::{ChatEvent, ChatRecord, ConnectionState, Direction, DisconnectReason, SignalKind};
use crate::policy::ReconnectPolicy;
use crate::transport::{Dialer, Transport};

/// How long [`ChatClient::shutdown`] waits for the actor before aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Handle to the connection manager actor.
///
/// Cloning is deliberately not offered; the handle owns the actor and
/// aborts it on drop. Use [`ChatClient::shutdown`] for a graceful close.
pub struct ChatClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl ChatClient {
    /// Spawns the manager and starts dialing immediately.
    ///
    /// Returns the handle plus the event stream. The event channel holds
    /// `policy.event_channel_capacity` entries; if the embedder falls
    /// behind, intermediate events are dropped rather than stalling the
    /// connection, except the terminal [`ChatEvent::Disconnected`].
    pub fn start<D: Dialer>(
        dialer: D,
        mode: ChatMode,
        policy: ReconnectPolicy,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (event_tx, event_rx) = mpsc::channel(policy.event_channel_capacity.max(1));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let actor = Actor {
            dialer,
            policy,
            mode,
            cmd_rx,
            events: event_tx,
            state: ConnectionState::Disconnected,
            attempts: 0,
            next_delay: Duration::ZERO,
            waiting: false,
            partner: None,
            history: Vec::new(),
            quit: false,
        };
        let task = tokio::spawn(actor.run());
        (
            Self {
                cmd_tx,
                task: Some(task),
            },
            event_rx,
        )
    }

    /// Asks the relay for a partner. Clears the chat history and, if
    /// currently paired, leaves that pairing first. Fails with
    /// [`TandemError::NotConnected`] while a redial is pending and with
    /// [`TandemError::ReconnectExhausted`] once the connection is
    /// terminally down.
    pub async fn find_partner(&self) -> Result<()> {
        self.request(|reply| Command::FindPartner { reply }).await?
    }

    /// Sends one chat line to the current partner.
    ///
    /// An error means the line was not handed to the transport; the caller
    /// keeps the content and decides whether to retry.
    pub async fn send_message(&self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        self.request(move |reply| Command::SendMessage { content, reply })
            .await?
    }

    /// Leaves the current pairing but keeps the connection open.
    pub async fn leave(&self) -> Result<()> {
        self.request(|reply| Command::Leave { reply }).await?
    }

    /// Manual reconnect. With the transport down this redials right away
    /// and resets the backoff budget; on a healthy connection it restarts
    /// the partner search instead.
    pub fn reconnect(&self) -> Result<()> {
        self.cmd_tx
            .send(Command::Reconnect)
            .map_err(|_| manager_stopped())
    }

    /// Chat mode used by subsequent partner searches.
    pub fn set_mode(&self, mode: ChatMode) -> Result<()> {
        self.cmd_tx
            .send(Command::SetMode(mode))
            .map_err(|_| manager_stopped())
    }

    /// Identifier of the current partner, if paired.
    pub async fn partner(&self) -> Result<Option<Uuid>> {
        self.request(|reply| Command::Partner { reply }).await
    }

    /// Chat lines exchanged within the current pairing, oldest first.
    pub async fn history(&self) -> Result<Vec<ChatRecord>> {
        self.request(|reply| Command::History { reply }).await
    }

    pub async fn state(&self) -> ConnectionState {
        self.request(|reply| Command::State { reply })
            .await
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Closes the connection and stops the actor. Waits briefly for a
    /// graceful exit, then aborts.
    pub async fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                warn!("connection manager did not stop in time, aborting");
                task.abort();
            }
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(make(reply_tx))
            .map_err(|_| manager_stopped())?;
        reply_rx.await.map_err(|_| manager_stopped())
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn manager_stopped() -> TandemError {
    TandemError::Internal("connection manager stopped".into())
}

enum Command {
    FindPartner { reply: oneshot::Sender<Result<()>> },
    SendMessage { content: String, reply: oneshot::Sender<Result<()>> },
    Leave { reply: oneshot::Sender<Result<()>> },
    Reconnect,
    SetMode(ChatMode),
    Partner { reply: oneshot::Sender<Option<Uuid>> },
    History { reply: oneshot::Sender<Vec<ChatRecord>> },
    State { reply: oneshot::Sender<ConnectionState> },
    Shutdown,
}

/// Outcome of handling one command on an open connection.
enum CommandFlow {
    Continue,
    Lost,
    Quit,
}

/// Outcome of handling one command with no transport.
enum OfflineFlow {
    Stay,
    Redial,
    Quit,
}

struct Actor<D> {
    dialer: D,
    policy: ReconnectPolicy,
    mode: ChatMode,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<ChatEvent>,
    state: ConnectionState,
    /// Redials already burned this outage. Reset on connect and on manual
    /// reconnect.
    attempts: u32,
    next_delay: Duration,
    /// True while a partner search is unanswered. Survives redials so the
    /// search can resume on the fresh connection.
    waiting: bool,
    partner: Option<Uuid>,
    history: Vec<ChatRecord>,
    quit: bool,
}

impl<D: Dialer> Actor<D> {
    async fn run(mut self) {
        self.set_state(ConnectionState::Connecting);
        while !self.quit {
            match self.state {
                ConnectionState::Connecting => self.drive_dial().await,
                ConnectionState::Reconnecting => self.drive_backoff().await,
                ConnectionState::Disconnected => self.drive_idle().await,
                // drive_dial leaves Connected behind before returning.
                ConnectionState::Connected => self.set_state(ConnectionState::Connecting),
            }
        }
        debug!("connection manager stopped");
    }

    async fn drive_dial(&mut self) {
        match self.dialer.dial().await {
            Ok(transport) => {
                info!("connected");
                self.attempts = 0;
                self.set_state(ConnectionState::Connected);
                self.emit(ChatEvent::Connected);
                self.drive_connected(transport).await;
            }
            Err(err) => {
                warn!(error = %err, "dial failed");
                self.schedule_reconnect().await;
            }
        }
    }

    async fn drive_connected(&mut self, mut transport: Box<dyn Transport>) {
        let mut heartbeat = interval(self.policy.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the first real beat comes
        // one full interval after connecting.
        heartbeat.tick().await;

        // A search interrupted by an outage resumes after a settle delay.
        let mut resume: Option<Pin<Box<Sleep>>> = self
            .waiting
            .then(|| Box::pin(sleep(self.policy.resume_delay)));

        loop {
            tokio::select! {
                inbound = transport.recv() => match inbound {
                    Some(Ok(frame)) => self.handle_frame(&frame),
                    Some(Err(err)) => {
                        warn!(error = %err, "transport failed");
                        let _ = transport.close().await;
                        self.schedule_reconnect().await;
                        return;
                    }
                    None => {
                        debug!("connection closed by the server");
                        let _ = transport.close().await;
                        self.schedule_reconnect().await;
                        return;
                    }
                },

                _ = heartbeat.tick() => {
                    if let Err(err) = send_envelope(transport.as_mut(), &Envelope::Ping).await {
                        warn!(error = %err, "heartbeat write failed");
                        let _ = transport.close().await;
                        self.schedule_reconnect().await;
                        return;
                    }
                }

                _ = async { if let Some(timer) = resume.as_mut() { timer.await } }, if resume.is_some() => {
                    resume = None;
                    if self.waiting && self.partner.is_none() {
                        debug!("resuming interrupted partner search");
                        if self.begin_search(transport.as_mut()).await.is_err() {
                            let _ = transport.close().await;
                            self.schedule_reconnect().await;
                            return;
                        }
                    }
                }

                cmd = self.cmd_rx.recv() => match self.on_command(transport.as_mut(), cmd).await {
                    CommandFlow::Continue => {}
                    CommandFlow::Lost => {
                        let _ = transport.close().await;
                        self.schedule_reconnect().await;
                        return;
                    }
                    CommandFlow::Quit => {
                        let _ = transport.close().await;
                        self.finish_clean().await;
                        return;
                    }
                },
            }
        }
    }

    async fn on_command(&mut self, transport: &mut dyn Transport, cmd: Option<Command>) -> CommandFlow {
        let Some(cmd) = cmd else {
            // Every handle is gone; nobody is left to observe the session.
            return CommandFlow::Quit;
        };
        match cmd {
            Command::Shutdown => CommandFlow::Quit,
            Command::FindPartner { reply } => {
                let result = self.begin_search(transport).await;
                let lost = result.is_err();
                let _ = reply.send(result);
                if lost {
                    CommandFlow::Lost
                } else {
                    CommandFlow::Continue
                }
            }
            Command::SendMessage { content, reply } => {
                let timestamp = now_ms();
                let envelope = Envelope::TextMessage {
                    content: content.clone(),
                    timestamp,
                };
                if let Err(err) = envelope.validate() {
                    let _ = reply.send(Err(err));
                    return CommandFlow::Continue;
                }
                match send_envelope(transport, &envelope).await {
                    Ok(()) => {
                        self.history.push(ChatRecord {
                            direction: Direction::Sent,
                            content,
                            timestamp,
                        });
                        let _ = reply.send(Ok(()));
                        CommandFlow::Continue
                    }
                    Err(err) => {
                        let _ = reply.send(Err(err));
                        CommandFlow::Lost
                    }
                }
            }
            Command::Leave { reply } => {
                self.partner = None;
                self.waiting = false;
                let result = send_envelope(transport, &Envelope::Leave).await;
                let lost = result.is_err();
                let _ = reply.send(result);
                if lost {
                    CommandFlow::Lost
                } else {
                    CommandFlow::Continue
                }
            }
            Command::Reconnect => {
                // The transport is healthy, so this is a search restart,
                // not a redial.
                if self.begin_search(transport).await.is_err() {
                    CommandFlow::Lost
                } else {
                    CommandFlow::Continue
                }
            }
            Command::SetMode(mode) => {
                self.mode = mode;
                CommandFlow::Continue
            }
            Command::Partner { reply } => {
                let _ = reply.send(self.partner);
                CommandFlow::Continue
            }
            Command::History { reply } => {
                let _ = reply.send(self.history.clone());
                CommandFlow::Continue
            }
            Command::State { reply } => {
                let _ = reply.send(self.state);
                CommandFlow::Continue
            }
        }
    }

    /// Starts a fresh partner search: drops the old pairing and history,
    /// then asks the relay for a new partner.
    async fn begin_search(&mut self, transport: &mut dyn Transport) -> Result<()> {
        self.history.clear();
        if self.partner.take().is_some() {
            send_envelope(transport, &Envelope::Leave).await?;
        }
        send_envelope(transport, &Envelope::FindPartner { mode: self.mode }).await?;
        self.waiting = true;
        Ok(())
    }

    fn handle_frame(&mut self, text: &str) {
        let envelope = match Envelope::from_frame(text) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(error = %err, "ignoring unreadable frame");
                return;
            }
        };
        let tag = envelope.tag();
        match envelope {
            Envelope::PartnerFound { partner_id } => {
                info!(%partner_id, "paired");
                self.partner = Some(partner_id);
                self.waiting = false;
                self.emit(ChatEvent::PartnerFound { partner_id });
            }
            Envelope::PartnerDisconnected => {
                info!("partner disconnected");
                self.partner = None;
                self.waiting = false;
                self.emit(ChatEvent::PartnerDisconnected);
            }
            Envelope::TextMessage { content, timestamp } => {
                self.history.push(ChatRecord {
                    direction: Direction::Received,
                    content: content.clone(),
                    timestamp,
                });
                self.emit(ChatEvent::MessageReceived { content, timestamp });
            }
            Envelope::Offer { sdp } => self.emit(ChatEvent::Signal {
                kind: SignalKind::Offer,
                payload: sdp,
            }),
            Envelope::Answer { sdp } => self.emit(ChatEvent::Signal {
                kind: SignalKind::Answer,
                payload: sdp,
            }),
            Envelope::IceCandidate { candidate } => self.emit(ChatEvent::Signal {
                kind: SignalKind::IceCandidate,
                payload: candidate,
            }),
            Envelope::Error { message } => {
                warn!(%message, "server reported an error");
                self.emit(ChatEvent::ErrorNotice { message });
            }
            Envelope::Pong => trace!("pong"),
            Envelope::Join | Envelope::Leave | Envelope::Ping | Envelope::FindPartner { .. } => {
                debug!(tag, "ignoring unexpected frame");
            }
        }
    }

    async fn drive_backoff(&mut self) {
        let backoff = sleep(self.next_delay);
        tokio::pin!(backoff);
        loop {
            tokio::select! {
                _ = &mut backoff => {
                    self.set_state(ConnectionState::Connecting);
                    return;
                }
                cmd = self.cmd_rx.recv() => match self.on_offline_command(cmd) {
                    OfflineFlow::Stay => {}
                    OfflineFlow::Redial => {
                        self.set_state(ConnectionState::Connecting);
                        return;
                    }
                    OfflineFlow::Quit => {
                        self.finish_clean().await;
                        return;
                    }
                },
            }
        }
    }

    async fn drive_idle(&mut self) {
        loop {
            let cmd = self.cmd_rx.recv().await;
            match self.on_offline_command(cmd) {
                OfflineFlow::Stay => {}
                OfflineFlow::Redial => {
                    self.set_state(ConnectionState::Connecting);
                    return;
                }
                OfflineFlow::Quit => {
                    self.finish_clean().await;
                    return;
                }
            }
        }
    }

    /// What a traffic command gets while the transport is down: transient
    /// during a pending redial, terminal once the budget is spent.
    fn offline_error(&self) -> TandemError {
        if self.state == ConnectionState::Disconnected {
            TandemError::ReconnectExhausted
        } else {
            TandemError::NotConnected
        }
    }

    fn on_offline_command(&mut self, cmd: Option<Command>) -> OfflineFlow {
        let Some(cmd) = cmd else {
            return OfflineFlow::Quit;
        };
        match cmd {
            Command::Shutdown => OfflineFlow::Quit,
            Command::Reconnect => {
                debug!("manual reconnect requested");
                self.attempts = 0;
                self.waiting = true;
                OfflineFlow::Redial
            }
            Command::FindPartner { reply } => {
                let _ = reply.send(Err(self.offline_error()));
                OfflineFlow::Stay
            }
            Command::SendMessage { reply, .. } => {
                let _ = reply.send(Err(self.offline_error()));
                OfflineFlow::Stay
            }
            Command::Leave { reply } => {
                let _ = reply.send(Err(self.offline_error()));
                OfflineFlow::Stay
            }
            Command::SetMode(mode) => {
                self.mode = mode;
                OfflineFlow::Stay
            }
            Command::Partner { reply } => {
                let _ = reply.send(self.partner);
                OfflineFlow::Stay
            }
            Command::History { reply } => {
                let _ = reply.send(self.history.clone());
                OfflineFlow::Stay
            }
            Command::State { reply } => {
                let _ = reply.send(self.state);
                OfflineFlow::Stay
            }
        }
    }

    /// Burns one redial attempt, or goes terminal once the budget is spent.
    /// The pairing is void either way; `waiting` survives so an unanswered
    /// search can resume after the redial.
    async fn schedule_reconnect(&mut self) {
        self.partner = None;
        if self.attempts < self.policy.max_attempts {
            let delay = self.policy.backoff_delay(self.attempts);
            self.attempts += 1;
            self.next_delay = delay;
            self.set_state(ConnectionState::Reconnecting);
            debug!(attempt = self.attempts, delay_ms = delay.as_millis() as u64, "redial scheduled");
            self.emit(ChatEvent::Reconnecting {
                attempt: self.attempts,
                delay,
            });
        } else {
            warn!(attempts = self.attempts, "redial budget exhausted, giving up");
            self.waiting = false;
            self.set_state(ConnectionState::Disconnected);
            self.emit_disconnected(DisconnectReason::Exhausted).await;
        }
    }

    async fn finish_clean(&mut self) {
        self.partner = None;
        self.waiting = false;
        self.quit = true;
        if self.state != ConnectionState::Disconnected {
            self.set_state(ConnectionState::Disconnected);
            self.emit_disconnected(DisconnectReason::Clean).await;
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            trace!(?state, "state change");
            self.state = state;
        }
    }

    /// Lossy delivery. A slow embedder loses intermediate events instead
    /// of stalling the connection.
    fn emit(&self, event: ChatEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(dropped = ?std::mem::discriminant(&event), "event channel full");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("event channel closed");
            }
        }
    }

    /// Terminal notice; blocks rather than drops if the channel is full.
    async fn emit_disconnected(&mut self, reason: DisconnectReason) {
        if self
            .events
            .send(ChatEvent::Disconnected { reason })
            .await
            .is_err()
        {
            debug!("event channel closed before disconnect notice");
        }
    }
}

async fn send_envelope(transport: &mut dyn Transport, envelope: &Envelope) -> Result<()> {
    let frame = serde_json::to_string(envelope)
        .map_err(|err| TandemError::Internal(format!("envelope encode failed: {err}")))?;
    transport.send(frame).await
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
