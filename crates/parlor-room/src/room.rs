//! A named room: its members, its game and the loop that ticks it.
//!
//! Members and the game sit behind one lock so that, for example,
//! detaching an emptied game and removing the last player are observed
//! together. Everything sent to members goes through
//! [`Member::deliver`], which never waits.

use std::sync::{Arc, Weak};
use std::time::Instant;

use parlor_game::{Departure, Game, GameError, GameRegistry, GameSnapshot, TickOutcome};
use parlor_protocol::{Envelope, Frame, MessageKind, RoomSummary, encode};
use parlor_tick::TickScheduler;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{GameAction, GameCommand, Member, RoomConfig, RoomError};

/// Name of the room every client starts in. It is never deleted.
pub const LOBBY: &str = "lobby";

#[derive(Default)]
struct RoomInner {
    /// Join order.
    members: Vec<Arc<Member>>,
    game: Option<Game>,
}

impl RoomInner {
    fn fan_out(&self, frame: &Frame) {
        for member in &self.members {
            member.deliver(frame);
        }
    }

    fn broadcast(&self, envelope: &Envelope) {
        match encode(envelope) {
            Ok(frame) => self.fan_out(&frame),
            Err(e) => error!(kind = %envelope.kind, error = %e, "failed to encode broadcast"),
        }
    }

    fn client_list(&self, room: &str) -> Envelope {
        let names = self
            .members
            .iter()
            .map(|m| m.display_name().to_owned())
            .collect();
        Envelope::client_list(room, names)
    }

    fn game_frame(&mut self, room: &str) -> Option<Frame> {
        let snapshot = self
            .game
            .as_ref()
            .map_or_else(GameSnapshot::empty, Game::snapshot);
        match Envelope::from_server(MessageKind::GameState, &snapshot).and_then(|e| encode(&e)) {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!(room, error = %e, "failed to serialize game snapshot, resetting game");
                self.game = None;
                Envelope::from_server(MessageKind::GameState, &GameSnapshot::empty())
                    .and_then(|e| encode(&e))
                    .ok()
            }
        }
    }

    /// Sends the current game snapshot to every member.
    fn broadcast_game(&mut self, room: &str) {
        if let Some(frame) = self.game_frame(room) {
            self.fan_out(&frame);
        }
    }
}

/// One named room.
pub struct Room {
    name: String,
    inner: Mutex<RoomInner>,
    registry: Arc<GameRegistry>,
    config: RoomConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Room {
    /// Creates a room without a tick loop.
    pub fn new(name: impl Into<String>, registry: Arc<GameRegistry>, config: RoomConfig) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            inner: Mutex::new(RoomInner::default()),
            registry,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Creates a room and starts its background tick loop.
    ///
    /// The loop holds only a weak reference and ends when the room is
    /// closed or dropped.
    pub fn spawn(name: impl Into<String>, registry: Arc<GameRegistry>, config: RoomConfig) -> Arc<Self> {
        let room = Self::new(name, registry, config);
        tokio::spawn(tick_loop(
            Arc::downgrade(&room),
            room.cancel.clone(),
            config.tick_interval,
            room.name.clone(),
        ));
        room
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_lobby(&self) -> bool {
        self.name == LOBBY
    }

    /// Stops the tick loop. Members are not notified.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Adds `member`, confirms the join to it and tells everyone.
    ///
    /// A member whose seat is being held in a paused game is put back in
    /// it.
    pub async fn add_client(self: &Arc<Self>, member: Arc<Member>) {
        member.set_room(self);

        let mut inner = self.inner.lock().await;
        if !inner.members.iter().any(|m| m.id() == member.id()) {
            inner.members.push(Arc::clone(&member));
        }
        member.send(&Envelope::room_joined(&self.name));
        info!(room = %self.name, client = %member.id(), user = %member.user_id(), "client joined room");

        let rejoined = inner
            .game
            .as_mut()
            .is_some_and(|game| game.is_disconnected(member.user_id()) && game.rejoin(member.user_id()));
        if rejoined {
            info!(room = %self.name, user = %member.user_id(), "player rejoined game");
            inner.broadcast_game(&self.name);
        }

        inner.broadcast(&Envelope::status(format!(
            "{} has joined the room.",
            member.display_name()
        )));
        inner.broadcast(&inner.client_list(&self.name));
    }

    /// Removes `member` if present and returns how many members remain.
    ///
    /// A seated player leaving this way keeps their seat for the
    /// reconnection window. The seat is left alone while another
    /// connection of the same user is still in the room.
    pub async fn remove_client(&self, member: &Member) -> usize {
        let remaining = {
            let mut inner = self.inner.lock().await;
            let Some(pos) = inner.members.iter().position(|m| m.id() == member.id()) else {
                return inner.members.len();
            };
            inner.members.remove(pos);

            let had_game = inner.game.is_some();
            let still_here = inner.members.iter().any(|m| m.user_id() == member.user_id());
            if still_here {
                debug!(room = %self.name, user = %member.user_id(), "user still connected, seat kept");
            } else if let Some(game) = inner.game.as_mut() {
                match game.leave(member.user_id(), false, now()) {
                    Ok(Departure::Emptied) => {
                        info!(room = %self.name, "last player left, detaching game");
                        inner.game = None;
                    }
                    Ok(Departure::Paused) => {
                        info!(room = %self.name, user = %member.user_id(), "game paused for reconnect");
                    }
                    Ok(Departure::Removed) | Err(GameError::NotAPlayer(_)) => {}
                    Err(e) => debug!(room = %self.name, error = %e, "leave ignored by game"),
                }
            }
            if had_game {
                inner.broadcast_game(&self.name);
            }

            inner.broadcast(&Envelope::status(format!(
                "{} has left the room.",
                member.display_name()
            )));
            inner.broadcast(&inner.client_list(&self.name));
            info!(room = %self.name, client = %member.id(), remaining = inner.members.len(), "client left room");
            inner.members.len()
        };
        member.clear_room(self);
        remaining
    }

    /// Fans a chat or signaling envelope out to every member.
    pub async fn relay(&self, envelope: &Envelope) -> Result<(), RoomError> {
        let frame = encode(envelope)?;
        let inner = self.inner.lock().await;
        debug!(room = %self.name, kind = %envelope.kind, members = inner.members.len(), "relaying");
        inner.fan_out(&frame);
        Ok(())
    }

    /// Runs one `game_state` request from `member`.
    ///
    /// `get` answers the requester only. Every other action that succeeds
    /// ends with the new snapshot broadcast to all members. Errors leave
    /// the room untouched.
    pub async fn dispatch_game_action(&self, member: &Member, envelope: &Envelope) -> Result<(), RoomError> {
        let command: GameCommand = envelope.payload_as()?;
        let action = command.action()?;
        let player = member.user_id();

        let mut inner = self.inner.lock().await;
        match action {
            GameAction::Get => {
                if let Some(frame) = inner.game_frame(&self.name) {
                    member.deliver(&frame);
                }
                return Ok(());
            }
            GameAction::Create => {
                if inner.game.is_some() {
                    return Err(RoomError::GameExists);
                }
                let name = command
                    .game_name
                    .as_deref()
                    .ok_or(RoomError::MissingField("gameName"))?;
                let game = self.registry.create(name, player, self.config.timings)?;
                info!(room = %self.name, game = name, creator = player, "game created");
                inner.game = Some(game);
            }
            GameAction::Join => {
                let game = inner.game.as_mut().ok_or(RoomError::NoGame)?;
                if game.is_disconnected(player) {
                    game.rejoin(player);
                } else {
                    game.join(player)?;
                }
                debug!(room = %self.name, player, status = ?game.status(), "player joined game");
            }
            GameAction::Move => {
                let game = inner.game.as_mut().ok_or(RoomError::NoGame)?;
                let game_move = command
                    .game_move
                    .as_ref()
                    .ok_or(RoomError::MissingField("move"))?;
                game.make_move(player, game_move, now())?;
            }
            GameAction::Leave => {
                let game = inner.game.as_mut().ok_or(RoomError::NoGame)?;
                if game.leave(player, true, now())? == Departure::Emptied {
                    inner.game = None;
                }
            }
        }
        inner.broadcast_game(&self.name);
        Ok(())
    }

    /// The `get_clients` reply for this room.
    pub async fn client_list(&self) -> Envelope {
        self.inner.lock().await.client_list(&self.name)
    }

    pub async fn member_count(&self) -> usize {
        self.inner.lock().await.members.len()
    }

    pub async fn summary(&self) -> RoomSummary {
        let inner = self.inner.lock().await;
        RoomSummary {
            name: self.name.clone(),
            members: inner.members.len(),
            has_game: inner.game.is_some(),
        }
    }

    /// Advances time-driven game state.
    pub async fn tick(&self, now: Instant) {
        let mut inner = self.inner.lock().await;
        let Some(game) = inner.game.as_mut() else {
            return;
        };
        match game.tick(now) {
            TickOutcome::Idle => {}
            TickOutcome::Broadcast => inner.broadcast_game(&self.name),
            TickOutcome::Expired => {
                info!(room = %self.name, "finished game expired, detaching");
                inner.game = None;
                inner.broadcast_game(&self.name);
            }
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The clock the room feeds the game. Follows tokio's clock so paused
/// test time drives it.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn tick_loop(
    room: Weak<Room>,
    cancel: CancellationToken,
    interval: std::time::Duration,
    name: String,
) {
    let mut scheduler = TickScheduler::new(interval);
    debug!(room = %name, ?interval, "tick loop started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = scheduler.wait_for_tick() => {}
        }
        let Some(room) = room.upgrade() else {
            break;
        };
        room.tick(now()).await;
        drop(room);
        scheduler.record_tick_end();
    }
    debug!(room = %name, ticks = scheduler.tick_count(), "tick loop stopped");
}
