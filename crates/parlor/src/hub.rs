//! The hub: every registered client and the room directory.
//!
//! One task consumes a bounded queue of [`HubEvent`]s one at a time.
//! Room creation, deletion and every client's move between rooms happen
//! only inside that loop, so they are totally ordered without a lock
//! spanning rooms.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parlor_game::GameRegistry;
use parlor_protocol::{Envelope, RoomSummary};
use parlor_room::{LOBBY, Member, Room, RoomConfig};
use parlor_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{HubConfig, ParlorError, router};

/// The hub's record of a connected client.
#[derive(Debug)]
pub struct Registration {
    pub member: Arc<Member>,
    /// Cancelling this stops all of the client's pumps.
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub(crate) enum HubEvent {
    Register(Registration),
    Unregister(ConnectionId),
    JoinRoom {
        client: ConnectionId,
        room: String,
    },
    LeaveRoom(ConnectionId),
    /// A room-scoped envelope from a client whose room is gone.
    Inbound {
        client: ConnectionId,
        envelope: Envelope,
    },
    ListRooms(oneshot::Sender<Vec<RoomSummary>>),
    Shutdown,
}

/// Cheap, cloneable sender side of the hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    async fn send(&self, event: HubEvent) -> Result<(), ParlorError> {
        self.tx.send(event).await.map_err(|_| ParlorError::HubClosed)
    }

    /// Adds a client and puts it in the lobby.
    pub async fn register(&self, registration: Registration) -> Result<(), ParlorError> {
        self.send(HubEvent::Register(registration)).await
    }

    pub async fn unregister(&self, client: ConnectionId) -> Result<(), ParlorError> {
        self.send(HubEvent::Unregister(client)).await
    }

    pub async fn join_room(&self, client: ConnectionId, room: impl Into<String>) -> Result<(), ParlorError> {
        self.send(HubEvent::JoinRoom {
            client,
            room: room.into(),
        })
        .await
    }

    /// Sends the client back to the lobby.
    pub async fn leave_room(&self, client: ConnectionId) -> Result<(), ParlorError> {
        self.send(HubEvent::LeaveRoom(client)).await
    }

    pub async fn inbound(&self, client: ConnectionId, envelope: Envelope) -> Result<(), ParlorError> {
        self.send(HubEvent::Inbound { client, envelope }).await
    }

    /// Every room, lobby first, then by name.
    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, ParlorError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubEvent::ListRooms(reply)).await?;
        rx.await.map_err(|_| ParlorError::HubClosed)
    }

    /// Stops the hub: every client is cancelled and every room closed.
    pub async fn shutdown(&self) -> Result<(), ParlorError> {
        self.send(HubEvent::Shutdown).await
    }
}

pub struct Hub {
    rooms: BTreeMap<String, Arc<Room>>,
    clients: HashMap<ConnectionId, Registration>,
    registry: Arc<GameRegistry>,
    room_config: RoomConfig,
    rx: mpsc::Receiver<HubEvent>,
}

impl Hub {
    /// Creates the lobby and starts the hub loop.
    pub fn spawn(config: HubConfig, room_config: RoomConfig, registry: GameRegistry) -> (HubHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.event_buffer);
        let registry = Arc::new(registry);
        let lobby = Room::spawn(LOBBY, Arc::clone(&registry), room_config);
        let hub = Self {
            rooms: BTreeMap::from([(LOBBY.to_owned(), lobby)]),
            clients: HashMap::new(),
            registry,
            room_config,
            rx,
        };
        let task = tokio::spawn(hub.run());
        (HubHandle { tx }, task)
    }

    async fn run(mut self) {
        info!("hub started");
        while let Some(event) = self.rx.recv().await {
            match event {
                HubEvent::Register(registration) => self.register(registration).await,
                HubEvent::Unregister(client) => self.unregister(client).await,
                HubEvent::JoinRoom { client, room } => self.join_room(client, &room).await,
                HubEvent::LeaveRoom(client) => self.join_room(client, LOBBY).await,
                HubEvent::Inbound { client, envelope } => self.inbound(client, envelope).await,
                HubEvent::ListRooms(reply) => {
                    let _ = reply.send(self.list_rooms().await);
                }
                HubEvent::Shutdown => break,
            }
        }

        for (_, registration) in self.clients.drain() {
            registration.cancel.cancel();
        }
        for room in self.rooms.values() {
            room.close();
        }
        info!("hub stopped");
    }

    async fn register(&mut self, registration: Registration) {
        let member = Arc::clone(&registration.member);
        info!(client = %member.id(), user = %member.user_id(), "client registered");
        self.clients.insert(member.id(), registration);
        self.enter(member, LOBBY).await;
    }

    async fn unregister(&mut self, client: ConnectionId) {
        let Some(registration) = self.clients.remove(&client) else {
            debug!(%client, "unregister for unknown client");
            return;
        };
        self.depart(&registration.member).await;
        registration.cancel.cancel();
        info!(%client, user = %registration.member.user_id(), "client unregistered");
    }

    async fn join_room(&mut self, client: ConnectionId, name: &str) {
        let Some(member) = self.clients.get(&client).map(|r| Arc::clone(&r.member)) else {
            debug!(%client, room = name, "join for unknown client");
            return;
        };
        if member.room().is_some_and(|room| room.name() == name) {
            return;
        }
        self.depart(&member).await;
        self.enter(member, name).await;
    }

    async fn inbound(&mut self, client: ConnectionId, envelope: Envelope) {
        let Some(member) = self.clients.get(&client).map(|r| Arc::clone(&r.member)) else {
            return;
        };
        let room = match member.room() {
            Some(room) => room,
            None => {
                warn!(%client, "client has no room, returning it to the lobby");
                member.send(&Envelope::error("You are not in a room. Returning to the lobby."));
                self.enter(Arc::clone(&member), LOBBY).await;
                self.lobby()
            }
        };
        router::to_room(&room, &member, &envelope).await;
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms = Vec::with_capacity(self.rooms.len());
        for room in self.rooms.values() {
            rooms.push(room.summary().await);
        }
        rooms.sort_by(|a, b| (a.name != LOBBY, &a.name).cmp(&(b.name != LOBBY, &b.name)));
        rooms
    }

    /// Adds `member` to `name`, creating the room on first use.
    async fn enter(&mut self, member: Arc<Member>, name: &str) {
        let room = match self.rooms.get(name) {
            Some(room) => Arc::clone(room),
            None => {
                let room = Room::spawn(name, Arc::clone(&self.registry), self.room_config);
                info!(room = name, "room created");
                self.rooms.insert(name.to_owned(), Arc::clone(&room));
                room
            }
        };
        room.add_client(member).await;
    }

    /// Takes `member` out of its current room, deleting the room if that
    /// emptied it.
    async fn depart(&mut self, member: &Member) {
        let Some(room) = member.room() else {
            return;
        };
        let remaining = room.remove_client(member).await;
        if remaining == 0 && !room.is_lobby() {
            let is_current = self
                .rooms
                .get(room.name())
                .is_some_and(|listed| Arc::ptr_eq(listed, &room));
            if is_current {
                self.rooms.remove(room.name());
                room.close();
                info!(room = %room.name(), "room deleted");
            }
        }
    }

    fn lobby(&mut self) -> Arc<Room> {
        let registry = Arc::clone(&self.registry);
        let config = self.room_config;
        Arc::clone(
            self.rooms
                .entry(LOBBY.to_owned())
                .or_insert_with(|| Room::spawn(LOBBY, registry, config)),
        )
    }
}
