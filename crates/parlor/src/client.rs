//! Per-connection pumps.
//!
//! Each client runs three tasks sharing one [`CancellationToken`]:
//!
//! - **read** decodes inbound frames and routes them to the room or hub
//! - **write** drains the mailbox into the connection
//! - **keepalive** pings on an interval and expects a timely pong
//!
//! Whichever stops first tears the client down. Teardown runs once: it
//! cancels the token and asks the hub to unregister. The write pump is
//! the only place the mailbox receiver and the connection are closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parlor_protocol::{Envelope, Frame, MessageKind, RoomPayload, decode};
use parlor_room::Member;
use parlor_session::Identity;
use parlor_transport::{Connection, ConnectionId, Incoming};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::hub::{HubHandle, Registration};
use crate::{ConnectionConfig, ParlorError, router};

/// Runs a client until its connection ends or the hub drops it.
pub async fn run<C: Connection>(
    conn: C,
    identity: Identity,
    hub: HubHandle,
    config: ConnectionConfig,
) -> Result<(), ParlorError> {
    let conn = Arc::new(conn);
    let id = conn.id();
    let (tx, rx) = mpsc::channel(config.mailbox_capacity);
    let member = Arc::new(Member::new(id, identity, tx));
    let cancel = CancellationToken::new();

    if let Err(e) = hub
        .register(Registration {
            member: Arc::clone(&member),
            cancel: cancel.clone(),
        })
        .await
    {
        let _ = conn.close().await;
        return Err(e);
    }

    let teardown = Arc::new(Teardown {
        id,
        done: AtomicBool::new(false),
        cancel: cancel.clone(),
        hub: hub.clone(),
    });

    let reader = tokio::spawn(read_pump(
        Arc::clone(&conn),
        Arc::clone(&member),
        hub,
        config.max_message_size,
        Arc::clone(&teardown),
    ));
    let keepalive = tokio::spawn(keepalive_pump(Arc::clone(&conn), config, Arc::clone(&teardown)));
    drop(member);

    write_pump(conn, rx, config, teardown).await;

    let _ = reader.await;
    let _ = keepalive.await;
    debug!(client = %id, "client finished");
    Ok(())
}

struct Teardown {
    id: ConnectionId,
    done: AtomicBool,
    cancel: CancellationToken,
    hub: HubHandle,
}

impl Teardown {
    async fn run(&self) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        if self.hub.unregister(self.id).await.is_err() {
            debug!(client = %self.id, "hub already stopped");
        }
    }
}

async fn read_pump<C: Connection>(
    conn: Arc<C>,
    member: Arc<Member>,
    hub: HubHandle,
    max_message_size: usize,
    teardown: Arc<Teardown>,
) {
    let id = member.id();
    loop {
        let incoming = tokio::select! {
            _ = teardown.cancel.cancelled() => break,
            incoming = conn.recv() => incoming,
        };
        match incoming {
            Ok(Some(Incoming::Text(text))) if text.len() > max_message_size => {
                warn!(client = %id, size = text.len(), "oversized message rejected");
                member.send(&Envelope::error(format!(
                    "message too large: {} bytes (limit {max_message_size})",
                    text.len()
                )));
            }
            Ok(Some(Incoming::Text(text))) => {
                if handle_text(&member, &hub, &text).await.is_err() {
                    break;
                }
            }
            Ok(Some(Incoming::Binary(_))) => {
                member.send(&Envelope::error("binary frames are not supported"));
            }
            Ok(None) => {
                info!(client = %id, user = %member.user_id(), "connection closed");
                break;
            }
            Err(e) => {
                error!(client = %id, error = %e, "read failed");
                break;
            }
        }
    }
    teardown.run().await;
}

/// Decodes and routes one text frame. Only a stopped hub is an error.
async fn handle_text(member: &Arc<Member>, hub: &HubHandle, text: &str) -> Result<(), ParlorError> {
    let envelope = match decode(text) {
        Ok(envelope) => envelope.with_sender(member.user_id()),
        Err(e) => {
            warn!(client = %member.id(), error = %e, "undecodable message");
            member.send(&Envelope::error(e.to_string()));
            return Ok(());
        }
    };
    debug!(client = %member.id(), kind = %envelope.kind, "inbound");

    match envelope.kind {
        MessageKind::JoinRoom => match envelope.payload_as::<RoomPayload>() {
            Ok(RoomPayload { room_name }) if !room_name.trim().is_empty() => {
                hub.join_room(member.id(), room_name).await?;
            }
            Ok(_) => {
                member.send(&Envelope::error("roomName must not be empty"));
            }
            Err(e) => {
                member.send(&Envelope::error(e.to_string()));
            }
        },
        MessageKind::LeaveRoom => hub.leave_room(member.id()).await?,
        MessageKind::GetRooms => {
            let rooms = hub.list_rooms().await?;
            match Envelope::room_list(&rooms) {
                Ok(reply) => {
                    member.send(&reply);
                }
                Err(e) => error!(client = %member.id(), error = %e, "failed to encode room list"),
            }
        }
        kind if kind.is_server_only() => {
            member.send(&Envelope::error(format!("{kind} messages are sent by the server only")));
        }
        _ => match member.room() {
            Some(room) => router::to_room(&room, member, &envelope).await,
            None => hub.inbound(member.id(), envelope).await?,
        },
    }
    Ok(())
}

async fn write_pump<C: Connection>(
    conn: Arc<C>,
    mut rx: mpsc::Receiver<Frame>,
    config: ConnectionConfig,
    teardown: Arc<Teardown>,
) {
    let id = conn.id();
    loop {
        let frame = tokio::select! {
            _ = teardown.cancel.cancelled() => break,
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        match time::timeout(config.write_timeout, conn.send_text(&frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(client = %id, error = %e, "write failed");
                break;
            }
            Err(_) => {
                warn!(client = %id, timeout = ?config.write_timeout, "write timed out");
                break;
            }
        }
    }
    rx.close();
    if let Err(e) = conn.close().await {
        debug!(client = %id, error = %e, "close failed");
    }
    teardown.run().await;
}

async fn keepalive_pump<C: Connection>(conn: Arc<C>, config: ConnectionConfig, teardown: Arc<Teardown>) {
    let id = conn.id();
    let mut interval = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    loop {
        tokio::select! {
            _ = teardown.cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        let pong = tokio::select! {
            _ = teardown.cancel.cancelled() => break,
            pong = time::timeout(config.ping_timeout, conn.ping()) => pong,
        };
        match pong {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(client = %id, error = %e, "ping failed");
                break;
            }
            Err(_) => {
                warn!(client = %id, "pong not received in time");
                break;
            }
        }
    }
    teardown.run().await;
}
