//! Per-connection handler: greeting, event routing, and cleanup.
//!
//! Each accepted channel gets its own Tokio task running this handler.
//! The flow is:
//!   1. Send `welcome` with the channel's connection id
//!   2. Spawn a writer task draining the connection's event queue
//!   3. Loop: receive frames → decode client events → forward to the
//!      coordinator
//!   4. On close, report the disconnect so the seat is vacated

use tokio::sync::mpsc;

use tempo_protocol::{ClientEvent, Codec, ConnectionId, ServerEvent};
use tempo_room::CoordinatorHandle;
use tempo_transport::{Channel, WebSocketChannel};

use crate::TempoError;

/// Drop guard that reports the disconnect when the handler exits.
///
/// This ensures seat recovery happens even if the handler panics. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task for the async
/// send; the coordinator treats a duplicate report as a no-op.
struct DisconnectGuard {
    conn_id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let _ = coordinator.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    channel: WebSocketChannel,
    coordinator: CoordinatorHandle,
    codec: C,
) -> Result<(), TempoError>
where
    C: Codec + Clone,
{
    let conn_id = channel.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Outbound events flow through this queue so the coordinator never
    // blocks on a slow socket. The coordinator holds a sender clone for
    // as long as the connection is bound to a session.
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let _ = event_tx.send(ServerEvent::Welcome {
        connection_id: conn_id,
    });
    tokio::spawn(write_events(
        channel.clone(),
        codec.clone(),
        event_rx,
        conn_id,
    ));

    let _guard = DisconnectGuard {
        conn_id,
        coordinator: coordinator.clone(),
    };

    loop {
        let frame = match channel.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        // A frame that doesn't parse as a known event is dropped, not
        // fatal: browser clients reconnect on any server-side close and
        // would hammer the accept loop.
        let event: ClientEvent = match codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable frame dropped");
                continue;
            }
        };

        dispatch(conn_id, &coordinator, &event_tx, event).await?;
    }

    // _guard drops here → seat recovery fires.
    Ok(())
}

/// Forwards one decoded client event to the coordinator.
async fn dispatch(
    conn_id: ConnectionId,
    coordinator: &CoordinatorHandle,
    event_tx: &mpsc::UnboundedSender<ServerEvent>,
    event: ClientEvent,
) -> Result<(), TempoError> {
    match event {
        ClientEvent::JoinRoomByName {
            room_id,
            display_name,
        } => {
            coordinator
                .join_by_name(conn_id, room_id, display_name, event_tx.clone())
                .await?;
        }
        ClientEvent::JoinRandom => {
            coordinator.join_random(conn_id, event_tx.clone()).await?;
        }
        ClientEvent::Move(candidate) => {
            coordinator.submit_move(conn_id, candidate).await?;
        }
        ClientEvent::Reload {
            stale_connection_id,
        } => {
            coordinator.reload(conn_id, stale_connection_id).await?;
        }
    }
    Ok(())
}

/// Writer task: drains the event queue onto the socket. Ends when every
/// sender is gone (handler exited and the coordinator unbound the
/// connection) or the socket stops accepting frames.
async fn write_events<C: Codec>(
    channel: WebSocketChannel,
    codec: C,
    mut event_rx: mpsc::UnboundedReceiver<ServerEvent>,
    conn_id: ConnectionId,
) {
    while let Some(event) = event_rx.recv().await {
        let frame = match codec.encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = channel.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "send failed, writer stopping");
            break;
        }
    }
}
