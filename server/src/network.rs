//! Server network layer: accepts TCP connections and runs the board event loop

use crate::client_manager::{ClientManager, ConnectionId};
use crate::game::{GameError, GameState};
use crate::identity::IdentityResolver;
use log::{debug, error, info, warn};
use shared::{encode_deltas, JoinRequest};
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Joined {
        id: ConnectionId,
        request: JoinRequest,
    },
    MarkRequested {
        id: ConnectionId,
        index: u8,
    },
    Disconnected {
        id: ConnectionId,
        reason: String,
    },
}

/// Authoritative board server
///
/// All state lives here and is only touched from [`Server::run`]; the
/// per-connection tasks merely translate socket traffic into
/// [`ServerMessage`]s and drain outbound queues.
pub struct Server {
    listener: TcpListener,
    clients: ClientManager,
    game: GameState,
    resolver: Box<dyn IdentityResolver>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        game: GameState,
        resolver: Box<dyn IdentityResolver>,
        max_clients: usize,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            clients: ClientManager::new(max_clients),
            game,
            resolver,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Main server loop; only returns if the message channel closes
    pub async fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.accept_connection(stream, addr),
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }

    fn accept_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let Some(id) = self.clients.add_connection(addr, outbound_tx) else {
            warn!("Rejecting connection from {}: server full", addr);
            return;
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        let (reader, writer) = stream.into_split();
        let reader_task = tokio::spawn(read_connection(id, reader, self.server_tx.clone()));
        tokio::spawn(write_connection(id, writer, outbound_rx, self.server_tx.clone()));
        self.clients.attach_reader(id, reader_task);
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Joined { id, request } => self.handle_join(id, request),
            ServerMessage::MarkRequested { id, index } => self.handle_mark(id, index),
            ServerMessage::Disconnected { id, reason } => {
                if self.clients.remove_connection(&id) {
                    info!("Connection {} dropped: {}", id, reason);
                }
            }
        }
    }

    /// Finishes the handshake: resolves identity, recolors, sends the snapshot
    fn handle_join(&mut self, id: ConnectionId, request: JoinRequest) {
        let Some(addr) = self.clients.get(&id).map(|connection| connection.addr) else {
            return;
        };

        let identity = match request {
            JoinRequest::Player { color } => {
                let identity = self.resolver.resolve(addr);
                let recolor = self.game.join_player(identity.clone(), color);
                if !recolor.is_empty() {
                    let sent = self
                        .clients
                        .broadcast(&encode_deltas(&recolor), Some(&identity));
                    debug!(
                        "Sent {} recolor units for {} to {} connections",
                        recolor.len(),
                        identity,
                        sent
                    );
                }
                Some(identity)
            }
            JoinRequest::Spectator => {
                info!("Connection {} joined as spectator", id);
                None
            }
        };

        let snapshot = self.game.snapshot().encode();
        self.clients.activate(id, identity);
        if !self.clients.send_to(&id, snapshot) {
            warn!("Connection {} closed before its snapshot was queued", id);
        }
    }

    fn handle_mark(&mut self, id: ConnectionId, index: u8) {
        let identity = match self.clients.get(&id) {
            Some(connection) if connection.is_active() => connection.identity.clone(),
            _ => return,
        };

        let Some(identity) = identity else {
            warn!("Spectator connection {} sent a mark request, closing it", id);
            self.clients.remove_connection(&id);
            return;
        };

        match self.game.mark(&identity, index as usize) {
            Ok(unit) => {
                let sent = self.clients.broadcast(&unit.encode(), Some(&identity));
                debug!("Broadcast mark of cell {} to {} connections", index, sent);
            }
            Err(e @ GameError::CellFull { .. }) => {
                // the client already applied the mark locally; a rejoin resyncs it
                warn!("Refusing mark from connection {}: {}", id, e);
                self.clients.remove_connection(&id);
            }
            Err(e) => {
                warn!("Protocol violation on connection {}: {}", id, e);
                self.clients.remove_connection(&id);
            }
        }
    }
}

/// Reads the join request, then forwards every following byte as a mark request
async fn read_connection(
    id: ConnectionId,
    mut reader: OwnedReadHalf,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let request = match JoinRequest::read_from(&mut reader).await {
        Ok(request) => request,
        Err(e) => {
            let _ = server_tx.send(ServerMessage::Disconnected {
                id,
                reason: format!("handshake failed: {}", e),
            });
            return;
        }
    };
    if server_tx.send(ServerMessage::Joined { id, request }).is_err() {
        return;
    }

    let mut buffer = [0u8; 64];
    loop {
        let reason = match reader.read(&mut buffer).await {
            Ok(0) => "closed by peer".to_string(),
            Ok(len) => {
                for &index in &buffer[..len] {
                    if server_tx
                        .send(ServerMessage::MarkRequested { id, index })
                        .is_err()
                    {
                        return;
                    }
                }
                continue;
            }
            Err(e) => format!("read error: {}", e),
        };

        let _ = server_tx.send(ServerMessage::Disconnected { id, reason });
        return;
    }
}

/// Drains the connection's outbound queue; each message is flushed completely
async fn write_connection(
    id: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    while let Some(bytes) = outbound_rx.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            let _ = server_tx.send(ServerMessage::Disconnected {
                id,
                reason: format!("write error: {}", e),
            });
            return;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::identity::{Identity, SocketAddressResolver};
    use shared::{Board, DeltaUnit, Rgb, Snapshot};
    use tokio::net::TcpStream;

    const RED: Rgb = Rgb::new(255, 0, 0);

    async fn test_server() -> Server {
        let board: Board<Identity> = Board::new(2, &[3, 2, 1, 0]).unwrap();
        Server::bind(
            "127.0.0.1:0",
            GameState::new(board),
            Box::new(SocketAddressResolver),
            4,
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_server_message_creation() {
        let msg = ServerMessage::MarkRequested {
            id: ConnectionId(3),
            index: 7,
        };

        match msg {
            ServerMessage::MarkRequested { id, index } => {
                assert_eq!(id, ConnectionId(3));
                assert_eq!(index, 7);
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[tokio::test]
    async fn test_bind_reports_local_addr() {
        let server = test_server().await;
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
        assert!(server.game().players().is_empty());
    }

    #[tokio::test]
    async fn test_join_and_mark_through_messages() {
        let mut server = test_server().await;
        let addr = server.local_addr().unwrap();

        let mut player = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = server.listener.accept().await.unwrap();
        server.accept_connection(stream, peer);

        player
            .write_all(&JoinRequest::Player { color: RED }.encode())
            .await
            .unwrap();
        let message = server.server_rx.recv().await.unwrap();
        assert!(matches!(message, ServerMessage::Joined { .. }));
        server.handle_message(message);

        let snapshot = Snapshot::read_from(&mut player).await.unwrap();
        assert_eq!(snapshot.goal_indices, vec![3, 2, 1, 0]);

        player.write_all(&[2]).await.unwrap();
        let message = server.server_rx.recv().await.unwrap();
        assert!(matches!(
            message,
            ServerMessage::MarkRequested { index: 2, .. }
        ));
        server.handle_message(message);

        let identity = SocketAddressResolver.resolve(player.local_addr().unwrap());
        assert!(server.game().board().is_marked_by(2, &identity));
        assert_eq!(
            server.game.mark(&identity, 2).unwrap(),
            DeltaUnit::new(2, RED)
        );
    }

    #[tokio::test]
    async fn test_out_of_range_mark_closes_connection() {
        let mut server = test_server().await;
        let addr = server.local_addr().unwrap();

        let mut player = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = server.listener.accept().await.unwrap();
        server.accept_connection(stream, peer);

        player
            .write_all(&JoinRequest::Player { color: RED }.encode())
            .await
            .unwrap();
        let joined = server.server_rx.recv().await.unwrap();
        server.handle_message(joined);
        assert_eq!(server.clients.active_count(), 1);

        player.write_all(&[200]).await.unwrap();
        let mark = server.server_rx.recv().await.unwrap();
        server.handle_message(mark);
        assert!(server.clients.is_empty());
    }
}
