//! Connection table for the board server
//!
//! This module tracks every open TCP connection, including:
//! - Connection lifecycle (handshaking, active, closed)
//! - The identity each active player connection speaks for
//! - Per-connection outbound queues used for snapshots and broadcasts
//! - Capacity limits on concurrent connections
//!
//! A closed connection is simply removed from the table. Dropping it aborts its
//! reader task and closes its outbound queue, which lets the writer task finish
//! flushing and exit.

use crate::identity::Identity;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Server-assigned handle for one TCP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the join request; receives no broadcasts yet
    Handshaking,
    /// Snapshot queued; receives broadcasts
    Active,
}

/// One open connection and the handles needed to talk to it
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub state: ConnectionState,
    /// `None` for spectators and for connections still handshaking
    pub identity: Option<Identity>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    /// New connection in the handshaking state, without identity or reader
    pub fn new(id: ConnectionId, addr: SocketAddr, outbound: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self {
            id,
            addr,
            state: ConnectionState::Handshaking,
            identity: None,
            outbound,
            reader: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    /// Queues bytes for the writer task. Returns false once the writer is gone.
    pub fn send(&self, bytes: Vec<u8>) -> bool {
        self.outbound.send(bytes).is_ok()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Owns every live connection of the server
pub struct ClientManager {
    /// Ordered by id so broadcasts go out in accept order
    connections: BTreeMap<ConnectionId, Connection>,
    next_connection_id: u32,
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty table that accepts at most `max_clients` connections
    ///
    /// Connection ids start at 1 and are never reused, so log lines about a
    /// connection stay unambiguous for the lifetime of the server.
    pub fn new(max_clients: usize) -> Self {
        Self {
            connections: BTreeMap::new(),
            next_connection_id: 1,
            max_clients,
        }
    }

    /// Registers a handshaking connection, or returns None when full
    pub fn add_connection(
        &mut self,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Option<ConnectionId> {
        if self.connections.len() >= self.max_clients {
            return None;
        }

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;

        info!("Connection {} opened from {}", id, addr);
        self.connections
            .insert(id, Connection::new(id, addr, outbound));
        Some(id)
    }

    /// Hands the connection its reader task so closing it can stop the task
    pub fn attach_reader(&mut self, id: ConnectionId, reader: JoinHandle<()>) {
        match self.connections.get_mut(&id) {
            Some(connection) => connection.reader = Some(reader),
            None => reader.abort(),
        }
    }

    /// Moves a connection to the active state. Returns false if it is gone.
    pub fn activate(&mut self, id: ConnectionId, identity: Option<Identity>) -> bool {
        if let Some(connection) = self.connections.get_mut(&id) {
            connection.state = ConnectionState::Active;
            connection.identity = identity;
            true
        } else {
            false
        }
    }

    /// Closes a connection by dropping it from the table
    ///
    /// Dropping aborts the reader task and closes the outbound queue; the
    /// writer flushes what is already queued and then shuts the socket down.
    /// Returns false if the connection was already gone.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> bool {
        if let Some(connection) = self.connections.remove(id) {
            info!("Connection {} from {} closed", connection.id, connection.addr);
            true
        } else {
            false
        }
    }

    /// Looks up a connection in any state
    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Queues bytes for a single connection, whatever its state
    ///
    /// Used for the snapshot, which has to be queued before the connection
    /// starts receiving broadcasts. Returns false if the connection is gone
    /// or its writer has stopped.
    pub fn send_to(&self, id: &ConnectionId, bytes: Vec<u8>) -> bool {
        self.connections
            .get(id)
            .is_some_and(|connection| connection.send(bytes))
    }

    /// Queues `bytes` on every active connection not owned by `exclude`
    ///
    /// All connections of the excluded identity are skipped, stale ones
    /// included. Returns the number of connections the bytes were queued on.
    pub fn broadcast(&self, bytes: &[u8], exclude: Option<&Identity>) -> usize {
        let mut sent = 0;
        for connection in self.connections.values() {
            if !connection.is_active() {
                continue;
            }
            if exclude.is_some() && connection.identity.as_ref() == exclude {
                continue;
            }
            if connection.send(bytes.to_vec()) {
                sent += 1;
            } else {
                debug!("Connection {} writer already stopped", connection.id);
            }
        }
        sent
    }

    /// Number of open connections, handshaking ones included
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of connections that finished the handshake
    pub fn active_count(&self) -> usize {
        self.connections.values().filter(|c| c.is_active()).count()
    }
}
