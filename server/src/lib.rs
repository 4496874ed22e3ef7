//! # Board Server Library
//!
//! This library provides the authoritative server for the shared bingo board.
//! It owns the canonical board, decides which player every mark belongs to,
//! and relays each change to everybody else who is watching.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server holds the only trustworthy copy of the board: which goal sits in
//! which cell and which players currently mark it. Clients mirror it and apply
//! their own marks optimistically.
//!
//! ### Connection Management
//! Handles the complete lifecycle of a TCP connection:
//! - Join handshake (player with a color, or spectator)
//! - Identity resolution, so a returning player keeps their marks
//! - Disconnect and reset cleanup without disturbing other sessions
//!
//! ### Delta Broadcasting
//! Every accepted mark is fanned out as a 4-byte unit to all active
//! connections except those of the player who made it. A returning player with
//! a new color triggers a recolor delta for everyone else.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! One loop owns the board, the player registry and the connection table.
//! Per-connection tasks only move bytes: readers turn socket input into
//! messages for the loop, writers drain outbound queues. Running on a
//! current-thread runtime means nothing here ever executes in parallel.
//!
//! ### Backpressure
//! Outbound data is queued per connection and written by that connection's
//! writer task, so a slow client only delays its own queue.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Connection table, connection states and outbound queues.
//!
//! ### Game Module (`game`)
//! Board plus player registry: toggling marks, recolor deltas, snapshots.
//!
//! ### Identity Module (`identity`)
//! Pluggable strategies that map a peer address onto a player identity.
//!
//! ### Network Module (`network`)
//! Listener, event loop and per-connection reader/writer tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::GameState;
//! use server::identity::HostAddressResolver;
//! use server::network::Server;
//! use shared::BoardGenerator;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let board = BoardGenerator::new(42).generate_board(100, 5)?;
//!     let mut server = Server::bind(
//!         "127.0.0.1:8080",
//!         GameState::new(board),
//!         Box::new(HostAddressResolver),
//!         64,
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod identity;
pub mod network;
