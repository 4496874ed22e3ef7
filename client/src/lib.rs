//! # Bingo Board Client Library
//!
//! Client side of the shared bingo board: joining a server, keeping a local
//! mirror of the board in sync and deciding which goals the player may see.
//!
//! ## Architecture Overview
//!
//! The server is authoritative for everybody else's marks, the client is
//! authoritative for what its own player can see. A session goes through two
//! phases:
//!
//! ### Handshake
//! The client sends its join request (player color or spectator) and blocks
//! until the full board snapshot has arrived: board size, goal assignment and
//! every marker already placed. Markers are replayed into the local mirror so
//! fog-of-war starts out consistent with the player's earlier marks.
//!
//! ### Steady State
//! Afterwards the connection is driven by [`network::BoardClient::poll`] from
//! the UI's own timer. Local clicks are applied optimistically and queued as
//! one-byte mark requests; incoming 4-byte delta units are decoded as they
//! complete, however the stream happens to be fragmented.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The local board mirror:
//! - Markers keyed by color
//! - Per-cell visibility (invisible, visible, always visible)
//! - Exploring and unexploring the neighborhood of the own marks
//!
//! ### Input Module (`input`)
//! Turns typed commands and canvas coordinates into cell indices.
//!
//! ### Network Module (`network`)
//! The TCP connection, the handshake and the non-blocking poll loop.
//!
//! ### Rendering Module (`rendering`)
//! A plain-text grid of goals and markers for the terminal.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::BoardClient;
//! use shared::{JoinRequest, Rgb};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), client::network::ClientError> {
//! let request = JoinRequest::Player { color: Rgb::new(255, 0, 0) };
//! let mut client = BoardClient::connect("127.0.0.1:8080", request).await?;
//!
//! client.mark(4)?;
//! loop {
//!     for event in client.poll(Duration::from_millis(100)).await? {
//!         println!("cell {} now has {:?}", event.index, event.markers);
//!     }
//! }
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
