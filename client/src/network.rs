use crate::game::{BoardEvent, ClientBoard};
use log::{debug, info};
use shared::{
    BoardError, DeltaDecoder, DeltaUnit, JoinRequest, MarkRequest, ProtocolError, Snapshot,
};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, Interest};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server closed the connection")]
    Disconnected,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("server sent an invalid board update: {0}")]
    Board(#[from] BoardError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Connection to the board server plus the local mirror it keeps in sync
///
/// Nothing here runs on its own: the caller drives [`BoardClient::poll`] from
/// whatever timer its UI uses, and reports clicks through [`BoardClient::mark`].
pub struct BoardClient {
    stream: TcpStream,
    board: ClientBoard,
    /// Mark requests not yet accepted by the socket
    outbox: Vec<u8>,
    inbox: DeltaDecoder,
    closed: bool,
}

impl BoardClient {
    /// Joins the server and waits for the complete board snapshot
    pub async fn connect<A: ToSocketAddrs>(
        server_addr: A,
        request: JoinRequest,
    ) -> Result<Self, ClientError> {
        let mut stream = TcpStream::connect(server_addr).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle: {}", e);
        }

        stream.write_all(&request.encode()).await?;
        let snapshot = Snapshot::read_from(&mut stream).await?;
        let board = ClientBoard::from_snapshot(&snapshot, request.color())?;
        info!(
            "Joined board of size {} as {}",
            snapshot.size,
            match request.color() {
                Some(color) => format!("player {}", color),
                None => "spectator".to_string(),
            }
        );

        Ok(BoardClient {
            stream,
            board,
            outbox: Vec::new(),
            inbox: DeltaDecoder::new(),
            closed: false,
        })
    }

    pub fn board(&self) -> &ClientBoard {
        &self.board
    }

    pub fn is_spectator(&self) -> bool {
        self.board.own_color().is_none()
    }

    pub fn has_pending_output(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Toggles the own mark on a visible cell
    ///
    /// The change is applied locally right away and the request is queued for
    /// the next [`BoardClient::poll`]. Spectators and hidden or unknown cells
    /// yield `Ok(None)`.
    pub fn mark(&mut self, index: usize) -> Result<Option<BoardEvent>, ClientError> {
        let Some(color) = self.board.own_color() else {
            return Ok(None);
        };
        if !self.board.is_visible(index) {
            return Ok(None);
        }

        let event = self.board.apply_mark(index, color)?;
        self.outbox
            .extend_from_slice(&MarkRequest { index: index as u8 }.encode());
        Ok(Some(event))
    }

    /// One tick of the steady-state loop
    ///
    /// Waits at most `wait` for the socket to become ready, flushes queued mark
    /// requests, then applies every complete delta unit received so far.
    /// Returns `ClientError::Disconnected` once the server has gone away; units
    /// that arrived before the close are still applied first. A batch holding
    /// a unit for a cell outside the board is rejected as a whole.
    pub async fn poll(&mut self, wait: Duration) -> Result<Vec<BoardEvent>, ClientError> {
        if self.closed {
            return Err(ClientError::Disconnected);
        }

        let interest = if self.outbox.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE.add(Interest::WRITABLE)
        };
        let ready = match timeout(wait, self.stream.ready(interest)).await {
            Ok(ready) => ready?,
            Err(_) => return Ok(Vec::new()),
        };

        if ready.is_writable() {
            self.flush_outbox()?;
        }

        if !ready.is_readable() {
            return Ok(Vec::new());
        }
        self.closed = !self.fill_inbox()?;

        // validate the whole batch before touching the mirror
        let units: Vec<DeltaUnit> = self.inbox.by_ref().collect();
        let cells = self.board.board().cell_count();
        if let Some(bad) = units.iter().find(|unit| unit.index as usize >= cells) {
            return Err(BoardError::IndexOutOfRange {
                index: bad.index as usize,
                cells,
            }
            .into());
        }

        units
            .into_iter()
            .map(|unit| {
                self.board
                    .apply_mark(unit.index as usize, unit.color)
                    .map_err(ClientError::from)
            })
            .collect()
    }

    /// Writes as much of the outbox as the socket takes; the rest waits for
    /// the next writable poll
    fn flush_outbox(&mut self) -> Result<(), ClientError> {
        let mut written = 0;
        let result = loop {
            if written == self.outbox.len() {
                break Ok(());
            }
            match self.stream.try_write(&self.outbox[written..]) {
                Ok(0) => break Err(ClientError::Disconnected),
                Ok(sent) => written += sent,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) => break Err(e.into()),
            }
        };
        self.outbox.drain(..written);
        result
    }

    /// Reads everything currently available. Returns false on end of stream.
    fn fill_inbox(&mut self) -> Result<bool, ClientError> {
        let mut buffer = [0u8; 256];
        loop {
            match self.stream.try_read(&mut buffer) {
                Ok(0) => return Ok(false),
                Ok(len) => self.inbox.push(&buffer[..len]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{encode_deltas, Rgb};
    use std::time::Instant;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpSocket;
    use tokio::sync::oneshot;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    fn empty_snapshot(size: u8) -> Snapshot {
        let cells = size as usize * size as usize;
        Snapshot {
            size,
            goal_indices: (0..cells as u8).collect(),
            markers: vec![Vec::new(); cells],
        }
    }

    /// Accepts one player, answers with `bytes` after the join request and
    /// hands the stream back
    async fn fake_server(bytes: Vec<u8>) -> (std::net::SocketAddr, oneshot::Receiver<TcpStream>) {
        // a small receive window lets the client's send buffer fill quickly
        let socket = TcpSocket::new_v4().unwrap();
        socket.set_recv_buffer_size(16 * 1024).unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stream_tx, stream_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4];
            stream.read_exact(&mut request).await.unwrap();
            stream.write_all(&bytes).await.unwrap();
            let _ = stream_tx.send(stream);
        });
        (addr, stream_rx)
    }

    #[tokio::test]
    async fn test_bad_unit_rejects_whole_batch() {
        let mut bytes = empty_snapshot(2).encode();
        bytes.extend(encode_deltas(&[
            DeltaUnit::new(1, GREEN),
            DeltaUnit::new(9, GREEN),
        ]));
        let (addr, stream_rx) = fake_server(bytes).await;

        let mut client = BoardClient::connect(addr, JoinRequest::Player { color: RED })
            .await
            .unwrap();
        let _server_side = stream_rx.await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let error = loop {
            match client.poll(Duration::from_millis(50)).await {
                Ok(events) => assert!(events.is_empty()),
                Err(e) => break e,
            }
            assert!(Instant::now() < deadline, "bad unit never reported");
        };

        assert!(matches!(
            error,
            ClientError::Board(BoardError::IndexOutOfRange { index: 9, cells: 4 })
        ));
        // the valid unit ahead of it was not applied either
        assert!(!client.board().board().is_marked_by(1, &GREEN));
    }

    #[tokio::test]
    async fn test_outbox_survives_full_send_buffer() {
        let (addr, stream_rx) = fake_server(empty_snapshot(3).encode()).await;
        let mut client = BoardClient::connect(addr, JoinRequest::Player { color: RED })
            .await
            .unwrap();
        let mut server_side = stream_rx.await.unwrap();

        // far more than the loopback socket buffers can hold
        let queued = 16 * 1024 * 1024;
        client.outbox.resize(queued, 4);
        client.poll(Duration::from_millis(50)).await.unwrap();
        assert!(client.has_pending_output());
        client.poll(Duration::from_millis(50)).await.unwrap();
        assert!(client.has_pending_output());

        let reader = tokio::spawn(async move {
            let mut buffer = vec![0u8; 64 * 1024];
            let mut received = 0;
            while received < queued {
                let len = server_side.read(&mut buffer).await.unwrap();
                assert_ne!(len, 0);
                assert!(buffer[..len].iter().all(|&b| b == 4));
                received += len;
            }
            received
        });

        let deadline = Instant::now() + Duration::from_secs(20);
        while client.has_pending_output() {
            client.poll(Duration::from_millis(50)).await.unwrap();
            assert!(Instant::now() < deadline, "outbox never drained");
        }
        assert_eq!(reader.await.unwrap(), queued);
    }

    #[tokio::test]
    async fn test_hidden_cell_marks_are_ignored() {
        let (addr, _stream_rx) = fake_server(empty_snapshot(3).encode()).await;
        let mut client = BoardClient::connect(addr, JoinRequest::Player { color: RED })
            .await
            .unwrap();

        assert_eq!(client.mark(0).unwrap(), None);
        assert!(!client.has_pending_output());

        let event = client.mark(4).unwrap().unwrap();
        assert!(event.added);
        assert!(client.has_pending_output());
    }
}
