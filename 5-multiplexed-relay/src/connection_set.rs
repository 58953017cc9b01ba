//! The relay's wait set and broadcast fan-out list.
//!
//! Accepted connections live in a dense vector indexed by [`Slot`]. Removal
//! swaps the last entry into the vacated slot, so a slot number is only
//! meaningful until the next removal; anything that has to survive a removal
//! holds a [`Token`] and asks [`ConnectionSet::slot_of`] for the current slot.
//!
//! The listener (and the shutdown pipe, when one is registered) are tagged
//! members of the wait set with reserved tokens. They are never stored in the
//! slot vector, so they cannot be removed or written to.

use std::{
    collections::HashMap,
    io::{self, Write},
    net::TcpStream,
    num::NonZeroUsize,
    os::fd::{AsRawFd, RawFd},
};

use tracing::debug;

use crate::{
    connection::{Connection, Delivery, Token},
    error::{RelayError, Result},
    multiplexer::Interest,
};

/// Position of a connection in the set's backing storage.
pub type Slot = usize;

/// A recipient that was dropped after receiving part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub token: Token,
    pub peer: String,
    pub written: usize,
}

/// Outcome of relaying one read to the rest of the set.
#[derive(Debug, Default)]
pub struct Broadcast {
    pub delivered: Vec<Token>,
    /// Recipients that got none of the message. They stay in the set.
    pub failed: Vec<(Token, io::Error)>,
    /// Recipients that got a prefix of the message. They are no longer in
    /// the set.
    pub truncated: Vec<Truncated>,
}

impl Broadcast {
    /// Recipients that were attempted, successful or not.
    pub fn recipients(&self) -> usize {
        self.delivered.len() + self.failed.len() + self.truncated.len()
    }
}

pub struct ConnectionSet<S = TcpStream> {
    listener: RawFd,
    shutdown: Option<RawFd>,
    peers: Vec<Connection<S>>,
    slots: HashMap<Token, Slot>,
    next_token: usize,
}

impl<S> ConnectionSet<S> {
    pub fn new(listener: RawFd, initial_capacity: NonZeroUsize) -> Self {
        Self {
            listener,
            shutdown: None,
            peers: Vec::with_capacity(initial_capacity.get()),
            slots: HashMap::with_capacity(initial_capacity.get()),
            next_token: Token::FIRST_PEER.0,
        }
    }

    pub fn register_shutdown(&mut self, fd: RawFd) {
        self.shutdown = Some(fd);
    }

    /// Starts tracking a freshly accepted stream and returns its slot.
    ///
    /// When storage is full it doubles. Failing to grow is fatal for the
    /// relay: it cannot keep accepting connections it has nowhere to put.
    pub fn add(&mut self, stream: S, peer: String) -> Result<Slot> {
        if self.peers.len() == self.peers.capacity() {
            let capacity = self.peers.capacity();
            self.peers
                .try_reserve_exact(capacity.max(1))
                .map_err(|source| RelayError::Growth { capacity, source })?;
            debug!(from = capacity, to = self.peers.capacity(), "connection set grew");
        }
        self.slots
            .try_reserve(1)
            .map_err(|source| RelayError::Growth {
                capacity: self.peers.capacity(),
                source,
            })?;

        let token = Token(self.next_token);
        self.next_token += 1;

        let slot = self.peers.len();
        self.peers.push(Connection::new(token, stream, peer));
        self.slots.insert(token, slot);
        Ok(slot)
    }

    /// Drops the entry at `slot` from the set by swapping the last entry into
    /// its place. The connection is handed back so the caller decides when
    /// its transport is closed.
    pub fn remove(&mut self, slot: Slot) -> Option<Connection<S>> {
        if slot >= self.peers.len() {
            return None;
        }

        let removed = self.peers.swap_remove(slot);
        self.slots.remove(&removed.token());
        if let Some(moved) = self.peers.get(slot) {
            self.slots.insert(moved.token(), slot);
        }
        Some(removed)
    }

    pub fn slot_of(&self, token: Token) -> Option<Slot> {
        self.slots.get(&token).copied()
    }

    pub fn contains(&self, token: Token) -> bool {
        self.slots.contains_key(&token)
    }

    pub fn get(&self, slot: Slot) -> Option<&Connection<S>> {
        self.peers.get(slot)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut Connection<S>> {
        self.peers.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection<S>> {
        self.peers.iter()
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.peers.iter().map(Connection::token)
    }

    /// Number of tracked client connections (the listener is not counted).
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.peers.capacity()
    }

    pub fn listener_fd(&self) -> RawFd {
        self.listener
    }
}

impl<S: AsRawFd> ConnectionSet<S> {
    /// The interest list for the next wait: listener first, then the
    /// shutdown pipe if present, then every connection in slot order.
    pub fn snapshot_for_wait(&self) -> Vec<Interest> {
        let mut interest = Vec::with_capacity(self.peers.len() + 2);
        interest.push(Interest::readable(Token::LISTENER, self.listener));
        if let Some(fd) = self.shutdown {
            interest.push(Interest::readable(Token::SHUTDOWN, fd));
        }
        interest.extend(
            self.peers
                .iter()
                .map(|conn| Interest::readable(conn.token(), conn.as_raw_fd())),
        );
        interest
    }
}

impl<S: Write> ConnectionSet<S> {
    /// Writes `bytes` to every tracked connection except `sender`.
    ///
    /// Each recipient either gets the whole message or none of it. A failed
    /// write is recorded and the fan-out moves on; the failing recipient
    /// stays in the set. A recipient that took only part of the message is
    /// removed before this returns.
    pub fn broadcast(&mut self, sender: Token, bytes: &[u8]) -> Broadcast {
        let mut outcome = Broadcast::default();
        for conn in self.peers.iter_mut().filter(|conn| conn.token() != sender) {
            match conn.deliver(bytes) {
                Ok(Delivery::Complete) => outcome.delivered.push(conn.token()),
                Ok(Delivery::Truncated { written }) => outcome.truncated.push(Truncated {
                    token: conn.token(),
                    peer: conn.peer().to_string(),
                    written,
                }),
                Err(err) => outcome.failed.push((conn.token(), err)),
            }
        }

        for cut in &outcome.truncated {
            if let Some(slot) = self.slot_of(cut.token) {
                self.remove(slot);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Read,
        net::TcpListener,
        os::unix::net::UnixStream,
        time::Duration,
    };

    use super::*;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    struct Pair {
        tracked: UnixStream,
        remote: UnixStream,
    }

    fn pair() -> Pair {
        let (tracked, remote) = UnixStream::pair().expect("socket pair");
        Pair { tracked, remote }
    }

    #[test]
    fn add_assigns_dense_slots_and_unique_tokens() {
        let mut set = ConnectionSet::new(3, capacity(5));
        let a = set.add(pair().tracked, "a".into()).unwrap();
        let b = set.add(pair().tracked, "b".into()).unwrap();

        assert_eq!((a, b), (0, 1));
        let tokens: Vec<_> = set.tokens().collect();
        assert_eq!(tokens, vec![Token(2), Token(3)]);
        assert!(tokens.iter().all(|t| t.is_peer()));
    }

    #[test]
    fn growth_keeps_every_previous_connection() {
        let mut set = ConnectionSet::new(3, capacity(5));
        let mut fds = Vec::new();
        let mut remotes = Vec::new();
        for i in 0..6 {
            let Pair { tracked, remote } = pair();
            fds.push(tracked.as_raw_fd());
            remotes.push(remote);
            set.add(tracked, format!("peer-{i}")).unwrap();
        }

        assert_eq!(set.len(), 6);
        assert!(set.capacity() >= 6);
        let tracked_fds: Vec<_> = set.iter().map(|conn| conn.as_raw_fd()).collect();
        assert_eq!(tracked_fds, fds);
        for (i, conn) in set.iter().enumerate() {
            assert_eq!(conn.peer(), format!("peer-{i}"));
        }
    }

    #[test]
    fn remove_swaps_last_entry_into_vacated_slot() {
        let mut set = ConnectionSet::new(3, capacity(5));
        for name in ["a", "b", "c"] {
            set.add(pair().tracked, name.into()).unwrap();
        }

        let removed = set.remove(0).expect("slot 0 occupied");
        assert_eq!(removed.peer(), "a");
        assert_eq!(set.get(0).map(|c| c.peer()), Some("c"));
        assert_eq!(set.slot_of(Token(4)), Some(0));
        assert_eq!(set.slot_of(Token(3)), Some(1));
        assert!(!set.contains(Token(2)));
        assert!(set.remove(2).is_none());
    }

    #[test]
    fn removing_the_last_slot_moves_nothing() {
        let mut set = ConnectionSet::new(3, capacity(5));
        set.add(pair().tracked, "a".into()).unwrap();
        set.add(pair().tracked, "b".into()).unwrap();

        set.remove(1).expect("occupied");
        assert_eq!(set.slot_of(Token(2)), Some(0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn tokens_are_not_reused_after_removal() {
        let mut set = ConnectionSet::new(3, capacity(5));
        set.add(pair().tracked, "a".into()).unwrap();
        set.remove(0);
        let slot = set.add(pair().tracked, "b".into()).unwrap();

        assert_eq!(slot, 0);
        assert_eq!(set.get(slot).map(|c| c.token()), Some(Token(3)));
    }

    #[test]
    fn snapshot_lists_listener_then_shutdown_then_peers() {
        let mut set = ConnectionSet::new(42, capacity(5));
        set.register_shutdown(43);
        let Pair { tracked, remote: _remote } = pair();
        let fd = tracked.as_raw_fd();
        set.add(tracked, "a".into()).unwrap();

        let snapshot = set.snapshot_for_wait();
        assert_eq!(
            snapshot,
            vec![
                Interest::readable(Token::LISTENER, 42),
                Interest::readable(Token::SHUTDOWN, 43),
                Interest::readable(Token(2), fd),
            ]
        );
    }

    #[test]
    fn broadcast_skips_sender() {
        let mut set = ConnectionSet::new(3, capacity(5));
        let mut remotes = Vec::new();
        for name in ["a", "b", "c"] {
            let Pair { tracked, remote } = pair();
            set.add(tracked, name.into()).unwrap();
            remotes.push(remote);
        }

        let outcome = set.broadcast(Token(2), b"hi");
        assert_eq!(outcome.delivered, vec![Token(3), Token(4)]);
        assert!(outcome.failed.is_empty());

        for remote in &mut remotes[1..] {
            let mut buf = [0u8; 2];
            remote.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hi");
        }
        remotes[0].set_nonblocking(true).unwrap();
        let mut buf = [0u8; 8];
        let err = remotes[0].read(&mut buf).expect_err("sender gets nothing");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn broadcast_isolates_a_failing_recipient() {
        let mut set = ConnectionSet::new(3, capacity(5));
        let a = pair();
        let b = pair();
        let mut c = pair();
        set.add(a.tracked, "a".into()).unwrap();
        set.add(b.tracked, "b".into()).unwrap();
        set.add(c.tracked, "c".into()).unwrap();
        drop(b.remote);

        let outcome = set.broadcast(Token(2), b"x");
        assert_eq!(outcome.delivered, vec![Token(4)]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, Token(3));
        assert_eq!(outcome.recipients(), 2);
        assert!(set.contains(Token(3)));

        let mut buf = [0u8; 1];
        c.remote.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
        drop(a.remote);
    }

    /// A loopback TCP pair whose tracked end is non-blocking, like an
    /// accepted relay connection.
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let remote = TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
        let (tracked, _) = listener.accept().expect("accept");
        tracked.set_nonblocking(true).expect("nonblocking");
        (tracked, remote)
    }

    #[test]
    fn slow_recipient_never_holds_a_partial_message() {
        const LEN: usize = 200;
        let message = |i: usize| [(i % 251) as u8; LEN];

        let mut set = ConnectionSet::new(3, capacity(5));
        let (tracked, mut remote) = tcp_pair();
        set.add(tracked, "slow".into()).unwrap();
        let slow = Token(2);

        // Fill the recipient's buffers until a message does not go out whole.
        let mut sent = 0;
        let outcome = loop {
            let outcome = set.broadcast(Token(99), &message(sent));
            if outcome.delivered.len() != 1 {
                break outcome;
            }
            sent += 1;
            assert!(sent < 1_000_000, "recipient never filled up");
        };
        assert_eq!(outcome.recipients(), 1);

        let cut = outcome.truncated.first().map(|cut| cut.written);
        match cut {
            Some(written) => {
                assert!(written > 0 && written < LEN);
                assert!(!set.contains(slow), "truncated recipient must be dropped");
                assert_eq!(outcome.truncated[0].peer, "slow");
                let later = set.broadcast(Token(99), &message(sent + 1));
                assert_eq!(later.recipients(), 0);
            }
            None => {
                assert_eq!(outcome.failed.len(), 1);
                assert!(set.contains(slow), "untouched recipient stays tracked");
            }
        }

        remote
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            match remote.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(err)
                    if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    break
                }
                Err(err) => panic!("read failed: {err}"),
            }
        }

        let whole = sent * LEN;
        assert_eq!(received.len(), whole + cut.unwrap_or(0));
        for (i, chunk) in received[..whole].chunks(LEN).enumerate() {
            assert_eq!(chunk, message(i), "message {i} arrived damaged");
        }
        assert!(received[whole..].iter().all(|b| *b == message(sent)[0]));
    }
}
