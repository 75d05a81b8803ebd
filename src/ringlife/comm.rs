//! Point-to-point messaging between ranks.
//!
//! [`Communicator`] is the only channel through which partition data leaves a
//! rank. Sends are buffered and never block; receives block until a message
//! with the requested source and tag arrives. Messages from one source with one
//! tag are delivered in send order.
//!
//! [`ChannelWorld`] wires up an in-process world: one `mpsc` inbox per rank,
//! with every rank holding a sender to every inbox. Because every inbox stays
//! connected while any rank lives, a failing rank announces itself through an
//! [`AbortHandle`] instead; the receivers then fail with
//! [`CommError::Aborted`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use super::cell::CellState;
use super::error::CommError;

/// Message tags. A receive only matches a message with the same tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A rank's top row, sent to its up-neighbor.
    TopRow,
    /// A rank's bottom row, sent to its down-neighbor.
    BottomRow,
    /// A whole partition, sent to the root for display.
    Gather,
}

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Queue `payload` for `dest`. Returns once the message is buffered.
    fn send(&self, dest: usize, tag: Tag, payload: &[CellState]) -> Result<(), CommError>;

    /// Block until a `tag` message from `source` arrives and copy it into
    /// `buf`. The message must hold exactly `buf.len()` cells.
    fn recv(&self, source: usize, tag: Tag, buf: &mut [CellState]) -> Result<(), CommError>;
}

/// Ring neighbors of one rank. Row axis wraps: rank 0's up is rank `size - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingTopology {
    rank: usize,
    size: usize,
}

impl RingTopology {
    pub fn new(rank: usize, size: usize) -> Self {
        assert!(rank < size, "rank {rank} outside ring of {size}");
        Self { rank, size }
    }

    pub fn of<C: Communicator + ?Sized>(comm: &C) -> Self {
        Self::new(comm.rank(), comm.size())
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// `(rank - 1) mod size`
    #[inline]
    pub fn up(&self) -> usize {
        (self.rank + self.size - 1) % self.size
    }

    /// `(rank + 1) mod size`
    #[inline]
    pub fn down(&self) -> usize {
        (self.rank + 1) % self.size
    }
}

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: Tag,
    payload: Vec<CellState>,
}

#[derive(Debug)]
enum Packet {
    Data(Envelope),
    /// `source` left the run early.
    Abort { source: usize },
}

/// Tells every other rank that one rank is leaving the run early.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    rank: usize,
    outboxes: Vec<Sender<Packet>>,
}

impl AbortHandle {
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Wake every other rank's pending receive with [`CommError::Aborted`].
    pub fn abort(&self) {
        for (dest, outbox) in self.outboxes.iter().enumerate() {
            if dest != self.rank {
                // A rank that already finished has dropped its inbox.
                let _ = outbox.send(Packet::Abort { source: self.rank });
            }
        }
    }

    /// Abort when the returned guard drops, unless it was disarmed first.
    pub fn guard(self) -> AbortGuard {
        AbortGuard { handle: Some(self) }
    }
}

/// Aborts the run on drop, including drops during a panic unwind.
#[derive(Debug)]
pub struct AbortGuard {
    handle: Option<AbortHandle>,
}

impl AbortGuard {
    /// The rank finished cleanly; dropping no longer aborts.
    pub fn disarm(mut self) {
        self.handle = None;
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            warn!(rank = handle.rank, "rank left the run early, aborting peers");
            handle.abort();
        }
    }
}

/// Factory for an in-process world of [`ChannelComm`] endpoints.
pub struct ChannelWorld;

impl ChannelWorld {
    /// One endpoint per rank, indexed by rank. `recv_timeout` of `None` lets
    /// receives wait forever.
    pub fn create(size: usize, recv_timeout: Option<Duration>) -> Vec<ChannelComm> {
        assert!(size > 0, "world must have at least one rank");
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ChannelComm {
                rank,
                size,
                outboxes: senders.clone(),
                inbox,
                pending: RefCell::new(VecDeque::new()),
                recv_timeout,
            })
            .collect()
    }
}

/// One rank's endpoint. Owned by exactly one worker thread.
pub struct ChannelComm {
    rank: usize,
    size: usize,
    outboxes: Vec<Sender<Packet>>,
    inbox: Receiver<Packet>,
    /// Arrived messages that did not match an earlier receive.
    pending: RefCell<VecDeque<Envelope>>,
    recv_timeout: Option<Duration>,
}

impl ChannelComm {
    fn check_rank(&self, rank: usize) -> Result<(), CommError> {
        if rank < self.size {
            Ok(())
        } else {
            Err(CommError::InvalidRank {
                rank,
                size: self.size,
            })
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            rank: self.rank,
            outboxes: self.outboxes.clone(),
        }
    }

    fn take_pending(&self, source: usize, tag: Tag) -> Option<Envelope> {
        let mut pending = self.pending.borrow_mut();
        let pos = pending
            .iter()
            .position(|env| env.source == source && env.tag == tag)?;
        pending.remove(pos)
    }

    fn next_envelope(
        &self,
        source: usize,
        tag: Tag,
        deadline: Option<Instant>,
    ) -> Result<Envelope, CommError> {
        let packet = match deadline {
            None => self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { peer: source })?,
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                self.inbox.recv_timeout(remaining).map_err(|err| match err {
                    RecvTimeoutError::Timeout => CommError::Timeout { peer: source, tag },
                    RecvTimeoutError::Disconnected => CommError::Disconnected { peer: source },
                })?
            }
        };
        match packet {
            Packet::Data(env) => Ok(env),
            Packet::Abort { source: peer } => Err(CommError::Aborted { peer }),
        }
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: &[CellState]) -> Result<(), CommError> {
        self.check_rank(dest)?;
        trace!(rank = self.rank, dest, ?tag, len = payload.len(), "send");
        self.outboxes[dest]
            .send(Packet::Data(Envelope {
                source: self.rank,
                tag,
                payload: payload.to_vec(),
            }))
            .map_err(|_| CommError::Disconnected { peer: dest })
    }

    fn recv(&self, source: usize, tag: Tag, buf: &mut [CellState]) -> Result<(), CommError> {
        self.check_rank(source)?;
        let envelope = match self.take_pending(source, tag) {
            Some(env) => env,
            None => {
                let deadline = self.recv_timeout.map(|timeout| Instant::now() + timeout);
                loop {
                    let env = self.next_envelope(source, tag, deadline)?;
                    if env.source == source && env.tag == tag {
                        break env;
                    }
                    self.pending.borrow_mut().push_back(env);
                }
            }
        };
        if envelope.payload.len() != buf.len() {
            return Err(CommError::SizeMismatch {
                expected: buf.len(),
                got: envelope.payload.len(),
            });
        }
        buf.copy_from_slice(&envelope.payload);
        trace!(rank = self.rank, source, ?tag, "recv");
        Ok(())
    }
}
