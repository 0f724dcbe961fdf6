//! Rank communicator
//!
//! A k-truss job runs as a fixed set of peer ranks that communicate only by
//! message passing. `Cluster` launches the ranks (one thread each, all
//! running the same closure) and `Comm` gives each rank its endpoint:
//! all-to-all exchange of byte batches plus the collective reductions the
//! engine needs at pass boundaries.
//!
//! Every payload crosses the rank boundary as `bincode`-encoded bytes, so
//! ranks share nothing but messages. Channels preserve per-sender order,
//! and since every rank executes the identical sequence of collective
//! steps, a mailbox that takes exactly one message per peer per step is
//! enough; messages from fast peers are buffered until their step comes up.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Errors from inter-rank communication
#[derive(Error, Debug)]
pub enum CommError {
    /// A peer rank went away (its thread exited or failed)
    #[error("peer rank {0} disconnected")]
    PeerDisconnected(usize),

    /// No message from a peer within the configured timeout
    #[error("timed out after {timeout:?} waiting for rank {rank}")]
    PeerTimeout { rank: usize, timeout: Duration },

    /// Payload encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type CommResult<T> = Result<T, CommError>;

struct Envelope {
    from: usize,
    payload: Vec<u8>,
}

/// Buffers incoming envelopes so each collective step consumes exactly one
/// message per peer, in rank order, regardless of how far ahead fast peers
/// have run.
struct Mailbox {
    rx: Receiver<Envelope>,
    queued: Vec<VecDeque<Vec<u8>>>,
    timeout: Duration,
}

impl Mailbox {
    fn new(ranks: usize, rx: Receiver<Envelope>, timeout: Duration) -> Self {
        Self {
            rx,
            queued: (0..ranks).map(|_| VecDeque::new()).collect(),
            timeout,
        }
    }

    /// One payload from every peer, indexed by rank. The caller's own slot
    /// comes back empty.
    fn recv_from_each(&mut self, my_rank: usize) -> CommResult<Vec<Vec<u8>>> {
        let ranks = self.queued.len();
        let mut slots: Vec<Option<Vec<u8>>> = (0..ranks).map(|_| None).collect();
        for rank in 0..ranks {
            if rank != my_rank {
                slots[rank] = self.queued[rank].pop_front();
            }
        }
        while let Some(waiting) = (0..ranks).find(|&r| r != my_rank && slots[r].is_none()) {
            let envelope = match self.rx.recv_timeout(self.timeout) {
                Ok(envelope) => envelope,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CommError::PeerTimeout {
                        rank: waiting,
                        timeout: self.timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CommError::PeerDisconnected(waiting))
                }
            };
            if slots[envelope.from].is_none() {
                slots[envelope.from] = Some(envelope.payload);
            } else {
                // a step ahead of us; hold it for the next call
                self.queued[envelope.from].push_back(envelope.payload);
            }
        }
        Ok(slots
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }
}

/// Per-rank communication endpoint.
pub struct Comm {
    rank: usize,
    ranks: usize,
    peers: Vec<Sender<Envelope>>,
    mailbox: Mailbox,
}

impl Comm {
    /// This rank's id, in `0..ranks()`.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks in the job.
    pub fn ranks(&self) -> usize {
        self.ranks
    }

    fn send(&self, to: usize, payload: Vec<u8>) -> CommResult<()> {
        self.peers[to]
            .send(Envelope {
                from: self.rank,
                payload,
            })
            .map_err(|_| CommError::PeerDisconnected(to))
    }

    /// All-to-all exchange of one byte batch per rank. `outbound[r]` is
    /// delivered to rank `r`; the returned vector holds the batch received
    /// from each rank, with this rank's own batch looped back unchanged.
    /// Empty batches are sent too, so every rank always receives exactly one
    /// batch per peer per exchange.
    pub fn exchange(&mut self, mut outbound: Vec<Vec<u8>>) -> CommResult<Vec<Vec<u8>>> {
        debug_assert_eq!(outbound.len(), self.ranks);
        for rank in 0..self.ranks {
            if rank != self.rank {
                self.send(rank, std::mem::take(&mut outbound[rank]))?;
            }
        }
        let mut inbound = self.mailbox.recv_from_each(self.rank)?;
        inbound[self.rank] = std::mem::take(&mut outbound[self.rank]);
        Ok(inbound)
    }

    /// Reduces `value` across all ranks with `op`, folding contributions in
    /// rank order so every rank computes the identical result.
    pub fn all_reduce<T, F>(&mut self, value: T, op: F) -> CommResult<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(T, T) -> T,
    {
        if self.ranks == 1 {
            return Ok(value);
        }
        let encoded = bincode::serialize(&value)?;
        for rank in 0..self.ranks {
            if rank != self.rank {
                self.send(rank, encoded.clone())?;
            }
        }
        let inbound = self.mailbox.recv_from_each(self.rank)?;
        let mut accumulated: Option<T> = None;
        for (rank, payload) in inbound.iter().enumerate() {
            let contribution = if rank == self.rank {
                value.clone()
            } else {
                bincode::deserialize(payload)?
            };
            accumulated = Some(match accumulated {
                Some(acc) => op(acc, contribution),
                None => contribution,
            });
        }
        Ok(accumulated.unwrap_or(value))
    }

    /// Blocks until every rank has arrived.
    pub fn barrier(&mut self) -> CommResult<()> {
        self.all_reduce(0u8, |a, b| a | b).map(|_| ())
    }
}

/// Launches N ranks as threads running the same SPMD closure.
pub struct Cluster {
    ranks: usize,
    timeout: Duration,
}

impl Cluster {
    /// A cluster of `ranks` peers with the default 30s peer timeout.
    pub fn new(ranks: usize) -> Self {
        Self {
            ranks,
            timeout: Duration::from_secs(30),
        }
    }

    /// How long a rank waits on a peer before declaring the job dead.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `job` once per rank and collects the results in rank order.
    /// If any rank fails its error is returned and the job counts as
    /// aborted; surviving ranks observe the failure as a `CommError`.
    pub fn run<R, E, F>(&self, job: F) -> Result<Vec<R>, E>
    where
        F: Fn(Comm) -> Result<R, E> + Send + Sync,
        R: Send,
        E: Send,
    {
        let mut senders = Vec::with_capacity(self.ranks);
        let mut receivers = Vec::with_capacity(self.ranks);
        for _ in 0..self.ranks {
            let (tx, rx) = mpsc::channel();
            senders.push(tx);
            receivers.push(rx);
        }
        let comms: Vec<Comm> = receivers
            .into_iter()
            .enumerate()
            .map(|(rank, rx)| Comm {
                rank,
                ranks: self.ranks,
                peers: senders.clone(),
                mailbox: Mailbox::new(self.ranks, rx, self.timeout),
            })
            .collect();
        drop(senders);

        let job = &job;
        let outcomes: Vec<Result<R, E>> = thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| scope.spawn(move || job(comm)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(outcome) => outcome,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            results.push(outcome?);
        }
        Ok(results)
    }
}
