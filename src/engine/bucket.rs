// Per-transport-set aggregation state — one reference count and one platform acquisition.

use tokio::time::{Duration, Instant};

use crate::request::{NetworkType, TransportSet};
use crate::requester::traits::NetworkReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    /// Waiting for the platform to report a network. `since` is when the count
    /// last went 0→1; it survives grants and losses until the count reaches zero.
    Acquiring { since: Instant },
    Granted { network: NetworkType, since: Instant },
    /// No leases remain but release is deferred.
    Releasing { granted: Option<NetworkType>, ticket: u64 },
}

/// Result of adding a lease to a bucket.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Acquire {
    /// 0→1: the caller must start a platform acquisition for this generation.
    Start { generation: u64 },
    /// A pending delayed release was cancelled; the existing acquisition is reused.
    Resumed,
    Joined,
}

/// Result of removing a lease from a bucket.
pub(crate) enum Release {
    Held { remaining: usize },
    /// N→0: release the reference, if one was attached yet.
    Released(Option<Box<dyn NetworkReference>>),
    /// N→0 with a release delay: call `finish_release` with this ticket later.
    Deferred { ticket: u64 },
    /// The count was already zero.
    NotHeld,
}

/// Whether a waiter on this bucket should keep waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GrantStatus {
    Granted,
    Pending,
    Expired,
}

pub(crate) struct Bucket {
    transports: TransportSet,
    count: usize,
    generation: u64,
    next_ticket: u64,
    phase: Phase,
    reference: Option<Box<dyn NetworkReference>>,
}

impl Bucket {
    pub(crate) fn new(transports: TransportSet) -> Self {
        Self {
            transports,
            count: 0,
            generation: 0,
            next_ticket: 0,
            phase: Phase::Idle,
            reference: None,
        }
    }

    pub(crate) fn transports(&self) -> TransportSet {
        self.transports
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn acquire(&mut self, now: Instant) -> Acquire {
        self.count += 1;
        match self.phase {
            Phase::Idle => {
                self.generation += 1;
                self.phase = Phase::Acquiring { since: now };
                Acquire::Start {
                    generation: self.generation,
                }
            }
            Phase::Releasing { granted, .. } => {
                self.phase = match granted {
                    Some(network) => Phase::Granted { network, since: now },
                    None => Phase::Acquiring { since: now },
                };
                Acquire::Resumed
            }
            Phase::Acquiring { .. } | Phase::Granted { .. } => Acquire::Joined,
        }
    }

    /// Store the platform reference started for `generation`.
    pub(crate) fn attach(&mut self, generation: u64, reference: Box<dyn NetworkReference>) {
        debug_assert_eq!(generation, self.generation);
        debug_assert!(self.count > 0 && self.reference.is_none());
        self.reference = Some(reference);
    }

    pub(crate) fn release(&mut self, defer: bool) -> Release {
        if self.count == 0 {
            return Release::NotHeld;
        }
        self.count -= 1;
        if self.count > 0 {
            return Release::Held {
                remaining: self.count,
            };
        }
        if defer {
            self.next_ticket += 1;
            self.phase = Phase::Releasing {
                granted: self.granted_network(),
                ticket: self.next_ticket,
            };
            Release::Deferred {
                ticket: self.next_ticket,
            }
        } else {
            self.phase = Phase::Idle;
            Release::Released(self.reference.take())
        }
    }

    /// Complete a deferred release. `None` if the bucket was re-requested or
    /// released again under a newer ticket since.
    pub(crate) fn finish_release(&mut self, ticket: u64) -> Option<Option<Box<dyn NetworkReference>>> {
        match self.phase {
            Phase::Releasing { ticket: current, .. } if current == ticket => {
                self.phase = Phase::Idle;
                Some(self.reference.take())
            }
            _ => None,
        }
    }

    /// Ticket of the pending deferred release, if any.
    pub(crate) fn pending_release(&self) -> Option<u64> {
        match self.phase {
            Phase::Releasing { ticket, .. } => Some(ticket),
            _ => None,
        }
    }

    /// Record a platform grant. Returns `true` if the granted network changed.
    pub(crate) fn granted(&mut self, generation: u64, network: NetworkType) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.phase {
            Phase::Idle => false,
            Phase::Granted { network: current, .. } if current == network => false,
            Phase::Acquiring { since } | Phase::Granted { since, .. } => {
                self.phase = Phase::Granted { network, since };
                true
            }
            Phase::Releasing { granted, ticket } => {
                self.phase = Phase::Releasing {
                    granted: Some(network),
                    ticket,
                };
                granted != Some(network)
            }
        }
    }

    /// Record the loss of the granted network. The count is untouched: leases
    /// are still outstanding and the platform may grant again. The wait resumes
    /// from the burst's original start, not from the loss.
    pub(crate) fn lost(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.phase {
            Phase::Granted { since, .. } => {
                self.phase = Phase::Acquiring { since };
                true
            }
            Phase::Releasing {
                granted: Some(_),
                ticket,
            } => {
                self.phase = Phase::Releasing {
                    granted: None,
                    ticket,
                };
                true
            }
            _ => false,
        }
    }

    pub(crate) fn granted_network(&self) -> Option<NetworkType> {
        match self.phase {
            Phase::Granted { network, .. } => Some(network),
            Phase::Releasing { granted, .. } => granted,
            Phase::Idle | Phase::Acquiring { .. } => None,
        }
    }

    pub(crate) fn grant_status(&self, now: Instant, grace_window: Duration) -> GrantStatus {
        match self.phase {
            Phase::Granted { .. } => GrantStatus::Granted,
            Phase::Acquiring { since } if now.saturating_duration_since(since) > grace_window => {
                GrantStatus::Expired
            }
            Phase::Acquiring { .. } => GrantStatus::Pending,
            Phase::Idle | Phase::Releasing { .. } => GrantStatus::Expired,
        }
    }

    /// Drop whatever reference the bucket holds, regardless of count.
    pub(crate) fn take_reference(&mut self) -> Option<Box<dyn NetworkReference>> {
        self.reference.take()
    }
}
