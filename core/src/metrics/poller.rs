use crate::api::MetricsSnapshot;
use crate::telemetry::PollStats;
use log::{debug, warn};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Identifies one issued metrics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Orders metrics responses by issuance.
///
/// Requests are numbered as they are issued. A response is accepted only if
/// the gate is active, it belongs to the current activation, and no later
/// request has been accepted already. Issuance is never blocked on
/// completion.
#[derive(Debug, Default)]
pub struct SequenceGate {
    active: bool,
    generation: u64,
    next_seq: u64,
    applied: Option<u64>,
    stats: PollStats,
}

impl SequenceGate {
    pub fn activate(&mut self) {
        self.active = true;
        self.generation += 1;
        self.applied = None;
    }

    /// Stops issuing; responses to requests already in flight are ignored.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn issue(&mut self) -> Option<Ticket> {
        if !self.active {
            return None;
        }
        let ticket = Ticket {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.stats.record_issued();
        Some(ticket)
    }

    /// Whether the response for `ticket` should replace the held snapshot.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if !self.active || ticket.generation != self.generation {
            debug!("dropping metrics response #{} after deactivation", ticket.seq);
            return false;
        }
        if self.applied.is_some_and(|applied| ticket.seq <= applied) {
            debug!("dropping superseded metrics response #{}", ticket.seq);
            self.stats.record_superseded();
            return false;
        }
        self.applied = Some(ticket.seq);
        self.stats.record_applied();
        true
    }

    /// Logs a failed fetch. The held snapshot is left alone.
    pub fn record_failure(&mut self, ticket: Ticket, err: &dyn Display) {
        warn!("metrics poll #{} failed: {}", ticket.seq, err);
        self.stats.record_failed();
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }
}

/// Background poller that fetches a snapshot immediately and then once per
/// period, publishing the newest accepted snapshot on a watch channel.
///
/// Dropping the poller cancels the schedule.
pub struct MetricsPoller {
    gate: Arc<Mutex<SequenceGate>>,
    receiver: watch::Receiver<Option<MetricsSnapshot>>,
    task: JoinHandle<()>,
}

impl MetricsPoller {
    /// Spawns the schedule on the current tokio runtime.
    pub fn spawn<F, Fut, E>(period: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<MetricsSnapshot, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (sender, receiver) = watch::channel(None);
        let sender = Arc::new(sender);
        let gate = Arc::new(Mutex::new(SequenceGate::default()));
        lock(&gate).activate();

        let schedule_gate = gate.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let issued = lock(&schedule_gate).issue();
                let Some(ticket) = issued else {
                    break;
                };
                let request = fetch();
                let gate = schedule_gate.clone();
                let sender = sender.clone();
                tokio::spawn(async move {
                    let outcome = request.await;
                    let mut gate = lock(&gate);
                    match outcome {
                        Ok(snapshot) => {
                            if gate.accept(ticket) {
                                sender.send_replace(Some(snapshot));
                            }
                        }
                        Err(err) => gate.record_failure(ticket, &err),
                    }
                });
            }
        });

        Self {
            gate,
            receiver,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<MetricsSnapshot>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Option<MetricsSnapshot> {
        self.receiver.borrow().clone()
    }

    pub fn stats(&self) -> PollStats {
        lock(&self.gate).stats()
    }

    pub fn stop(&self) {
        lock(&self.gate).deactivate();
        self.task.abort();
    }
}

impl Drop for MetricsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(gate: &Mutex<SequenceGate>) -> MutexGuard<'_, SequenceGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}
