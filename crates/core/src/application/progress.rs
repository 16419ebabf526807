// Progress Channel - per-job progress store + event fan-out

use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::application::constants::PROGRESS_CHANNEL_CAPACITY;
use crate::domain::{ProgressSnapshot, Stem};

/// Progress store and event bus for a single job.
///
/// Exclusively mutated by the job's supervisor; subscribers only read.
/// Fan-out uses a bounded broadcast channel, so a slow listener lags
/// and drops old snapshots instead of stalling delivery to others.
pub struct ProgressChannel {
    snapshot: RwLock<ProgressSnapshot>,
    tx: broadcast::Sender<ProgressSnapshot>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            snapshot: RwLock::new(ProgressSnapshot::zero()),
            tx,
        }
    }

    /// Apply one combined fraction uniformly to every stem.
    ///
    /// Per-stem values are monotonically non-decreasing for the life
    /// of the job: decreases (parser noise) and repeats are ignored.
    /// Returns true if anything advanced (and was broadcast).
    pub fn update_all(&self, value: f64) -> bool {
        let value = value.clamp(0.0, 1.0);
        match self.snapshot.write() {
            Ok(mut guard) => {
                let mut changed = false;
                for stem in Stem::ALL {
                    if value > guard.get(stem) {
                        guard.set(stem, value);
                        changed = true;
                    }
                }
                if changed {
                    // No subscribers is fine
                    let _ = self.tx.send(*guard);
                }
                changed
            }
            Err(e) => {
                tracing::error!("RwLock poisoned writing progress snapshot: {e}");
                false
            }
        }
    }

    /// Mark one stem fully complete (result collected) and broadcast.
    pub fn mark_stem_complete(&self, stem: Stem) {
        match self.snapshot.write() {
            Ok(mut guard) => {
                guard.set(stem, 1.0);
                let _ = self.tx.send(*guard);
            }
            Err(e) => tracing::error!("RwLock poisoned writing progress snapshot: {e}"),
        }
    }

    /// Mark every stem complete (terminal success snapshot) and broadcast.
    pub fn mark_complete(&self) {
        match self.snapshot.write() {
            Ok(mut guard) => {
                guard.set_all(1.0);
                let _ = self.tx.send(*guard);
            }
            Err(e) => tracing::error!("RwLock poisoned writing progress snapshot: {e}"),
        }
    }

    /// Read-only copy of the current snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(e) => {
                tracing::error!("RwLock poisoned reading progress snapshot: {e}");
                ProgressSnapshot::zero()
            }
        }
    }

    /// Register a listener.
    ///
    /// Returns the latest known snapshot together with the receiver,
    /// taken under one lock so a subscriber attaching mid-job never
    /// misses the update between "read current" and "start listening".
    /// Dropping the receiver is the unsubscribe operation.
    pub fn subscribe(&self) -> (ProgressSnapshot, broadcast::Receiver<ProgressSnapshot>) {
        match self.snapshot.read() {
            Ok(guard) => (*guard, self.tx.subscribe()),
            Err(e) => {
                tracing::error!("RwLock poisoned reading progress snapshot: {e}");
                (ProgressSnapshot::zero(), self.tx.subscribe())
            }
        }
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_all_clamps_and_broadcasts() {
        let chan = ProgressChannel::new();
        let (initial, mut rx) = chan.subscribe();
        assert_eq!(initial, ProgressSnapshot::zero());

        assert!(chan.update_all(0.45));
        let snap = rx.try_recv().unwrap();
        for stem in Stem::ALL {
            assert_eq!(snap.get(stem), 0.45);
        }

        assert!(chan.update_all(2.0));
        assert!(chan.snapshot().is_complete());
    }

    #[test]
    fn test_monotonic_decreases_ignored() {
        let chan = ProgressChannel::new();
        chan.update_all(0.5);

        let (_, mut rx) = chan.subscribe();
        assert!(!chan.update_all(0.3)); // decrease: no change, no event
        assert!(!chan.update_all(0.5)); // repeat: no change, no event
        assert!(rx.try_recv().is_err());
        assert_eq!(chan.snapshot().get(Stem::Drums), 0.5);
    }

    #[test]
    fn test_mid_job_subscriber_gets_latest_snapshot() {
        let chan = ProgressChannel::new();
        chan.update_all(0.7);

        let (snapshot, _rx) = chan.subscribe();
        assert_eq!(snapshot.get(Stem::Vocals), 0.7);
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let chan = ProgressChannel::new();
        let (_, rx) = chan.subscribe();
        drop(rx);
        // Publishing with zero or dropped listeners must not error
        assert!(chan.update_all(0.2));
        chan.mark_complete();
        assert!(chan.snapshot().is_complete());
    }

    #[test]
    fn test_mark_stem_complete() {
        let chan = ProgressChannel::new();
        let (_, mut rx) = chan.subscribe();

        chan.mark_stem_complete(Stem::Drums);
        let snap = rx.try_recv().unwrap();
        assert_eq!(snap.get(Stem::Drums), 1.0);
        assert_eq!(snap.get(Stem::Bass), 0.0);
    }

    #[tokio::test]
    async fn test_delivery_order_per_subscriber() {
        let chan = ProgressChannel::new();
        let (_, mut rx) = chan.subscribe();

        chan.update_all(0.1);
        chan.update_all(0.2);
        chan.update_all(0.3);

        assert_eq!(rx.recv().await.unwrap().get(Stem::Drums), 0.1);
        assert_eq!(rx.recv().await.unwrap().get(Stem::Drums), 0.2);
        assert_eq!(rx.recv().await.unwrap().get(Stem::Drums), 0.3);
    }
}
