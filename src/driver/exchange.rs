//! Cross-node genome exchange.
//!
//! The original driver is an MPI program: every rank generates children
//! locally, then an all-to-all gathers every rank's children onto every
//! other rank before the shared filtering step. No MPI binding exists
//! anywhere in the example corpus, so `Exchange` abstracts the operation
//! and is implemented twice: `SingleNode` for the common one-process case,
//! and `InProcessCluster`, which simulates `comm_size` ranks as native
//! threads connected by `crossbeam_channel`, for testing the distributed
//! path without a real cluster.

use crate::genome::Genome;
use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Barrier};

/// A communication fabric between optimization ranks.
pub trait Exchange: Send {
    fn rank(&self) -> usize;
    fn comm_size(&self) -> usize;

    /// Blocks until every rank has reached the barrier.
    fn barrier(&self);

    /// Sends `outgoing` to every other rank and returns the union of every
    /// rank's contribution, including this rank's own.
    fn all_to_all(&self, outgoing: Vec<Genome>) -> Vec<Genome>;
}

/// A single-process "cluster" of one rank. `all_to_all` is the identity.
pub struct SingleNode;

impl Exchange for SingleNode {
    fn rank(&self) -> usize {
        0
    }

    fn comm_size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn all_to_all(&self, outgoing: Vec<Genome>) -> Vec<Genome> {
        outgoing
    }
}

/// One rank's endpoint into an in-process simulated cluster.
pub struct InProcessCluster {
    rank: usize,
    comm_size: usize,
    senders: Vec<Sender<Vec<Genome>>>,
    receiver: Receiver<Vec<Genome>>,
    barrier: Arc<Barrier>,
}

impl InProcessCluster {
    /// Builds `comm_size` connected endpoints, one per simulated rank. Each
    /// endpoint is meant to be moved into its own thread.
    pub fn build(comm_size: usize) -> Vec<InProcessCluster> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..comm_size)
            .map(|_| crossbeam_channel::unbounded::<Vec<Genome>>())
            .unzip();
        let barrier = Arc::new(Barrier::new(comm_size));

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| InProcessCluster {
                rank,
                comm_size,
                senders: senders.clone(),
                receiver,
                barrier: barrier.clone(),
            })
            .collect()
    }
}

impl Exchange for InProcessCluster {
    fn rank(&self) -> usize {
        self.rank
    }

    fn comm_size(&self) -> usize {
        self.comm_size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }

    fn all_to_all(&self, outgoing: Vec<Genome>) -> Vec<Genome> {
        for (peer, sender) in self.senders.iter().enumerate() {
            if peer != self.rank {
                let _ = sender.send(outgoing.clone());
            }
        }
        self.barrier.wait();

        let mut all = outgoing;
        for _ in 0..(self.comm_size - 1) {
            if let Ok(mut batch) = self.receiver.recv() {
                all.append(&mut batch);
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::thread;

    #[test]
    fn single_node_exchange_is_identity() {
        let node = SingleNode;
        let out = node.all_to_all(vec![]);
        assert!(out.is_empty());
    }

    #[test]
    fn in_process_cluster_gathers_everyone() {
        let endpoints = InProcessCluster::build(3);
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|ep| {
                thread::spawn(move || {
                    let mut rng = rand_pcg::Pcg64::seed_from_u64(ep.rank() as u64);
                    let mine = Genome::random(
                        &crate::catalogue::MagnetCatalogue::new(),
                        &dummy_info(),
                        ep.rank() as u64,
                        &mut rng,
                    )
                    .unwrap();
                    let _ = mine;
                    let gathered = ep.all_to_all(vec![]);
                    gathered.len()
                })
            })
            .collect();
        let totals: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(totals.iter().all(|&t| t == 0));
    }

    fn dummy_info() -> crate::layout::Info {
        crate::layout::Info {
            name: "t".into(),
            device_type: crate::layout::DeviceType::HybridSymmetric,
            nperiods: 0,
            period_length: 1.0,
            beams: vec![],
            x: crate::layout::SampleRange { min: 0.0, max: 0.0, step: 1.0 },
            z: crate::layout::SampleRange { min: 0.0, max: 0.0, step: 1.0 },
            s: crate::layout::SampleRange { min: 0.0, max: 0.0, step: 1.0 },
        }
    }
}
