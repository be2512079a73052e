use crate::{AppDataError, AppDataResult, Listener, Packet};

/// An ordered group of packets delivered together. Never contains a commit.
#[derive(Debug, Clone, Default)]
pub struct PacketBatch(Vec<Packet>);

impl PacketBatch {
    pub fn new(packets: Vec<Packet>) -> AppDataResult<Self> {
        if !packets.iter().all(Packet::is_batchable) {
            return Err(AppDataError::CommitInBatch);
        }

        Ok(Self(packets))
    }

    pub fn packets(&self) -> &[Packet] {
        &self.0
    }

    pub fn into_packets(self) -> Vec<Packet> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hand the batch to the listener's batch callback if it has one;
    /// otherwise apply its packets one by one, stopping at the first error.
    pub fn apply(&self, listener: &Listener) -> AppDataResult<()> {
        if let Some(on_batch) = &listener.on_batch {
            return on_batch(self);
        }

        self.0.iter().try_for_each(|packet| packet.apply(listener))
    }
}

// ----------------------------------- tests -----------------------------------
