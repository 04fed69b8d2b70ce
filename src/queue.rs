//! FIFO of commands waiting to be written to the panel.
//!
//! Producers insert under one lock and post one signal token per command, so the
//! event loop can block on the signal channel alongside inbound traffic and pop
//! exactly one command for each token it receives.

use crate::lock_or_recover;
use crate::protocol::PanelCommand;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct OutboundQueue {
    inner: Mutex<VecDeque<PanelCommand>>,
    signal_tx: Sender<()>,
}

impl OutboundQueue {
    /// Create an empty queue and the signal receiver its consumer waits on.
    pub fn new() -> (Self, Receiver<()>) {
        let (signal_tx, signal_rx) = unbounded();
        let queue = Self {
            inner: Mutex::new(VecDeque::new()),
            signal_tx,
        };
        (queue, signal_rx)
    }

    /// Append a batch of commands; no other producer can interleave with it.
    pub fn push_all<I>(&self, commands: I)
    where
        I: IntoIterator<Item = PanelCommand>,
    {
        let mut queue = lock_or_recover(&self.inner, "outbound queue");
        for command in commands {
            queue.push_back(command);
            // Unbounded, so this only fails once the consumer is gone.
            let _ = self.signal_tx.send(());
        }
    }

    pub fn push(&self, command: PanelCommand) {
        self.push_all([command]);
    }

    /// Remove the oldest pending command.
    pub fn pop(&self) -> Option<PanelCommand> {
        lock_or_recover(&self.inner, "outbound queue").pop_front()
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.inner, "outbound queue").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
