//! The protocol session: one connection, one event loop.
//!
//! The loop waits on three sources at once: lines from the reader thread, tokens
//! from the outbound queue, and failures reported by background tasks. Each queued
//! command is written and then answered by exactly one line before the loop looks
//! at anything else, so the panel never has two commands in flight.

mod io;

#[cfg(test)]
mod tests;

use crate::app::{HandlerContext, PanelApp, PanelHandle, Task};
use crate::context::{ContextDispatcher, Handler};
use crate::keymap::KeyMap;
use crate::protocol::{Packet, PanelCommand};
use crate::queue::OutboundQueue;
use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use self::io::{spawn_reader_thread, InboundLine};
use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Default, Clone, Copy)]
struct SessionStats {
    packets_in: u64,
    commands_sent: u64,
    unhandled: u64,
}

pub struct Session {
    panel: PanelHandle,
    queue: Arc<OutboundQueue>,
    contexts: ContextDispatcher,
    keymap: KeyMap,
    tasks: Vec<(String, Task)>,
    setup: Option<Handler>,
    writer: Box<dyn Write + Send>,
    inbound_rx: Receiver<InboundLine>,
    signal_rx: Receiver<()>,
    fault_tx: Sender<anyhow::Error>,
    fault_rx: Receiver<anyhow::Error>,
    stats: SessionStats,
}

impl Session {
    /// Take over a connected panel: start reading from it, then reset the screen and
    /// set its brightness before any event is handled.
    pub fn start<R, W>(app: PanelApp, keymap: KeyMap, reader: R, writer: W) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (inbound_tx, inbound_rx) = unbounded();
        spawn_reader_thread(reader, inbound_tx).context("spawning panel reader thread")?;
        let (queue, signal_rx) = OutboundQueue::new();
        let queue = Arc::new(queue);
        let (fault_tx, fault_rx) = unbounded();
        let PanelApp {
            brightness,
            fields,
            contexts,
            tasks,
            setup,
        } = app;

        let mut session = Self {
            panel: PanelHandle::new(Arc::new(fields), Arc::clone(&queue)),
            queue,
            contexts,
            keymap,
            tasks,
            setup,
            writer: Box::new(writer),
            inbound_rx,
            signal_rx,
            fault_tx,
            fault_rx,
            stats: SessionStats::default(),
        };
        session.transact(&PanelCommand::Clear)?;
        session.transact(&PanelCommand::Brightness(brightness))?;
        tracing::info!(brightness, "panel reset");
        Ok(session)
    }

    /// Run until the panel disconnects or something fatal happens.
    ///
    /// There is no clean way out: the loop only stops on an error, which includes
    /// the peer closing the connection.
    pub fn run(mut self) -> Result<()> {
        let result = self.run_loop();
        let stats = self.stats;
        tracing::info!(
            packets_in = stats.packets_in,
            commands_sent = stats.commands_sent,
            unhandled = stats.unhandled,
            pending = self.queue.len(),
            "session ended"
        );
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        if let Some(setup) = self.setup.take() {
            let mut ctx = HandlerContext::new(&self.panel, &mut self.contexts, None);
            setup(&mut ctx).context("setup hook failed")?;
        }
        self.spawn_tasks()?;

        let inbound_rx = self.inbound_rx.clone();
        let signal_rx = self.signal_rx.clone();
        let fault_rx = self.fault_rx.clone();
        loop {
            select! {
                recv(inbound_rx) -> line => match line {
                    Ok(Ok(line)) => self.handle_line(&line)?,
                    Ok(Err(err)) => return Err(anyhow!(err).context("reading from panel")),
                    Err(_) => bail!("panel closed the connection"),
                },
                recv(signal_rx) -> token => {
                    if token.is_ok() {
                        self.send_next()?;
                    }
                }
                recv(fault_rx) -> fault => {
                    if let Ok(err) = fault {
                        return Err(err);
                    }
                }
            }
        }
    }

    fn spawn_tasks(&mut self) -> Result<()> {
        for (name, task) in self.tasks.drain(..) {
            let panel = self.panel.clone();
            let fault_tx = self.fault_tx.clone();
            let task_name = name.clone();
            thread::Builder::new()
                .name(format!("irpanel-task-{name}"))
                .spawn(move || {
                    tracing::debug!(task = %task_name, "task started");
                    match task(panel) {
                        Ok(()) => tracing::debug!(task = %task_name, "task finished"),
                        Err(err) => {
                            let _ = fault_tx.send(err.context(format!("task {task_name} failed")));
                        }
                    }
                })
                .with_context(|| format!("spawning task {name}"))?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<()> {
        self.stats.packets_in += 1;
        tracing::debug!("PKT  IN {line}");
        let code = match Packet::parse(line) {
            Ok(Packet::Infrared { code }) => code,
            Ok(Packet::Other { tag, payload }) => {
                tracing::warn!(tag = %tag, payload = %payload, "unknown packet");
                self.stats.unhandled += 1;
                return Ok(());
            }
            Err(err) => {
                tracing::warn!("{err}");
                self.stats.unhandled += 1;
                return Ok(());
            }
        };
        let Some(key) = self.keymap.lookup(&code).map(str::to_string) else {
            tracing::debug!(code = %code, "no key for code");
            self.stats.unhandled += 1;
            return Ok(());
        };
        let Some(handler) = self.contexts.dispatch_active(&key) else {
            tracing::debug!(key = %key, context = ?self.contexts.active(), "key not bound");
            self.stats.unhandled += 1;
            return Ok(());
        };
        tracing::debug!(key = %key, context = ?self.contexts.active(), "dispatch");
        let mut ctx = HandlerContext::new(&self.panel, &mut self.contexts, Some(&key));
        handler(&mut ctx).with_context(|| format!("handler for key {key} failed"))
    }

    fn send_next(&mut self) -> Result<()> {
        match self.queue.pop() {
            Some(command) => self.transact(&command),
            None => Ok(()),
        }
    }

    /// Write one command and block until the panel answers it.
    fn transact(&mut self, command: &PanelCommand) -> Result<()> {
        tracing::debug!("PKT OUT {command}");
        let wire = command.encode();
        self.writer
            .write_all(wire.as_bytes())
            .with_context(|| format!("writing {command:?} to panel"))?;
        self.writer.flush().context("flushing panel socket")?;
        self.stats.commands_sent += 1;
        match self.inbound_rx.recv() {
            Ok(Ok(reply)) => {
                tracing::debug!("PKT RES {reply}");
                if reply.starts_with("error") || reply.starts_with("fail") {
                    tracing::warn!(command = %command, reply = %reply, "panel rejected command");
                }
                Ok(())
            }
            Ok(Err(err)) => Err(anyhow!(err).context("reading reply from panel")),
            Err(_) => bail!("panel closed the connection while a command was in flight"),
        }
    }
}
