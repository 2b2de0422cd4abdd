//! Event Processor - the background maintenance scheduler.
//!
//! One tokio task owns the command channel and the four maintenance
//! intervals. Because that loop is the only consumer, at most one event is
//! ever being processed and events run strictly in arrival order.

use super::dream;
use super::handler::EventHandler;
use crate::config::{ConsolidationConfig, SchedulerConfig};
use crate::memory::MemoryStore;
use crate::models::{DecayReport, DreamReport, EngineEvent, SleepCycleReport};
use crate::tools::ToolRegistry;
use crate::working::WorkingMemory;
use anyhow::{Result, anyhow};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

/// Commands accepted by the processor loop
enum ProcessorCommand {
    Queue(EngineEvent),
    ForceSleep(oneshot::Sender<Result<SleepCycleReport>>),
    Stop,
}

/// What processing one event produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum EventOutcome {
    Collapsed(Vec<String>),
    Decay(DecayReport),
    Dream(DreamReport),
    ToolsExpired(Vec<(String, String)>),
    Custom(String),
    /// No handler registered under that name
    Unhandled(String),
}

impl EventOutcome {
    /// One-line summary for the log.
    pub fn summary(&self) -> String {
        match self {
            Self::Collapsed(owners) => format!("collapsed {} idle segment(s)", owners.len()),
            Self::Decay(r) => format!(
                "decay scanned {}, pruned {}, checkpointed {}",
                r.scanned, r.pruned, r.checkpointed
            ),
            Self::Dream(r) => format!(
                "dream scanned {} owner(s), {} link(s), {} pattern(s)",
                r.owners_scanned, r.links_created, r.patterns_created
            ),
            Self::ToolsExpired(tools) => format!("expired {} tool(s)", tools.len()),
            Self::Custom(summary) => summary.clone(),
            Self::Unhandled(name) => format!("no handler for custom event '{}'", name),
        }
    }
}

/// Snapshot of the processor state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventProcessorStatus {
    pub is_running: bool,
    pub queued_events: usize,
    pub processed_events: u64,
    pub custom_handlers: Vec<String>,
}

/// Handle for controlling a started processor
#[derive(Clone)]
pub struct EventProcessorHandle {
    command_tx: mpsc::Sender<ProcessorCommand>,
    processor: Arc<EventProcessor>,
}

impl EventProcessorHandle {
    /// Append an event to the queue
    pub async fn queue_event(&self, event: EngineEvent) -> Result<()> {
        self.processor.queued.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.command_tx.send(ProcessorCommand::Queue(event)).await {
            self.processor.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(anyhow!("Failed to send queue command: {}", e));
        }
        Ok(())
    }

    /// Run all maintenance steps inside the loop and wait for the result
    pub async fn force_sleep_cycle(&self) -> Result<SleepCycleReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(ProcessorCommand::ForceSleep(reply_tx))
            .await
            .map_err(|e| anyhow!("Failed to send sleep command: {}", e))?;
        reply_rx
            .await
            .map_err(|e| anyhow!("Sleep cycle reply dropped: {}", e))?
    }

    /// Stop the processor
    pub async fn stop(&self) -> Result<()> {
        self.command_tx
            .send(ProcessorCommand::Stop)
            .await
            .map_err(|e| anyhow!("Failed to send stop command: {}", e))
    }

    pub fn status(&self) -> EventProcessorStatus {
        self.processor.status()
    }
}

pub struct EventProcessor {
    working: Arc<WorkingMemory>,
    store: MemoryStore,
    tools: Arc<ToolRegistry>,
    config: SchedulerConfig,
    consolidation: ConsolidationConfig,
    handlers: RwLock<HashMap<String, Arc<dyn EventHandler>>>,
    running: AtomicBool,
    queued: AtomicUsize,
    processed: AtomicU64,
}

impl EventProcessor {
    pub fn new(
        working: Arc<WorkingMemory>,
        store: MemoryStore,
        tools: Arc<ToolRegistry>,
        config: SchedulerConfig,
        consolidation: ConsolidationConfig,
    ) -> Self {
        Self {
            working,
            store,
            tools,
            config,
            consolidation,
            handlers: RwLock::new(HashMap::new()),
            running: AtomicBool::new(false),
            queued: AtomicUsize::new(0),
            processed: AtomicU64::new(0),
        }
    }

    /// Register (or replace) the handler for custom events named `name`.
    pub fn register_handler(&self, name: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.write().insert(name.into(), handler);
    }

    pub fn status(&self) -> EventProcessorStatus {
        let mut custom_handlers: Vec<String> = self.handlers.read().keys().cloned().collect();
        custom_handlers.sort();
        EventProcessorStatus {
            is_running: self.running.load(Ordering::SeqCst),
            queued_events: self.queued.load(Ordering::SeqCst),
            processed_events: self.processed.load(Ordering::SeqCst),
            custom_handlers,
        }
    }

    /// Process a single event.
    ///
    /// Maintenance sweeps hit redb synchronously, so they run on the blocking pool.
    pub async fn process_event(&self, event: &EngineEvent) -> Result<EventOutcome> {
        let outcome = match event {
            EngineEvent::SegmentCollapse => {
                let working = self.working.clone();
                let collapsed =
                    tokio::task::spawn_blocking(move || working.collapse_idle_segments()).await??;
                EventOutcome::Collapsed(collapsed)
            }
            EngineEvent::MemoryDecay => {
                let store = self.store.clone();
                let report = tokio::task::spawn_blocking(move || store.run_decay_cycle()).await??;
                EventOutcome::Decay(report)
            }
            EngineEvent::DreamConsolidate => {
                let store = self.store.clone();
                let consolidation = self.consolidation.clone();
                let report =
                    tokio::task::spawn_blocking(move || dream::consolidate(&store, &consolidation))
                        .await??;
                EventOutcome::Dream(report)
            }
            EngineEvent::ToolExpiry => {
                let tools = self.tools.clone();
                let expired =
                    tokio::task::spawn_blocking(move || tools.deactivate_expired_tools()).await??;
                EventOutcome::ToolsExpired(expired)
            }
            EngineEvent::Custom { name, payload } => {
                let handler = self.handlers.read().get(name).cloned();
                match handler {
                    Some(handler) => EventOutcome::Custom(handler.handle(payload).await?),
                    None => EventOutcome::Unhandled(name.clone()),
                }
            }
        };
        Ok(outcome)
    }

    /// Process an event from the loop, logging the result. Failures are logged
    /// and never stop the loop.
    async fn dispatch(&self, event: EngineEvent) {
        match self.process_event(&event).await {
            Ok(EventOutcome::Unhandled(name)) => {
                warn!(event = %event, "No handler registered for custom event '{}'", name);
            }
            Ok(outcome) => info!(event = %event, "{}", outcome.summary()),
            Err(e) => error!(event = %event, error = %e, "Event processing failed"),
        }
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    /// Run every maintenance step in sequence and report each result.
    pub fn force_sleep_cycle(&self) -> Result<SleepCycleReport> {
        info!("Running forced sleep cycle");
        let collapsed = self.working.collapse_idle_segments()?;
        let decay = self.store.run_decay_cycle()?;
        let dream = dream::consolidate(&self.store, &self.consolidation)?;
        let expired_tools = self.tools.deactivate_expired_tools()?;

        Ok(SleepCycleReport {
            collapsed,
            decay,
            dream,
            expired_tools,
        })
    }

    /// Start the processor loop and return a handle for controlling it
    pub fn start(self: Arc<Self>) -> EventProcessorHandle {
        let (command_tx, command_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        self.running.store(true, Ordering::SeqCst);

        let processor = self.clone();
        tokio::spawn(async move {
            processor.run_loop(command_rx).await;
        });

        EventProcessorHandle {
            command_tx,
            processor: self,
        }
    }

    async fn run_loop(self: Arc<Self>, mut command_rx: mpsc::Receiver<ProcessorCommand>) {
        let mut segment_check = maintenance_interval(self.config.segment_check_interval());
        let mut decay = maintenance_interval(self.config.decay_interval());
        let mut dream = maintenance_interval(self.config.dream_interval());
        let mut tool_expiry = maintenance_interval(self.config.tool_expiry_interval());

        info!(
            segment_check_secs = self.config.segment_check_secs,
            decay_secs = self.config.decay_secs,
            dream_secs = self.config.dream_secs,
            tool_expiry_secs = self.config.tool_expiry_secs,
            "Event processor started"
        );

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(ProcessorCommand::Queue(event)) => {
                            self.queued.fetch_sub(1, Ordering::SeqCst);
                            self.dispatch(event).await;
                        }
                        Some(ProcessorCommand::ForceSleep(reply)) => {
                            debug!("Forced sleep cycle requested");
                            let processor = self.clone();
                            let result =
                                tokio::task::spawn_blocking(move || processor.force_sleep_cycle())
                                    .await
                                    .map_err(anyhow::Error::from)
                                    .and_then(|result| result);
                            if let Err(e) = &result {
                                error!(error = %e, "Forced sleep cycle failed");
                            }
                            let _ = reply.send(result);
                        }
                        Some(ProcessorCommand::Stop) => {
                            info!("Event processor stopping...");
                            break;
                        }
                        None => {
                            info!("Command channel closed, stopping event processor");
                            break;
                        }
                    }
                }
                _ = segment_check.tick() => self.dispatch(EngineEvent::SegmentCollapse).await,
                _ = decay.tick() => self.dispatch(EngineEvent::MemoryDecay).await,
                _ = dream.tick() => self.dispatch(EngineEvent::DreamConsolidate).await,
                _ = tool_expiry.tick() => self.dispatch(EngineEvent::ToolExpiry).await,
            }
        }

        drop(command_rx);
        self.running.store(false, Ordering::SeqCst);
        info!("Event processor stopped");
    }
}

/// Interval whose first tick is one period from now.
fn maintenance_interval(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
