// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Async event loop around the engine.
//!
//! Hardware intents, transport positions, pitch notifications and clip
//! changes arrive from different clocks. They are funnelled through one
//! channel into a task that owns the engine, so every change is applied
//! whole and in order. After each event the task publishes a fresh
//! [`GridReadModel`] on a watch channel; readers never see a half-applied
//! update.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::sequencer::{
    ClipBinding, DispatchOutcome, EngineSettings, GridReadModel, Intent, PitchSource,
    SequencerError, StepSequencerEngine,
};
use crate::timing::TransportSource;

/// Capacity of the engine event queue
const EVENT_QUEUE: usize = 256;

/// Reply to a dispatched intent
pub type DispatchReply = Result<DispatchOutcome, SequencerError>;

/// Everything the engine task reacts to
pub enum EngineEvent {
    /// Hardware intent, with an optional reply channel
    Intent {
        intent: Intent,
        reply: Option<oneshot::Sender<DispatchReply>>,
    },
    /// Transport position in beats
    TransportTick(f64),
    /// Transport stopped
    TransportStopped,
    /// The pitch source changed; re-read it
    PitchChanged,
    /// Bind a clip
    BindClip(Box<dyn ClipBinding>),
    /// Release the bound clip
    UnbindClip,
    /// Swap session settings
    ApplySettings(EngineSettings),
    /// Stop the task and hand the engine back
    Shutdown,
}

/// Cloneable sender side of the engine task
#[derive(Clone)]
pub struct EngineHandle {
    events: mpsc::Sender<EngineEvent>,
    model: watch::Receiver<GridReadModel>,
}

impl EngineHandle {
    /// Queue an event
    pub async fn send(&self, event: EngineEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow!("engine task has stopped"))
    }

    /// Dispatch an intent and wait for its outcome
    pub async fn dispatch(&self, intent: Intent) -> Result<DispatchReply> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineEvent::Intent {
            intent,
            reply: Some(tx),
        })
        .await?;
        rx.await.context("engine task dropped the reply")
    }

    /// Dispatch an intent without waiting
    pub async fn submit(&self, intent: Intent) -> Result<()> {
        self.send(EngineEvent::Intent {
            intent,
            reply: None,
        })
        .await
    }

    /// Report a transport position in beats
    pub async fn transport_tick(&self, position: f64) -> Result<()> {
        self.send(EngineEvent::TransportTick(position)).await
    }

    /// Report that the transport stopped
    pub async fn transport_stopped(&self) -> Result<()> {
        self.send(EngineEvent::TransportStopped).await
    }

    /// Notify that the selected pitch changed
    pub async fn pitch_changed(&self) -> Result<()> {
        self.send(EngineEvent::PitchChanged).await
    }

    /// Bind a clip
    pub async fn bind_clip(&self, clip: Box<dyn ClipBinding>) -> Result<()> {
        self.send(EngineEvent::BindClip(clip)).await
    }

    /// Release the bound clip
    pub async fn unbind_clip(&self) -> Result<()> {
        self.send(EngineEvent::UnbindClip).await
    }

    /// Swap session settings
    pub async fn apply_settings(&self, settings: EngineSettings) -> Result<()> {
        self.send(EngineEvent::ApplySettings(settings)).await
    }

    /// Latest published read model
    pub fn snapshot(&self) -> GridReadModel {
        self.model.borrow().clone()
    }

    /// Receiver that wakes on each published read model
    pub fn subscribe(&self) -> watch::Receiver<GridReadModel> {
        self.model.clone()
    }
}

/// The engine running on its own task
pub struct EngineRuntime {
    handle: EngineHandle,
    task: JoinHandle<StepSequencerEngine>,
}

impl EngineRuntime {
    /// Spawn the engine task. Must be called inside a tokio runtime.
    pub fn spawn(engine: StepSequencerEngine) -> Self {
        Self::spawn_inner(engine, None)
    }

    /// Spawn with a pitch source that is re-read on
    /// [`EngineEvent::PitchChanged`]
    pub fn spawn_with_pitch_source<P>(engine: StepSequencerEngine, pitch: P) -> Self
    where
        P: PitchSource + Send + 'static,
    {
        Self::spawn_inner(engine, Some(Box::new(pitch)))
    }

    fn spawn_inner(
        engine: StepSequencerEngine,
        pitch: Option<Box<dyn PitchSource + Send>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let (model_tx, model_rx) = watch::channel(engine.read_model());
        let task = tokio::spawn(run(engine, pitch, events_rx, model_tx));
        info!("engine task started");
        Self {
            handle: EngineHandle {
                events: events_tx,
                model: model_rx,
            },
            task,
        }
    }

    /// A handle for sending events and reading snapshots
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the task after queued events drain and return the engine
    pub async fn shutdown(self) -> Result<StepSequencerEngine> {
        self.handle.send(EngineEvent::Shutdown).await?;
        let engine = self.task.await.context("engine task panicked")?;
        info!("engine task stopped");
        Ok(engine)
    }
}

async fn run(
    mut engine: StepSequencerEngine,
    pitch: Option<Box<dyn PitchSource + Send>>,
    mut events: mpsc::Receiver<EngineEvent>,
    model: watch::Sender<GridReadModel>,
) -> StepSequencerEngine {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::Intent { intent, reply } => {
                let result = engine.dispatch(intent);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            EngineEvent::TransportTick(position) => {
                engine.on_transport_tick(position);
            }
            EngineEvent::TransportStopped => engine.on_transport_stopped(),
            EngineEvent::PitchChanged => {
                if let Some(source) = pitch.as_deref() {
                    engine.observe_pitch(source);
                }
            }
            EngineEvent::BindClip(clip) => {
                engine.bind_clip(clip);
            }
            EngineEvent::UnbindClip => {
                engine.unbind_clip();
            }
            EngineEvent::ApplySettings(settings) => engine.apply_settings(settings),
            EngineEvent::Shutdown => break,
        }
        publish(&engine, &model);
    }
    debug!("engine event loop finished");
    engine
}

fn publish(engine: &StepSequencerEngine, model: &watch::Sender<GridReadModel>) {
    let next = engine.read_model();
    model.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

/// Poll a transport source at a fixed period and forward its position.
/// Ends when the engine task stops.
pub fn spawn_transport_poller<S>(handle: EngineHandle, source: S, period: Duration) -> JoinHandle<()>
where
    S: TransportSource + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut running = false;
        loop {
            ticker.tick().await;
            let sent = match source.position() {
                Some(position) => {
                    running = true;
                    handle.transport_tick(position).await
                }
                None if running => {
                    running = false;
                    handle.transport_stopped().await
                }
                None => Ok(()),
            };
            if sent.is_err() {
                break;
            }
        }
        debug!("transport poller finished");
    })
}
