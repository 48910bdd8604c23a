//! # Subscription Runner
//!
//! Drives one pub/sub channel and dispatches its message frames to a
//! registered callback, either on the caller's task (foreground) or on a
//! dedicated tokio task (background).

use crate::config::SubscriptionConfig;
use pubkv_core::{DeliveryMode, Frame, PubKvError, PubSubChannel, Result};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Low-level callback invoked with every message frame of a topic
pub type FrameCallback = Arc<dyn Fn(Frame) + Send + Sync>;

enum Control {
    Register {
        topic: String,
        on_frame: FrameCallback,
        ack: oneshot::Sender<Result<()>>,
    },
}

enum WorkerEvent {
    Shutdown,
    Control(Option<Control>),
    Frame(Result<Option<Frame>>),
}

struct BackgroundWorker {
    control_tx: mpsc::UnboundedSender<Control>,
    shutdown_tx: watch::Sender<bool>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

enum Delivery {
    Foreground {
        channel: Mutex<Box<dyn PubSubChannel>>,
        callbacks: HashMap<String, FrameCallback>,
        cancel: watch::Sender<bool>,
    },
    Background(BackgroundWorker),
}

/// Owns one pub/sub channel and delivers its frames for a single topic.
///
/// Background runners spawn their task on construction, so they must be
/// created inside a tokio runtime. Dropping a runner that was not stopped
/// aborts its task.
pub struct SubscriptionRunner {
    delivery: Delivery,
    registered: Option<String>,
    config: SubscriptionConfig,
}

impl SubscriptionRunner {
    pub fn new(
        channel: Box<dyn PubSubChannel>,
        mode: DeliveryMode,
        config: SubscriptionConfig,
    ) -> Self {
        let delivery = match mode {
            DeliveryMode::Foreground => Delivery::Foreground {
                channel: Mutex::new(channel),
                callbacks: HashMap::new(),
                cancel: watch::channel(false).0,
            },
            DeliveryMode::Background => {
                let (control_tx, control_rx) = mpsc::unbounded_channel();
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let handle = tokio::spawn(run_worker(channel, control_rx, shutdown_rx));
                debug!("Background subscription task spawned");

                Delivery::Background(BackgroundWorker {
                    control_tx,
                    shutdown_tx,
                    handle: parking_lot::Mutex::new(Some(handle)),
                })
            }
        };

        Self {
            delivery,
            registered: None,
            config,
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        match self.delivery {
            Delivery::Foreground { .. } => DeliveryMode::Foreground,
            Delivery::Background(_) => DeliveryMode::Background,
        }
    }

    /// Topic registered on this runner, if any
    pub fn topic(&self) -> Option<&str> {
        self.registered.as_deref()
    }

    /// Subscribe the channel to `topic` and route its frames to `on_frame`.
    ///
    /// Returns once the store has acknowledged the subscription. A runner
    /// accepts exactly one registration.
    pub async fn register_topic(&mut self, topic: &str, on_frame: FrameCallback) -> Result<()> {
        if let Some(existing) = &self.registered {
            return Err(PubKvError::subscription(
                topic,
                format!("runner already delivers topic '{}'", existing),
            ));
        }

        match &mut self.delivery {
            Delivery::Foreground {
                channel, callbacks, ..
            } => {
                channel.get_mut().subscribe(topic).await?;
                callbacks.insert(topic.to_string(), on_frame);
            }
            Delivery::Background(worker) => {
                let (ack_tx, ack_rx) = oneshot::channel();
                let control = Control::Register {
                    topic: topic.to_string(),
                    on_frame,
                    ack: ack_tx,
                };
                worker
                    .control_tx
                    .send(control)
                    .map_err(|_| PubKvError::subscription(topic, "runner is stopped"))?;
                ack_rx.await.map_err(|_| {
                    PubKvError::subscription(topic, "background task exited before subscribing")
                })??;
            }
        }

        self.registered = Some(topic.to_string());
        debug!("Registered topic {} on {} runner", topic, self.mode());
        Ok(())
    }

    /// Foreground: wait for one message frame and dispatch it. Background: no-op.
    ///
    /// A pending foreground `start` returns an error as soon as `stop` is
    /// called, and so does every later call.
    pub async fn start(&self) -> Result<()> {
        let Delivery::Foreground {
            channel,
            callbacks,
            cancel,
        } = &self.delivery
        else {
            return Ok(());
        };
        let topic = self.registered.as_deref().unwrap_or_default();
        let stopped = || PubKvError::subscription(topic, "subscription stopped");

        let mut cancelled = cancel.subscribe();
        if *cancelled.borrow_and_update() {
            return Err(stopped());
        }

        let mut channel = tokio::select! {
            biased;
            _ = cancelled.changed() => return Err(stopped()),
            guard = channel.lock() => guard,
        };

        loop {
            let frame = tokio::select! {
                biased;
                _ = cancelled.changed() => return Err(stopped()),
                frame = channel.next_frame() => frame?,
            };

            match frame {
                Some(frame) if frame.is_message() => {
                    dispatch(callbacks, frame);
                    return Ok(());
                }
                Some(frame) => {
                    debug!("Skipping {} acknowledgement on {}", frame.kind, frame.channel);
                }
                None => {
                    return Err(PubKvError::subscription(topic, "pub/sub channel closed"));
                }
            }
        }
    }

    /// Stop delivery.
    ///
    /// Foreground runners cancel any pending `start`. Background runners
    /// signal their task and wait up to the configured stop timeout, then
    /// abort it. An abort only takes effect at the task's next await point,
    /// so a callback that never returns keeps `stop` waiting. After this
    /// returns no callback of this runner runs again. Safe to call repeatedly.
    pub async fn stop(&self) {
        let worker = match &self.delivery {
            Delivery::Foreground { cancel, .. } => {
                if !cancel.send_replace(true) {
                    info!("Foreground subscription runner stopped (topic: {})", self.topic_name());
                }
                return;
            }
            Delivery::Background(worker) => worker,
        };
        let Some(mut handle) = worker.handle.lock().take() else {
            return;
        };

        let _ = worker.shutdown_tx.send(true);
        match tokio::time::timeout(self.config.stop_timeout, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Background subscription task ended abnormally: {}", e),
            Err(_) => {
                warn!(
                    "Background subscription task did not stop within {:?}, aborting",
                    self.config.stop_timeout
                );
                handle.abort();
                let _ = handle.await;
            }
        }

        info!("Subscription runner stopped (topic: {})", self.topic_name());
    }

    /// True while a background task is running
    pub fn is_alive(&self) -> bool {
        match &self.delivery {
            Delivery::Background(worker) => worker
                .handle
                .lock()
                .as_ref()
                .is_some_and(|handle| !handle.is_finished()),
            Delivery::Foreground { .. } => false,
        }
    }

    fn topic_name(&self) -> &str {
        self.registered.as_deref().unwrap_or("<none>")
    }
}

impl Drop for SubscriptionRunner {
    fn drop(&mut self) {
        if let Delivery::Background(worker) = &mut self.delivery {
            if let Some(handle) = worker.handle.get_mut().take() {
                debug!("Aborting background subscription task of dropped runner");
                handle.abort();
            }
        }
    }
}

async fn run_worker(
    mut channel: Box<dyn PubSubChannel>,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut callbacks: HashMap<String, FrameCallback> = HashMap::new();

    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => WorkerEvent::Shutdown,
            control = control_rx.recv() => WorkerEvent::Control(control),
            frame = channel.next_frame() => WorkerEvent::Frame(frame),
        };

        match event {
            WorkerEvent::Shutdown | WorkerEvent::Control(None) => break,
            WorkerEvent::Control(Some(Control::Register {
                topic,
                on_frame,
                ack,
            })) => {
                let result = channel.subscribe(&topic).await;
                if result.is_ok() {
                    callbacks.insert(topic, on_frame);
                }
                let _ = ack.send(result);
            }
            WorkerEvent::Frame(Ok(Some(frame))) => {
                if frame.is_message() {
                    dispatch(&callbacks, frame);
                }
            }
            WorkerEvent::Frame(Ok(None)) => {
                warn!("Pub/sub channel closed, background subscription ends");
                break;
            }
            WorkerEvent::Frame(Err(e)) => {
                error!("Pub/sub channel failed, background subscription ends: {}", e);
                break;
            }
        }
    }

    debug!("Background subscription task exiting");
}

fn dispatch(callbacks: &HashMap<String, FrameCallback>, frame: Frame) {
    let Some(on_frame) = callbacks.get(&frame.channel) else {
        debug!("No callback for channel {}", frame.channel);
        return;
    };

    let channel = frame.channel.clone();
    if catch_unwind(AssertUnwindSafe(|| on_frame(frame))).is_err() {
        error!("Subscription callback panicked on topic {}", channel);
    }
}
