//! Gesture engine with statum state machine for per-device swipe tracking
//!
//! Implements a 5-state lifecycle around one swipe tracker with compile-time
//! state safety. Each engine runs in its own tokio task and owns the session
//! state of exactly one physical input device, so all reducer calls against
//! that state are serialized by construction.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Configured ──► Active ──► Deactivating ──► Deactivated
//!                     │              │           ▲
//!                     └──────────────┘           │
//!                       (activate/deactivate)    │
//!                                              (shutdown)
//! ```
//!
//! # Architecture
//!
//! ```text
//! RawInputEvent ──► [SwipeTracker] ──► GestureEvent
//!       ▲                 │                 │
//!       │           [ActionBindings]        ▼
//!   Input Channel    (press/release)   Gesture Channel
//! ```

use chrono::Local;
use statum::{machine, state};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gesture::tracker::{SwipeTracker, TrackerConfig};
use crate::gesture::{GestureError, GestureEvent};
use crate::input::event_collector::RawInputEvent;

/// States for gesture engine lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum GestureEngineState {
    Initializing, // Setting up engine structure
    Configured,   // Tracker built from validated configuration
    Active,       // Processing events in main loop
    Deactivating, // Shutting down gracefully
    Deactivated,  // Fully stopped, ready for cleanup
}

/// Gesture engine with compile-time state safety via statum
///
/// Wraps one [`SwipeTracker`] and manages its lifecycle through distinct
/// states. Each state has specific allowed operations enforced at compile
/// time.
#[machine]
pub struct GestureEngine<S: GestureEngineState> {
    input_receiver: mpsc::Receiver<RawInputEvent>,
    gesture_sender: mpsc::Sender<GestureEvent>,
    device: String,
    tracker: Option<SwipeTracker>,
}

impl<S: GestureEngineState> GestureEngine<S> {
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl GestureEngine<Initializing> {
    pub fn create(
        input_receiver: mpsc::Receiver<RawInputEvent>,
        gesture_sender: mpsc::Sender<GestureEvent>,
        device: String,
    ) -> Self {
        info!("Initializing new gesture engine: {}", device);

        Self::new(
            input_receiver,
            gesture_sender,
            device,
            None, // tracker
        )
    }

    /// Builds the tracker from the configuration and transitions to Configured
    ///
    /// Rejects non-positive thresholds and zero timeouts; both are supposed
    /// to be caught at configuration-load time already, so a failure here
    /// points at a wiring bug.
    pub fn configure(
        mut self,
        config: TrackerConfig,
    ) -> Result<GestureEngine<Configured>, GestureError> {
        info!("Configuring gesture engine: {}", self.device);

        if config.threshold <= 0 {
            error!(
                "Rejecting non-positive threshold {} for {}",
                config.threshold, self.device
            );
            return Err(GestureError::ConfigError(format!(
                "Threshold must be positive, got {}",
                config.threshold
            )));
        }

        if config.timeout.is_zero() {
            error!("Rejecting zero timeout for {}", self.device);
            return Err(GestureError::ConfigError(
                "Timeout must be non-zero".to_string(),
            ));
        }

        debug!(
            "Tracker parameters for {}: threshold={}, timeout={:?}, bindings={:?}",
            self.device, config.threshold, config.timeout, config.bindings
        );

        self.tracker = Some(SwipeTracker::new(config));

        info!("Engine configured successfully: {}", self.device);
        Ok(self.transition())
    }
}

impl GestureEngine<Configured> {
    pub fn activate(self) -> GestureEngine<Active> {
        info!("Activating gesture engine: {}", self.device);
        self.transition()
    }
}

impl GestureEngine<Active> {
    /// Feeds a single raw event through the tracker
    ///
    /// Queries the monotonic clock once per event. Returns the fired gesture
    /// if the threshold was crossed; the bound action has already run by
    /// then.
    pub fn process_event(
        &mut self,
        event: &RawInputEvent,
    ) -> Result<Option<GestureEvent>, GestureError> {
        let tracker = match &mut self.tracker {
            Some(t) => t,
            None => {
                return Err(GestureError::ProcessingError(
                    "No tracker available".to_string(),
                ))
            }
        };

        let decision = tracker.process(event, Instant::now());

        Ok(decision.map(|direction| GestureEvent {
            device: self.device.clone(),
            direction,
            timestamp: Local::now(),
        }))
    }

    /// Sends a fired gesture to the output channel
    pub async fn send_gesture(&self, gesture: GestureEvent) -> Result<(), GestureError> {
        match self.gesture_sender.try_send(gesture) {
            Ok(_) => {
                debug!("Gesture sent successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to send gesture event: {}", e);
                Err(GestureError::ChannelError(format!(
                    "Failed to send gesture event: {}",
                    e
                )))
            }
        }
    }

    /// Main processing loop with graceful shutdown support
    ///
    /// Runs until the shutdown signal arrives or the input channel closes.
    /// Queued events are drained before a shutdown is honored, so a replay
    /// that ends right before shutdown still produces its gestures.
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<GestureEngine<Deactivating>, GestureError> {
        info!("Starting event processing loop for: {}", self.device);

        loop {
            tokio::select! {
                biased;

                maybe_event = self.input_receiver.recv() => {
                    match maybe_event {
                        Some(event) => {
                            match self.process_event(&event) {
                                Ok(Some(gesture)) => {
                                    if let Err(e) = self.send_gesture(gesture).await {
                                        warn!("Failed to forward gesture: {}", e);
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => {
                                    error!("Error processing event: {}", e);
                                }
                            }
                        }
                        None => {
                            info!("Input channel closed for: {}", self.device);
                            break;
                        }
                    }
                }

                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received for: {}", self.device);
                    break;
                }
            }
        }

        info!("Transitioning to Deactivating state: {}", self.device);
        Ok(self.transition())
    }

    pub fn deactivate(self) -> GestureEngine<Deactivating> {
        info!("Deactivating gesture engine: {}", self.device);
        self.transition()
    }
}

impl GestureEngine<Deactivating> {
    /// Releases the tracker and transitions to Deactivated state
    pub async fn shutdown(mut self) -> GestureEngine<Deactivated> {
        info!("Shutting down gesture engine: {}", self.device);

        if let Some(tracker) = self.tracker.take() {
            debug!(
                "Dropping tracker for {} (session active: {})",
                self.device,
                tracker.is_active()
            );
        }

        // In den Deactivated-Zustand wechseln
        info!("Engine shut down successfully: {}", self.device);
        self.transition()
    }
}

impl GestureEngine<Deactivated> {}

/// Handle for managing a gesture engine in a tokio task
///
/// Provides lifecycle management for engines running in background tasks.
/// Handles task spawning, graceful shutdown, and resource cleanup.
#[derive(Debug)]
pub struct GestureEngineHandle {
    pub device: String,

    task_handle: Option<JoinHandle<Result<(), GestureError>>>,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl GestureEngineHandle {
    pub fn new(device: String) -> Self {
        Self {
            device,
            task_handle: None,
            shutdown_tx: None,
        }
    }

    /// Starts the engine in a tokio task and returns communication channels
    ///
    /// Creates the engine, configures it with the tracker configuration,
    /// activates it, and spawns the main processing loop in a background
    /// task.
    ///
    /// # Returns
    ///
    /// * Output receiver for fired gestures
    /// * Input sender for raw motion events
    pub fn start(
        &mut self,
        config: TrackerConfig,
    ) -> Result<(mpsc::Receiver<GestureEvent>, mpsc::Sender<RawInputEvent>), GestureError> {
        let (event_sender, event_receiver) = mpsc::channel(100);
        let (gesture_sender, gesture_receiver) = mpsc::channel(100);
        let device = self.device.clone();

        let engine =
            GestureEngine::create(event_receiver, gesture_sender, device.clone()).configure(config)?;

        let active_engine = engine.activate();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let task_handle = tokio::spawn(async move {
            info!("Spawning running engine: {}", device);
            match active_engine.run_until_shutdown(shutdown_rx).await {
                Ok(deactivating_engine) => {
                    info!("Engine entering deactivating state: {}", device);
                    let _ = deactivating_engine.shutdown().await;
                    Ok(())
                }
                Err(e) => {
                    error!("Error running engine: {} - {}", device, e);
                    Err(e)
                }
            }
        });

        self.task_handle = Some(task_handle);

        info!("Gesture engine activated: {}", self.device);
        Ok((gesture_receiver, event_sender))
    }

    /// Gracefully shuts down the engine and waits for task completion
    pub async fn shutdown(&mut self) -> Result<(), GestureError> {
        debug!("Sending shutdown signal to engine: {}", self.device);

        // Send shutdown signal
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Engine task already terminated: {}", self.device);
            }
        }

        // Wait for task completion
        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => {
                    debug!("Engine task completed: {}", self.device);
                    result
                }
                Err(e) => {
                    error!("Engine task panicked: {} - {}", self.device, e);
                    Err(GestureError::ThreadError(format!(
                        "Engine task panicked: {}",
                        e
                    )))
                }
            }
        } else {
            debug!("Engine already shut down: {}", self.device);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::ActionBindings;
    use std::time::Duration;

    fn channels() -> (
        mpsc::Receiver<RawInputEvent>,
        mpsc::Sender<GestureEvent>,
        mpsc::Receiver<GestureEvent>,
    ) {
        let (_event_tx, event_rx) = mpsc::channel(8);
        let (gesture_tx, gesture_rx) = mpsc::channel(8);
        (event_rx, gesture_tx, gesture_rx)
    }

    #[test]
    fn configure_rejects_non_positive_threshold() {
        let (event_rx, gesture_tx, _gesture_rx) = channels();
        let engine = GestureEngine::create(event_rx, gesture_tx, "trackball".to_string());

        let config = TrackerConfig {
            threshold: 0,
            timeout: Duration::from_millis(300),
            bindings: ActionBindings::default(),
        };

        assert!(matches!(
            engine.configure(config),
            Err(GestureError::ConfigError(_))
        ));
    }

    #[test]
    fn configure_rejects_zero_timeout() {
        let (event_rx, gesture_tx, _gesture_rx) = channels();
        let engine = GestureEngine::create(event_rx, gesture_tx, "trackball".to_string());

        let config = TrackerConfig {
            threshold: 50,
            timeout: Duration::ZERO,
            bindings: ActionBindings::default(),
        };

        assert!(matches!(
            engine.configure(config),
            Err(GestureError::ConfigError(_))
        ));
    }

    #[test]
    fn configure_accepts_valid_config() {
        let (event_rx, gesture_tx, _gesture_rx) = channels();
        let engine = GestureEngine::create(event_rx, gesture_tx, "trackball".to_string());

        let config = TrackerConfig {
            threshold: 50,
            timeout: Duration::from_millis(300),
            bindings: ActionBindings::default(),
        };

        let configured = engine.configure(config).expect("valid config rejected");
        assert_eq!(configured.device(), "trackball");
    }
}
