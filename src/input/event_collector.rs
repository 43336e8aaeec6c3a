use chrono::{DateTime, Local};
use serde::Deserialize;
use statum::{machine, state};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// Raw input event with precise chrono timestamps (log/display only; the
// gesture core consumes the engine's monotonic clock instead)
#[derive(Debug, Clone)]
pub struct RawInputEvent {
    pub device: String,
    pub kind: RawEventKind,
    pub timestamp: DateTime<Local>,
}

// Event payload; only relative motion is meaningful to the swipe tracker,
// wheel and button events pass through its ignore path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Motion { axis: MotionAxis, delta: i32 },
    Wheel { delta: i32 },
    Button { code: u16, pressed: bool },
}

// Motion axis tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum MotionAxis {
    X,
    Y,
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to parse trace: {0}")]
    TraceParseError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),
}

// One raw line of a trace file
#[derive(Debug, Clone, Deserialize)]
struct TraceEntry {
    device: String,
    at_ms: u64,
    kind: String,
    #[serde(default)]
    value: i32,
    #[serde(default)]
    pressed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TraceFile {
    #[serde(default)]
    events: Vec<TraceEntry>,
}

// A decoded replay step, ordered by its offset from replay start
#[derive(Debug, Clone)]
pub struct ReplayStep {
    pub at_ms: u64,
    pub device: String,
    pub kind: RawEventKind,
}

/// Parses a TOML motion trace into replay steps sorted by time offset
pub fn parse_trace(content: &str) -> Result<Vec<ReplayStep>, CollectorError> {
    let trace: TraceFile =
        toml::from_str(content).map_err(|e| CollectorError::TraceParseError(e.to_string()))?;

    let mut steps = Vec::with_capacity(trace.events.len());
    for entry in trace.events {
        steps.push(decode_entry(entry)?);
    }

    // Stable sort keeps file order for identical offsets
    steps.sort_by_key(|step| step.at_ms);

    Ok(steps)
}

fn decode_entry(entry: TraceEntry) -> Result<ReplayStep, CollectorError> {
    let kind = match entry.kind.as_str() {
        "x" => RawEventKind::Motion {
            axis: MotionAxis::X,
            delta: entry.value,
        },
        "y" => RawEventKind::Motion {
            axis: MotionAxis::Y,
            delta: entry.value,
        },
        "wheel" => RawEventKind::Wheel { delta: entry.value },
        "button" => RawEventKind::Button {
            code: entry.value as u16,
            pressed: entry.pressed.unwrap_or(true),
        },
        other => {
            return Err(CollectorError::TraceParseError(format!(
                "Unknown event kind: {}",
                other
            )))
        }
    };

    Ok(ReplayStep {
        at_ms: entry.at_ms,
        device: entry.device,
        kind,
    })
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum ReplayState {
    Initializing,
    Replaying,
}

#[machine]
#[derive(Debug)]
pub struct ReplayCollector<S: ReplayState> {
    // Decoded trace, sorted by time offset
    steps: Vec<ReplayStep>,

    // Channel for sending events to the engine manager
    event_sender: mpsc::Sender<RawInputEvent>,
}

// Implementation for Initializing state
impl ReplayCollector<Initializing> {
    pub fn create(
        trace_content: &str,
        event_sender: mpsc::Sender<RawInputEvent>,
    ) -> Result<Self, CollectorError> {
        debug!("Creating Replay Collector");

        let steps = parse_trace(trace_content)?;
        info!("Parsed motion trace with {} events", steps.len());

        Ok(Self::new(steps, event_sender))
    }

    // Validate the trace and transition to Replaying state
    pub fn initialize(self) -> Result<ReplayCollector<Replaying>, CollectorError> {
        if self.steps.is_empty() {
            warn!("Trace contains no events, replay will finish immediately");
        } else {
            let last = self.steps.last().map(|step| step.at_ms).unwrap_or(0);
            info!(
                "Replay Collector initialized: {} events over {}ms",
                self.steps.len(),
                last
            );
        }

        Ok(self.transition())
    }
}

// Implementation for Replaying state
impl ReplayCollector<Replaying> {
    // Replay all steps, paced by their recorded offsets
    pub async fn run_replay(mut self) -> Result<(), CollectorError> {
        info!("Starting trace replay");

        let started = Instant::now();
        let steps = std::mem::take(&mut self.steps);
        let total = steps.len();

        for step in steps {
            let due = Duration::from_millis(step.at_ms);
            let elapsed = started.elapsed();
            if due > elapsed {
                tokio::time::sleep(due - elapsed).await;
            }

            let event = RawInputEvent {
                device: step.device,
                kind: step.kind,
                timestamp: Local::now(),
            };

            debug!("Replaying event: {:?}", event);

            if let Err(e) = self.event_sender.send(event).await {
                error!("Failed to send event to engine manager: {}", e);
                return Err(CollectorError::EventSendError(e.to_string()));
            }
        }

        info!("Trace replay finished: {} events sent", total);
        Ok(())
    }
}

// Public interface for spawning and running the collector
pub struct CollectorHandle {}

impl CollectorHandle {
    // Create a new collector and spawn it as a tokio task
    pub fn spawn(
        trace_content: String,
        event_sender: mpsc::Sender<RawInputEvent>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Replay Collector");

        // Parse errors surface here, before any task is spawned
        let collector = ReplayCollector::create(&trace_content, event_sender)?;

        let task_handle = tokio::spawn(async move {
            match collector.initialize() {
                Ok(replaying_state) => {
                    if let Err(e) = replaying_state.run_replay().await {
                        error!("Collector task terminated with error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to initialize Replay Collector: {}", e);
                }
            }
        });

        debug!("Tokio task spawned with handle: {:?}", task_handle);
        info!("Replay Collector successfully started");

        Ok(Self {})
    }
}
