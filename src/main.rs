use color_eyre::{eyre::eyre, Result};
use tokio::sync::mpsc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use trackswipe::config::{self, AppConfig};
use trackswipe::gesture::GestureEngineManager;
use trackswipe::input::event_collector::CollectorHandle;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let trace_path = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("Usage: trackswipe <trace.toml>"))?;

    // Konfiguration laden (Default wird beim ersten Start angelegt)
    let config_path = config::ensure_default_config().await?;
    info!("Loading configuration from {}", config_path.display());
    let app_config = AppConfig::load(&config_path).await?;

    // Kanäle für die Pipeline erstellen
    let (input_tx, input_rx) = mpsc::channel(1000);
    let (gesture_tx, mut gesture_rx) = mpsc::channel(100);
    let (key_tx, mut key_rx) = mpsc::channel(100);

    // Für jedes konfigurierte Gerät eine Engine starten
    let mut manager = GestureEngineManager::new(input_rx, gesture_tx, key_tx);
    for device in &app_config.devices {
        manager
            .activate_device(device)
            .await
            .map_err(|e| eyre!("Failed to activate device {}: {}", device.name, e))?;
    }

    // Replay-Quelle starten
    info!("Replaying motion trace: {}", trace_path);
    let trace_content = tokio::fs::read_to_string(&trace_path)
        .await
        .map_err(|e| eyre!("Failed to read trace file {}: {}", trace_path, e))?;
    let _collector_handle = CollectorHandle::spawn(trace_content, input_tx)
        .map_err(|e| eyre!("Failed to spawn collector: {}", e))?;

    let _manager_handle = tokio::spawn(async move {
        if let Err(e) = manager.run().await {
            error!("Gesture routing terminated with error: {}", e);
        }
    });

    // Ausgelöste Gesten und synthetische Tastatur-Events ausgeben
    let mut gestures_closed = false;
    let mut keys_closed = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }

            maybe_gesture = gesture_rx.recv(), if !gestures_closed => {
                match maybe_gesture {
                    Some(gesture) => info!(
                        "Swipe {} on {} at {}",
                        gesture.direction,
                        gesture.device,
                        gesture.timestamp.format("%H:%M:%S.%3f")
                    ),
                    None => gestures_closed = true,
                }
            }

            maybe_key = key_rx.recv(), if !keys_closed => {
                match maybe_key {
                    Some(key) => info!(
                        "Key {} {}",
                        key.key,
                        if key.pressed { "pressed" } else { "released" }
                    ),
                    None => keys_closed = true,
                }
            }
        }

        if gestures_closed && keys_closed {
            info!("Replay finished, all channels drained");
            break;
        }
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
