//! Manager für Gesture-Engines zur Verwaltung mehrerer Eingabegeräte

use color_eyre::eyre::Report;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::gesture::engine::GestureEngineHandle;
use crate::gesture::{GestureError, GestureEvent, KeyEvent};
use crate::input::event_collector::RawInputEvent;

/// Manager für Gesture-Engines: eine Engine pro physischem Eingabegerät
///
/// Der Manager besitzt die (Konfiguration, Zustand)-Paare aller Geräte über
/// deren Engine-Handles; es gibt keine implizite globale Registrierung.
pub struct GestureEngineManager {
    /// Aktive Engines, indexiert nach Gerätename
    active_engines: HashMap<
        String,
        (
            GestureEngineHandle,
            mpsc::Receiver<GestureEvent>,
            mpsc::Sender<RawInputEvent>,
        ),
    >,

    /// Receiver für Roh-Events aus der Eingabequelle
    input_rx: mpsc::Receiver<RawInputEvent>,

    /// Ausgabekanal für ausgelöste Gesten
    gesture_tx: mpsc::Sender<GestureEvent>,

    /// Ausgabekanal für synthetische Tastatur-Events (an die Bindings verteilt)
    key_tx: mpsc::Sender<KeyEvent>,
}

impl GestureEngineManager {
    /// Erstellt einen neuen Gesture-Engine-Manager
    pub fn new(
        input_rx: mpsc::Receiver<RawInputEvent>,
        gesture_tx: mpsc::Sender<GestureEvent>,
        key_tx: mpsc::Sender<KeyEvent>,
    ) -> Self {
        info!("Creating new GestureEngineManager");

        Self {
            active_engines: HashMap::new(),
            input_rx,
            gesture_tx,
            key_tx,
        }
    }

    /// Aktiviert eine Engine für das angegebene Gerät
    ///
    /// Eine bereits laufende Engine gleichen Namens wird vorher
    /// heruntergefahren.
    pub async fn activate_device(&mut self, device_config: &DeviceConfig) -> Result<(), GestureError> {
        // Konfiguration validieren, bevor irgendetwas gestartet wird
        device_config.validate()?;

        // Prüfen, ob bereits eine Engine für dieses Gerät aktiv ist
        if let Some(mut engine) = self.active_engines.remove(&device_config.name) {
            info!("Deactivating existing gesture engine: {}", device_config.name);

            // Bestehende Engine herunterfahren
            if let Err(e) = engine.0.shutdown().await {
                warn!("Error shutting down existing engine: {}", e);
                // Weitermachen trotz Fehler
            }
        }

        info!("Activating gesture engine for device: {}", device_config.name);

        let tracker_config = device_config.tracker_config(self.key_tx.clone());

        let mut engine_handle = GestureEngineHandle::new(device_config.name.clone());
        let (gesture_receiver, event_sender) = engine_handle.start(tracker_config)?;

        self.active_engines.insert(
            device_config.name.clone(),
            (engine_handle, gesture_receiver, event_sender),
        );

        Ok(())
    }

    /// Routing-Schleife: Roh-Events an die Engines verteilen, ausgelöste
    /// Gesten einsammeln
    ///
    /// Läuft, bis der Eingabekanal geschlossen ist; danach werden alle
    /// Engines heruntergefahren und ihre letzten Gesten noch weitergereicht.
    pub async fn run(&mut self) -> Result<(), Report> {
        info!("Start gesture routing");
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;

            // Eingehende Roh-Events an die zuständige Engine weiterreichen
            let mut input_closed = false;
            loop {
                match self.input_rx.try_recv() {
                    Ok(event) => match self.active_engines.get(&event.device) {
                        Some((_engine, _receiver, sender)) => {
                            if let Err(e) = sender.try_send(event) {
                                warn!("{}", e);
                            }
                        }
                        None => {
                            debug!("No engine registered for device: {}", event.device);
                        }
                    },
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        input_closed = true;
                        break;
                    }
                }
            }

            // Ausgelöste Gesten einsammeln und weiterreichen
            for (_device, (_engine, receiver, _sender)) in &mut self.active_engines {
                while let Ok(gesture) = receiver.try_recv() {
                    info!("Gesture fired: {} -> {}", gesture.device, gesture.direction);
                    if let Err(e) = self.gesture_tx.try_send(gesture) {
                        warn!("{}", e);
                    }
                }
            }

            if input_closed {
                info!("Input channel closed, shutting down gesture engines");
                self.drain_and_shutdown().await;
                return Ok(());
            }
        }
    }

    /// Fährt alle Engines herunter und sammelt ihre letzten Gesten ein
    async fn drain_and_shutdown(&mut self) {
        let devices: Vec<String> = self.active_engines.keys().cloned().collect();

        for device in devices {
            if let Some((mut handle, mut receiver, sender)) = self.active_engines.remove(&device) {
                // Eingabekanal schließen, damit die Engine ihre Queue leert
                drop(sender);

                if let Err(e) = handle.shutdown().await {
                    warn!("Error shutting down engine {}: {}", device, e);
                }

                while let Ok(gesture) = receiver.try_recv() {
                    info!("Gesture fired: {} -> {}", gesture.device, gesture.direction);
                    if let Err(e) = self.gesture_tx.try_send(gesture) {
                        warn!("{}", e);
                    }
                }
            }
        }
    }

    /// Deaktiviert die Engine des angegebenen Geräts
    pub async fn deactivate_device(&mut self, device: &str) -> Result<(), GestureError> {
        info!("Deactivating gesture engine for device: {}", device);

        // Prüfen, ob eine Engine für dieses Gerät aktiv ist
        if let Some(mut engine) = self.active_engines.remove(device) {
            // Engine herunterfahren
            if let Err(e) = engine.0.shutdown().await {
                warn!("Error shutting down engine: {}", e);
                return Err(e);
            }

            info!("Gesture engine deactivated: {}", device);
            Ok(())
        } else {
            warn!("No active engine for device: {}", device);
            Ok(()) // Kein Fehler, wenn für das Gerät keine Engine aktiv ist
        }
    }

    /// Deaktiviert alle aktiven Engines
    pub async fn deactivate_all(&mut self) -> Result<(), GestureError> {
        info!("Deactivating all gesture engines");

        let devices: Vec<String> = self.active_engines.keys().cloned().collect();

        for device in devices {
            if let Err(e) = self.deactivate_device(&device).await {
                warn!("Error deactivating engine for {}: {}", device, e);
                // Weitermachen mit den anderen Engines
            }
        }

        info!("All gesture engines deactivated");
        Ok(())
    }

    /// Prüft, ob für das angegebene Gerät eine Engine aktiv ist
    pub fn is_device_active(&self, device: &str) -> bool {
        self.active_engines.contains_key(device)
    }

    /// Gibt die Namen aller Geräte mit aktiver Engine zurück
    pub fn active_devices(&self) -> Vec<String> {
        self.active_engines.keys().cloned().collect()
    }
}
