//! Fehlerdefinitionen für das Gesture-Modul

use thiserror::Error;

/// Fehlertypen für die Gesture-Engine
#[derive(Debug, Error)]
pub enum GestureError {
    /// Fehler in der Geräte- oder Binding-Konfiguration
    #[error("Konfigurationsfehler: {0}")]
    ConfigError(String),

    /// Fehler bei der Initialisierung einer Gesture-Engine
    #[error("Initialisierungsfehler: {0}")]
    InitializationError(String),

    /// Fehler bei der Kommunikation über Kanäle
    #[error("Kanalfehler: {0}")]
    ChannelError(String),

    /// Fehler bei der Thread-Verwaltung
    #[error("Thread-Fehler: {0}")]
    ThreadError(String),

    /// Fehler bei der Verarbeitung von Ereignissen
    #[error("Verarbeitungsfehler: {0}")]
    ProcessingError(String),

    /// Das adressierte Eingabegerät ist nicht registriert
    #[error("Unbekanntes Gerät: {0}")]
    UnknownDevice(String),

    /// Allgemeiner Fehler
    #[error("Allgemeiner Fehler: {0}")]
    General(String),
}
