//! Modul für die Erkennung von Richtungs-Gesten aus relativen Bewegungsdaten.
//!
//! Dieses Modul enthält den Swipe-Tracker (den Kern der Erkennung), die pro
//! Gerät laufende Gesture-Engine auf Basis einer Statum State Machine sowie
//! den Manager, der mehrere Geräte-Engines parallel verwaltet.

pub mod action;
pub mod engine;
pub mod error;
pub mod manager;
pub mod tracker;

// Re-exports für einfacheren Zugriff
pub use action::{ActionBindings, KeyCode, KeyEvent, KeyTapAction, SwipeAction};
pub use engine::{GestureEngine, GestureEngineHandle, GestureEngineState};
pub use error::GestureError;
pub use manager::GestureEngineManager;
pub use tracker::{SwipeTracker, TrackerConfig};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Die vier erkennbaren Swipe-Richtungen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// Ausgabe-Event der Gesture-Engine: eine ausgelöste Richtungs-Geste
#[derive(Debug, Clone)]
pub struct GestureEvent {
    /// Name des Geräts, auf dem die Geste erkannt wurde
    pub device: String,

    /// Die ausgelöste Richtung
    pub direction: Direction,

    /// Zeitstempel der Auslösung (nur für Logging und Anzeige)
    pub timestamp: DateTime<Local>,
}
