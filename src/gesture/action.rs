//! Aktions-Anbindung für erkannte Swipe-Gesten.
//!
//! Eine ausgelöste Geste ruft genau eine Richtungs-Aktion auf. Die Aktionen
//! sind als Trait-Objekte angebunden, damit der Tracker nichts über das
//! Zielsystem wissen muss. Die mitgelieferte Implementierung erzeugt
//! synthetische Tastatur-Events auf dem Ausgabekanal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::gesture::Direction;

/// Schnittstelle für eine gebundene Richtungs-Aktion
///
/// Der Tracker ruft `invoke` pro ausgelöster Geste genau zweimal auf:
/// einmal mit `pressed = true`, direkt danach mit `pressed = false`.
pub trait SwipeAction: Send + Sync + 'static {
    /// Führt eine Hälfte der Aktion aus (Press oder Release)
    fn invoke(&self, pressed: bool);

    /// Kurzbezeichnung für Logging und Debugging
    fn label(&self) -> String;
}

/// Die vier optionalen Richtungs-Aktionen eines Geräts
///
/// Eine fehlende Bindung ist gültig und bedeutet "nichts tun" für diese
/// Richtung.
#[derive(Clone, Default)]
pub struct ActionBindings {
    pub up: Option<Arc<dyn SwipeAction>>,
    pub down: Option<Arc<dyn SwipeAction>>,
    pub left: Option<Arc<dyn SwipeAction>>,
    pub right: Option<Arc<dyn SwipeAction>>,
}

impl ActionBindings {
    /// Liefert die Aktion für die angegebene Richtung, falls gebunden
    pub fn get(&self, direction: Direction) -> Option<&Arc<dyn SwipeAction>> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
            Direction::Left => self.left.as_ref(),
            Direction::Right => self.right.as_ref(),
        }
    }

    /// Anzahl der gebundenen Richtungen
    pub fn bound_count(&self) -> usize {
        [&self.up, &self.down, &self.left, &self.right]
            .iter()
            .filter(|binding| binding.is_some())
            .count()
    }
}

impl fmt::Debug for ActionBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn describe(binding: &Option<Arc<dyn SwipeAction>>) -> Option<String> {
            binding.as_ref().map(|action| action.label())
        }

        f.debug_struct("ActionBindings")
            .field("up", &describe(&self.up))
            .field("down", &describe(&self.down))
            .field("left", &describe(&self.left))
            .field("right", &describe(&self.right))
            .finish()
    }
}

/// Tastencodes, die von den Bindings erzeugt werden können
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::ArrowUp => write!(f, "ArrowUp"),
            KeyCode::ArrowDown => write!(f, "ArrowDown"),
            KeyCode::ArrowLeft => write!(f, "ArrowLeft"),
            KeyCode::ArrowRight => write!(f, "ArrowRight"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            KeyCode::Home => write!(f, "Home"),
            KeyCode::End => write!(f, "End"),
            KeyCode::Space => write!(f, "Space"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Escape => write!(f, "Escape"),
            KeyCode::Backspace => write!(f, "Backspace"),
        }
    }
}

/// Synthetisches Tastatur-Event, das Ausgabeformat des Systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub pressed: bool,
}

/// Standard-Aktion: erzeugt ein Press/Release-Paar von Tastatur-Events
///
/// Jeder `invoke`-Aufruf wird als einzelnes [`KeyEvent`] auf den Ausgabekanal
/// gelegt. Ein voller Kanal verwirft das Event mit einer Warnung; der Tracker
/// darf davon nie blockiert werden.
pub struct KeyTapAction {
    key: KeyCode,
    sender: mpsc::Sender<KeyEvent>,
}

impl KeyTapAction {
    pub fn new(key: KeyCode, sender: mpsc::Sender<KeyEvent>) -> Self {
        Self { key, sender }
    }
}

impl SwipeAction for KeyTapAction {
    fn invoke(&self, pressed: bool) {
        let event = KeyEvent {
            key: self.key,
            pressed,
        };

        if let Err(e) = self.sender.try_send(event) {
            warn!("Failed to send key event {:?}: {}", event, e);
        }
    }

    fn label(&self) -> String {
        format!("key:{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_tap_action_sends_press_release_pair() {
        let (tx, mut rx) = mpsc::channel(8);
        let action = KeyTapAction::new(KeyCode::PageDown, tx);

        action.invoke(true);
        action.invoke(false);

        let press = rx.try_recv().expect("press event missing");
        let release = rx.try_recv().expect("release event missing");

        assert_eq!(
            press,
            KeyEvent {
                key: KeyCode::PageDown,
                pressed: true
            }
        );
        assert_eq!(
            release,
            KeyEvent {
                key: KeyCode::PageDown,
                pressed: false
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_channel_drops_event_without_panicking() {
        let (tx, mut rx) = mpsc::channel(1);
        let action = KeyTapAction::new(KeyCode::Home, tx);

        action.invoke(true);
        action.invoke(false); // Kanal voll, Event wird verworfen

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn bindings_lookup_by_direction() {
        let (tx, _rx) = mpsc::channel(8);
        let bindings = ActionBindings {
            up: Some(Arc::new(KeyTapAction::new(KeyCode::ArrowUp, tx.clone()))),
            down: None,
            left: None,
            right: Some(Arc::new(KeyTapAction::new(KeyCode::ArrowRight, tx))),
        };

        assert!(bindings.get(Direction::Up).is_some());
        assert!(bindings.get(Direction::Down).is_none());
        assert!(bindings.get(Direction::Left).is_none());
        assert!(bindings.get(Direction::Right).is_some());
        assert_eq!(bindings.bound_count(), 2);
    }
}
