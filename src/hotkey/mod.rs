//! Global hotkeys for the assistant, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive.  It must run on a **dedicated OS thread**; it cannot be
//! used inside a tokio task.
//!
//! [`HotkeyListener::start`] spawns that thread and forwards key presses
//! matched by [`HotkeyBindings`] as orchestrator [`Command`]s.  One key starts
//! listening for a voice command; one key per task selects it directly, so
//! the assistant is usable without finding the window.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use sight_assist::config::HotkeyConfig;
//! use sight_assist::hotkey::{HotkeyBindings, HotkeyListener};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let bindings = HotkeyBindings::from_config(&HotkeyConfig::default()).unwrap();
//! let _listener = HotkeyListener::start(bindings, tx).unwrap();
//!
//! // The orchestrator consumes `rx`.
//! ```

pub mod listener;

pub use listener::HotkeyListener;

use thiserror::Error;

use crate::config::HotkeyConfig;
use crate::pipeline::Command;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyError {
    #[error("unknown key name {0:?}")]
    UnknownKey(String),
    #[error("expected {expected} task keys, got {got}")]
    TaskKeyCount { expected: usize, got: usize },
    #[error("key {0:?} is bound twice")]
    Duplicate(String),
}

// ---------------------------------------------------------------------------
// HotkeyBindings
// ---------------------------------------------------------------------------

/// Key → command table.
#[derive(Debug, Clone, PartialEq)]
pub struct HotkeyBindings {
    listen: rdev::Key,
    tasks: [(rdev::Key, Task); 4],
}

impl HotkeyBindings {
    pub fn from_config(config: &HotkeyConfig) -> Result<Self, HotkeyError> {
        let key = |name: &str| parse_key(name).ok_or_else(|| HotkeyError::UnknownKey(name.to_string()));

        if config.task_keys.len() != Task::ALL.len() {
            return Err(HotkeyError::TaskKeyCount {
                expected: Task::ALL.len(),
                got: config.task_keys.len(),
            });
        }

        let listen = key(&config.listen_key)?;
        let mut tasks = [(listen, Task::FindBus); 4];
        for (slot, (name, task)) in tasks
            .iter_mut()
            .zip(config.task_keys.iter().zip(Task::ALL))
        {
            *slot = (key(name)?, task);
        }

        let bound: Vec<rdev::Key> = std::iter::once(listen)
            .chain(tasks.iter().map(|&(k, _)| k))
            .collect();
        for (i, name) in config.task_keys.iter().enumerate() {
            let k = bound[i + 1];
            if bound[..=i].contains(&k) {
                return Err(HotkeyError::Duplicate(name.clone()));
            }
        }

        Ok(Self { listen, tasks })
    }

    /// The command bound to a key press, if any.
    pub fn command_for(&self, key: rdev::Key) -> Option<Command> {
        if key == self.listen {
            return Some(Command::StartListening);
        }
        self.tasks
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, task)| Command::SelectTask(task))
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a hotkey name from a config string into an [`rdev::Key`].
///
/// Supports F1–F12, common named keys, digits and single ASCII letters.
///
/// ```
/// use sight_assist::hotkey::parse_key;
///
/// assert_eq!(parse_key("F9"),      Some(rdev::Key::F9));
/// assert_eq!(parse_key("Escape"),  Some(rdev::Key::Escape));
/// assert_eq!(parse_key("a"),       Some(rdev::Key::KeyA));
/// assert_eq!(parse_key("xyz"),     None);
/// ```
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let key = match key_str {
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,

        "Escape" | "Esc" => Key::Escape,
        "Space" => Key::Space,
        "Return" | "Enter" => Key::Return,
        "Tab" => Key::Tab,
        "Home" => Key::Home,
        "End" => Key::End,
        "PageUp" => Key::PageUp,
        "PageDown" => Key::PageDown,
        "Pause" => Key::Pause,
        "ScrollLock" => Key::ScrollLock,

        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,
        "0" => Key::Num0,

        other => return parse_letter(other),
    };
    Some(key)
}

fn parse_letter(s: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let mut chars = s.chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return None;
    }
    const LETTERS: [rdev::Key; 26] = [
        Key::KeyA, Key::KeyB, Key::KeyC, Key::KeyD, Key::KeyE, Key::KeyF, Key::KeyG,
        Key::KeyH, Key::KeyI, Key::KeyJ, Key::KeyK, Key::KeyL, Key::KeyM, Key::KeyN,
        Key::KeyO, Key::KeyP, Key::KeyQ, Key::KeyR, Key::KeyS, Key::KeyT, Key::KeyU,
        Key::KeyV, Key::KeyW, Key::KeyX, Key::KeyY, Key::KeyZ,
    ];
    c.is_ascii_uppercase()
        .then(|| LETTERS[(c as u8 - b'A') as usize])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_function_and_named_keys() {
        assert_eq!(parse_key("F1"), Some(rdev::Key::F1));
        assert_eq!(parse_key("F12"), Some(rdev::Key::F12));
        assert_eq!(parse_key("Esc"), Some(rdev::Key::Escape));
        assert_eq!(parse_key("Enter"), Some(rdev::Key::Return));
        assert_eq!(parse_key("7"), Some(rdev::Key::Num7));
    }

    #[test]
    fn parse_letter_keys_case_insensitive() {
        assert_eq!(parse_key("A"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("z"), Some(rdev::Key::KeyZ));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("Ctrl+V"), None);
        assert_eq!(parse_key("é"), None);
    }

    #[test]
    fn default_bindings_map_function_keys() {
        let b = HotkeyBindings::from_config(&HotkeyConfig::default()).unwrap();
        assert_eq!(b.command_for(rdev::Key::F9), Some(Command::StartListening));
        assert_eq!(b.command_for(rdev::Key::F1), Some(Command::SelectTask(Task::FindBus)));
        assert_eq!(b.command_for(rdev::Key::F2), Some(Command::SelectTask(Task::CrossRoad)));
        assert_eq!(b.command_for(rdev::Key::F3), Some(Command::SelectTask(Task::Explore)));
        assert_eq!(b.command_for(rdev::Key::F4), Some(Command::SelectTask(Task::FindShop)));
        assert_eq!(b.command_for(rdev::Key::F5), None);
    }

    #[test]
    fn rejects_bad_bindings() {
        let mut cfg = HotkeyConfig::default();
        cfg.task_keys.pop();
        assert!(matches!(
            HotkeyBindings::from_config(&cfg),
            Err(HotkeyError::TaskKeyCount { expected: 4, got: 3 })
        ));

        let mut cfg = HotkeyConfig::default();
        cfg.listen_key = "Hyper".into();
        assert_eq!(
            HotkeyBindings::from_config(&cfg),
            Err(HotkeyError::UnknownKey("Hyper".into()))
        );

        let mut cfg = HotkeyConfig::default();
        cfg.task_keys[2] = "F9".into();
        assert_eq!(
            HotkeyBindings::from_config(&cfg),
            Err(HotkeyError::Duplicate("F9".into()))
        );

        let mut cfg = HotkeyConfig::default();
        cfg.task_keys[3] = "F1".into();
        assert_eq!(
            HotkeyBindings::from_config(&cfg),
            Err(HotkeyError::Duplicate("F1".into()))
        );
    }
}
