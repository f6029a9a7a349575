//! # Keys
//!
//! A terminal-agnostic key press plus the configurable bindings that give
//! some of them navigational meaning. The TUI adapter translates crossterm
//! events into [`Key`]; everything in `core` only ever sees this type.
//!
//! Bindings are written the way they are displayed: `"ctrl+c"`, `"esc"`,
//! `"enter"`, `"home"`, `"/"`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "space"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Ctrl(c) => write!(f, "ctrl+{c}"),
            Key::Enter => write!(f, "enter"),
            Key::Esc => write!(f, "esc"),
            Key::Backspace => write!(f, "backspace"),
            Key::Tab => write!(f, "tab"),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::PageUp => write!(f, "pgup"),
            Key::PageDown => write!(f, "pgdown"),
            Key::Home => write!(f, "home"),
            Key::End => write!(f, "end"),
        }
    }
}

/// Navigational meaning of a key press, resolved against [`KeyBindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Back,
    Select,
    ScrollTop,
    ScrollBottom,
    Filter,
    ToggleWrap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub quit: String,
    pub back: String,
    pub select: String,
    pub scroll_top: String,
    pub scroll_bottom: String,
    pub filter: String,
    pub toggle_wrap: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: "ctrl+c".to_string(),
            back: "esc".to_string(),
            select: "enter".to_string(),
            scroll_top: "home".to_string(),
            scroll_bottom: "end".to_string(),
            filter: "/".to_string(),
            toggle_wrap: "w".to_string(),
        }
    }
}

impl KeyBindings {
    /// The command bound to `key`, if any. Earlier entries win on conflicts.
    pub fn command(&self, key: &Key) -> Option<Command> {
        let name = key.to_string();
        [
            (&self.quit, Command::Quit),
            (&self.back, Command::Back),
            (&self.select, Command::Select),
            (&self.scroll_top, Command::ScrollTop),
            (&self.scroll_bottom, Command::ScrollBottom),
            (&self.filter, Command::Filter),
            (&self.toggle_wrap, Command::ToggleWrap),
        ]
        .into_iter()
        .find(|(binding, _)| binding.eq_ignore_ascii_case(&name))
        .map(|(_, command)| command)
    }

    pub fn is(&self, key: &Key, command: Command) -> bool {
        self.command(key) == Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(Key::Ctrl('c').to_string(), "ctrl+c");
        assert_eq!(Key::Char('/').to_string(), "/");
        assert_eq!(Key::Char(' ').to_string(), "space");
        assert_eq!(Key::PageDown.to_string(), "pgdown");
    }

    #[test]
    fn test_default_bindings() {
        let keys = KeyBindings::default();
        assert_eq!(keys.command(&Key::Ctrl('c')), Some(Command::Quit));
        assert_eq!(keys.command(&Key::Esc), Some(Command::Back));
        assert_eq!(keys.command(&Key::Enter), Some(Command::Select));
        assert_eq!(keys.command(&Key::Char('/')), Some(Command::Filter));
        assert_eq!(keys.command(&Key::Char('x')), None);
    }

    #[test]
    fn test_custom_binding_from_toml() {
        let keys: KeyBindings = toml::from_str(r#"quit = "Q""#).unwrap();
        assert!(keys.is(&Key::Char('q'), Command::Quit));
        assert!(!keys.is(&Key::Ctrl('c'), Command::Quit));
        // Unspecified bindings keep their defaults.
        assert!(keys.is(&Key::Esc, Command::Back));
    }
}
