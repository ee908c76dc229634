//! Input handling with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Terminals rarely report key releases, so a held key is one whose
//! repeat events keep arriving; it counts as released once they stop.

use crate::game::Action;
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};
use tracing::warn;

/// No repeat within this long means the key was let go
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct HeldKey {
    first_press: Instant,
    last_seen: Instant,
    last_repeat: Option<Instant>,
}

impl HeldKey {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            last_repeat: None,
        }
    }

    fn is_stale(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) > KEY_TIMEOUT
    }

    /// True when the key should fire again at `now`
    fn repeat_due(&mut self, now: Instant, das: Duration, arr: Duration) -> bool {
        if now.duration_since(self.first_press) < das {
            return false;
        }
        let due = match self.last_repeat {
            None => true,
            Some(last) => now.duration_since(last) >= arr,
        };
        if due {
            self.last_repeat = Some(now);
        }
        due
    }
}

/// Bound key codes per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate_cw: Vec<KeyCode>,
    pub rotate_ccw: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key name such as "Left", "Space" or "x"
    pub fn parse_key(name: &str) -> Option<KeyCode> {
        let lower = name.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(code)
    }

    fn parse_keys(names: &[String]) -> Vec<KeyCode> {
        names
            .iter()
            .filter_map(|name| {
                let code = Self::parse_key(name);
                if code.is_none() {
                    warn!(key = %name, "ignoring unknown key binding");
                }
                code
            })
            .collect()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            soft_drop: Self::parse_keys(&keys.soft_drop),
            hard_drop: Self::parse_keys(&keys.hard_drop),
            rotate_cw: Self::parse_keys(&keys.rotate_cw),
            rotate_ccw: Self::parse_keys(&keys.rotate_ccw),
            pause: Self::parse_keys(&keys.pause),
            quit: Self::parse_keys(&keys.quit),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Input handler with DAS/ARR support
#[derive(Debug, Clone)]
pub struct InputHandler {
    left: Option<HeldKey>,
    right: Option<HeldKey>,
    down: Option<HeldKey>,
    bindings: KeyBindings,
    das: Duration,
    arr: Duration,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl InputHandler {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left: None,
            right: None,
            down: None,
            bindings: KeyBindings::from_settings(settings),
            das: Duration::from_millis(settings.gameplay.das_ms),
            arr: Duration::from_millis(settings.gameplay.arr_ms),
        }
    }

    pub fn key_down(&mut self, key: KeyEvent) -> Vec<Action> {
        self.key_down_at(key, Instant::now())
    }

    /// Handle a key press or repeat, returning the immediate actions
    pub fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            self.key_up(key);
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Action::Quit];
        }

        let code = normalize_key(key.code);
        let b = &self.bindings;
        let action = if b.move_left.contains(&code) {
            self.right = None;
            press(&mut self.left, now).then_some(Action::MoveLeft)
        } else if b.move_right.contains(&code) {
            self.left = None;
            press(&mut self.right, now).then_some(Action::MoveRight)
        } else if b.soft_drop.contains(&code) {
            press(&mut self.down, now).then_some(Action::SoftDrop)
        } else if b.hard_drop.contains(&code) {
            Some(Action::HardDrop)
        } else if b.rotate_cw.contains(&code) {
            Some(Action::RotateCW)
        } else if b.rotate_ccw.contains(&code) {
            Some(Action::RotateCCW)
        } else if b.pause.contains(&code) {
            Some(Action::Pause)
        } else if b.quit.contains(&code) {
            Some(Action::Quit)
        } else {
            None
        };

        action.into_iter().collect()
    }

    /// Handle a key release (only some terminals send these)
    pub fn key_up(&mut self, key: KeyEvent) {
        let code = normalize_key(key.code);
        if self.bindings.move_left.contains(&code) {
            self.left = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right = None;
        } else if self.bindings.soft_drop.contains(&code) {
            self.down = None;
        }
    }

    pub fn update(&mut self) -> Vec<Action> {
        self.update_at(Instant::now())
    }

    /// Expire released keys and emit auto-repeat moves; call every frame.
    /// Soft drop does not repeat here: while held it speeds up gravity instead.
    pub fn update_at(&mut self, now: Instant) -> Vec<Action> {
        for slot in [&mut self.left, &mut self.right, &mut self.down] {
            if slot.as_ref().is_some_and(|held| held.is_stale(now)) {
                *slot = None;
            }
        }

        let mut actions = Vec::new();
        if let Some(held) = &mut self.left {
            if held.repeat_due(now, self.das, self.arr) {
                actions.push(Action::MoveLeft);
            }
        }
        if let Some(held) = &mut self.right {
            if held.repeat_due(now, self.das, self.arr) {
                actions.push(Action::MoveRight);
            }
        }
        actions
    }

    /// Whether gravity should use the soft-drop interval
    pub fn soft_drop_held(&self) -> bool {
        self.down.is_some()
    }

    /// Forget all held keys, e.g. across pause or a cascade animation
    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
        self.down = None;
    }
}

/// Record a press; true if this is a fresh press rather than a repeat
fn press(slot: &mut Option<HeldKey>, now: Instant) -> bool {
    match slot {
        Some(held) => {
            held.last_seen = now;
            false
        }
        None => {
            *slot = Some(HeldKey::new(now));
            true
        }
    }
}

fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
