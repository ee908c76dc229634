//! Main menu system with settings configuration

use crate::difficulty::Difficulty;
use crate::settings::Settings;

/// Menu screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Main,
    DifficultySelect,
    Settings,
    HighScores(Difficulty),
}

/// Menu state
#[derive(Debug, Clone)]
pub struct Menu {
    pub screen: MenuScreen,
    pub selected: usize,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: String,
    pub item_type: MenuItemType,
}

#[derive(Debug, Clone)]
pub enum MenuItemType {
    Button(MenuAction),
    Toggle { key: SettingKey, value: bool },
    Cycle { key: SettingKey, options: Vec<String>, current: usize },
    Number { key: SettingKey, value: u64, min: u64, max: u64, step: u64 },
    /// Display only, skipped by the cursor
    Label { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartGame(Difficulty),
    GoToScreen(MenuScreen),
    Back,
    Quit,
    SaveSettings,
}

/// Which setting an adjustable item edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ShowGhost,
    ShowChainBanner,
    BlockStyle,
    AnimateCascade,
    WaveDelayMs,
    SettleDelayMs,
    DasMs,
    ArrMs,
    BoardWidth,
    BoardHeight,
    MinGroupSize,
}

const BLOCK_STYLES: [&str; 3] = ["solid", "bracket", "round"];

impl MenuItem {
    fn button(label: &str, action: MenuAction) -> Self {
        Self {
            label: label.to_string(),
            item_type: MenuItemType::Button(action),
        }
    }

    fn toggle(label: &str, key: SettingKey, value: bool) -> Self {
        Self {
            label: label.to_string(),
            item_type: MenuItemType::Toggle { key, value },
        }
    }

    fn number(label: &str, key: SettingKey, value: u64, (min, max, step): (u64, u64, u64)) -> Self {
        Self {
            label: label.to_string(),
            item_type: MenuItemType::Number {
                key,
                value: value.clamp(min, max),
                min,
                max,
                step,
            },
        }
    }

    fn label(label: String, text: String) -> Self {
        Self {
            label,
            item_type: MenuItemType::Label { text },
        }
    }

    fn is_selectable(&self) -> bool {
        !matches!(self.item_type, MenuItemType::Label { .. })
    }
}

impl Menu {
    pub fn new() -> Self {
        Self::main_menu()
    }

    fn with_items(screen: MenuScreen, items: Vec<MenuItem>) -> Self {
        let selected = items.iter().position(MenuItem::is_selectable).unwrap_or(0);
        Self {
            screen,
            selected,
            items,
        }
    }

    pub fn main_menu() -> Self {
        Self::with_items(
            MenuScreen::Main,
            vec![
                MenuItem::button("Play", MenuAction::GoToScreen(MenuScreen::DifficultySelect)),
                MenuItem::button(
                    "High Scores",
                    MenuAction::GoToScreen(MenuScreen::HighScores(Difficulty::default())),
                ),
                MenuItem::button("Settings", MenuAction::GoToScreen(MenuScreen::Settings)),
                MenuItem::button("Quit", MenuAction::Quit),
            ],
        )
    }

    /// One entry per difficulty, with the last one played preselected
    pub fn difficulty_select(settings: &Settings) -> Self {
        let mut items: Vec<MenuItem> = Difficulty::all()
            .iter()
            .map(|&d| {
                let label = format!("{:<10} {}", d.name(), d.description());
                MenuItem::button(&label, MenuAction::StartGame(d))
            })
            .collect();
        items.push(MenuItem::button("Back", MenuAction::Back));

        let mut menu = Self::with_items(MenuScreen::DifficultySelect, items);
        menu.selected = Difficulty::all()
            .iter()
            .position(|&d| d == settings.gameplay.difficulty)
            .unwrap_or(0);
        menu
    }

    pub fn settings_menu(settings: &Settings) -> Self {
        let visual = &settings.visual;
        let gameplay = &settings.gameplay;
        let style = BLOCK_STYLES
            .iter()
            .position(|s| *s == visual.block_style)
            .unwrap_or(0);

        Self::with_items(
            MenuScreen::Settings,
            vec![
                MenuItem::toggle("Ghost Piece", SettingKey::ShowGhost, visual.show_ghost),
                MenuItem::toggle("Chain Banner", SettingKey::ShowChainBanner, visual.show_chain_banner),
                MenuItem {
                    label: "Block Style".to_string(),
                    item_type: MenuItemType::Cycle {
                        key: SettingKey::BlockStyle,
                        options: BLOCK_STYLES.iter().map(|s| s.to_string()).collect(),
                        current: style,
                    },
                },
                MenuItem::toggle("Animate Cascade", SettingKey::AnimateCascade, gameplay.animate_cascade),
                MenuItem::number("Wave Delay (ms)", SettingKey::WaveDelayMs, gameplay.wave_delay_ms, (0, 1000, 50)),
                MenuItem::number("Settle Delay (ms)", SettingKey::SettleDelayMs, gameplay.settle_delay_ms, (0, 200, 5)),
                MenuItem::number("DAS (ms)", SettingKey::DasMs, gameplay.das_ms, (0, 500, 10)),
                MenuItem::number("ARR (ms)", SettingKey::ArrMs, gameplay.arr_ms, (5, 100, 5)),
                MenuItem::number("Board Width", SettingKey::BoardWidth, gameplay.board_width as u64, (6, 20, 1)),
                MenuItem::number("Board Height", SettingKey::BoardHeight, gameplay.board_height as u64, (12, 30, 1)),
                MenuItem::number("Min Group Size", SettingKey::MinGroupSize, gameplay.min_group_size as u64, (2, 8, 1)),
                MenuItem::button("Save", MenuAction::SaveSettings),
                MenuItem::button("Back", MenuAction::Back),
            ],
        )
    }

    pub fn high_scores(settings: &Settings, difficulty: Difficulty) -> Self {
        let table = settings.high_scores.for_difficulty(difficulty);
        let mut items = vec![MenuItem::label(difficulty.name().to_string(), String::new())];
        if table.is_empty() {
            items.push(MenuItem::label("No scores yet".to_string(), String::new()));
        }
        for (rank, entry) in table.iter().enumerate() {
            items.push(MenuItem::label(
                format!("{:>2}. {:>8}", rank + 1, entry.score),
                format!("Lv {:<3} {:>4} clears  {}", entry.level, entry.clears, entry.date),
            ));
        }

        let all = Difficulty::all();
        let index = all.iter().position(|&d| d == difficulty).unwrap_or(0);
        let next = all[(index + 1) % all.len()];
        items.push(MenuItem::button(
            &format!("Show {}", next.name()),
            MenuAction::GoToScreen(MenuScreen::HighScores(next)),
        ));
        items.push(MenuItem::button("Back", MenuAction::Back));
        Self::with_items(MenuScreen::HighScores(difficulty), items)
    }

    /// Move the cursor to the previous selectable item, wrapping around
    pub fn move_up(&mut self) {
        self.step_cursor(self.items.len().saturating_sub(1));
    }

    /// Move the cursor to the next selectable item, wrapping around
    pub fn move_down(&mut self) {
        self.step_cursor(1);
    }

    fn step_cursor(&mut self, offset: usize) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let mut index = self.selected;
        for _ in 0..len {
            index = (index + offset) % len;
            if self.items[index].is_selectable() {
                self.selected = index;
                return;
            }
        }
    }

    pub fn adjust_left(&mut self, settings: &mut Settings) {
        self.adjust(settings, false);
    }

    pub fn adjust_right(&mut self, settings: &mut Settings) {
        self.adjust(settings, true);
    }

    fn adjust(&mut self, settings: &mut Settings, forward: bool) {
        let Some(item) = self.items.get_mut(self.selected) else {
            return;
        };
        match &mut item.item_type {
            MenuItemType::Toggle { key, value } => {
                *value = !*value;
                apply_setting(settings, *key, SettingValue::Bool(*value));
            }
            MenuItemType::Cycle { key, options, current } => {
                let len = options.len();
                if len == 0 {
                    return;
                }
                *current = if forward { (*current + 1) % len } else { (*current + len - 1) % len };
                apply_setting(settings, *key, SettingValue::Text(&options[*current]));
            }
            MenuItemType::Number { key, value, min, max, step } => {
                *value = if forward {
                    (*value + *step).min(*max)
                } else {
                    value.saturating_sub(*step).max(*min)
                };
                apply_setting(settings, *key, SettingValue::Number(*value));
            }
            MenuItemType::Button(_) | MenuItemType::Label { .. } => {}
        }
    }

    /// The action for the current selection, if it is a button
    pub fn select(&self) -> Option<MenuAction> {
        match self.items.get(self.selected)?.item_type {
            MenuItemType::Button(action) => Some(action),
            _ => None,
        }
    }

    pub fn go_to(&mut self, screen: MenuScreen, settings: &Settings) {
        *self = match screen {
            MenuScreen::Main => Self::main_menu(),
            MenuScreen::DifficultySelect => Self::difficulty_select(settings),
            MenuScreen::Settings => Self::settings_menu(settings),
            MenuScreen::HighScores(difficulty) => Self::high_scores(settings, difficulty),
        };
    }

    /// Every screen but the main one backs out to the main menu
    pub fn go_back(&mut self, settings: &Settings) {
        self.go_to(MenuScreen::Main, settings);
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

enum SettingValue<'a> {
    Bool(bool),
    Text(&'a str),
    Number(u64),
}

fn apply_setting(settings: &mut Settings, key: SettingKey, value: SettingValue) {
    let visual = &mut settings.visual;
    let gameplay = &mut settings.gameplay;
    match (key, value) {
        (SettingKey::ShowGhost, SettingValue::Bool(v)) => visual.show_ghost = v,
        (SettingKey::ShowChainBanner, SettingValue::Bool(v)) => visual.show_chain_banner = v,
        (SettingKey::BlockStyle, SettingValue::Text(v)) => visual.block_style = v.to_string(),
        (SettingKey::AnimateCascade, SettingValue::Bool(v)) => gameplay.animate_cascade = v,
        (SettingKey::WaveDelayMs, SettingValue::Number(v)) => gameplay.wave_delay_ms = v,
        (SettingKey::SettleDelayMs, SettingValue::Number(v)) => gameplay.settle_delay_ms = v,
        (SettingKey::DasMs, SettingValue::Number(v)) => gameplay.das_ms = v,
        (SettingKey::ArrMs, SettingValue::Number(v)) => gameplay.arr_ms = v,
        (SettingKey::BoardWidth, SettingValue::Number(v)) => gameplay.board_width = v as usize,
        (SettingKey::BoardHeight, SettingValue::Number(v)) => gameplay.board_height = v as usize,
        (SettingKey::MinGroupSize, SettingValue::Number(v)) => gameplay.min_group_size = v as usize,
        _ => {}
    }
}
