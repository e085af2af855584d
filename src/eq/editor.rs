use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

use crate::audio::VolumeControl;
use crate::eq::presets::{
    is_builtin, load_user_presets_from, merge_presets, presets_path, same_name,
    save_user_presets_to, EqPreset, NORMAL,
};
use crate::eq::{EQ_FREQUENCIES, GAIN_MAX, GAIN_MIN, NUM_BANDS};

const SMALL_STEP: i32 = 1;
const LARGE_STEP: i32 = 5;
const VOLUME_STEP: f32 = 0.05;
const GRAPH_STEP: i32 = 10;
const MAX_NAME_LEN: usize = 30;

#[derive(Debug, PartialEq)]
enum EditorMode {
    Normal,
    PresetSelect,
    PresetSave,
    PresetDelete,
}

/// Terminal editor for shaping band gains and managing user presets.
pub struct EqEditor {
    bands: [i32; NUM_BANDS],
    cursor: usize,
    modified: bool,
    presets_file: PathBuf,
    presets: Vec<EqPreset>,
    active_preset: Option<String>,
    mode: EditorMode,
    preset_list_state: ListState,
    save_input: String,
    volume: Option<f32>,
}

impl EqEditor {
    pub fn new() -> Self {
        Self::with_presets_file(presets_path())
    }

    pub fn with_presets_file(presets_file: PathBuf) -> Self {
        let presets = merge_presets(load_user_presets_from(&presets_file));
        EqEditor {
            bands: [0; NUM_BANDS],
            cursor: 0,
            modified: false,
            presets_file,
            presets,
            active_preset: Some(NORMAL.to_string()),
            mode: EditorMode::Normal,
            preset_list_state: ListState::default(),
            save_input: String::new(),
            volume: None,
        }
    }

    pub fn run(mut self, mut volume: Option<&mut dyn VolumeControl>) -> io::Result<()> {
        self.volume = volume.as_ref().and_then(|v| v.master_volume().ok());

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // restore the terminal even when a panic unwinds through the loop
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(info);
        }));

        let result = self.event_loop(&mut terminal, &mut volume);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        volume: &mut Option<&mut dyn VolumeControl>,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if self.handle_key(key, volume) {
                    return Ok(());
                }
            }
        }
    }

    /// Returns true when the editor should close.
    fn handle_key(&mut self, key: KeyEvent, volume: &mut Option<&mut dyn VolumeControl>) -> bool {
        match self.mode {
            EditorMode::Normal => return self.handle_normal_key(key, volume),
            EditorMode::PresetSelect => self.handle_preset_select_key(key),
            EditorMode::PresetSave => self.handle_preset_save_key(key),
            EditorMode::PresetDelete => self.handle_preset_delete_key(key),
        }
        false
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let block = Block::default()
            .title(" Equalizer Preset Editor ")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(inner);

        frame.render_widget(self.build_volume_gauge(), chunks[0]);
        frame.render_widget(Paragraph::new(self.build_graph_lines()), chunks[1]);
        frame.render_widget(build_footer(), chunks[2]);

        match self.mode {
            EditorMode::PresetSelect => self.draw_preset_select(frame, area),
            EditorMode::PresetSave => self.draw_preset_save(frame, area),
            EditorMode::PresetDelete => self.draw_preset_delete(frame, area),
            EditorMode::Normal => {}
        }
    }

    fn build_volume_gauge(&self) -> Gauge<'static> {
        let block = Block::default()
            .title(" System volume ")
            .borders(Borders::ALL);
        match self.volume {
            Some(level) => Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(f64::from(level).clamp(0.0, 1.0))
                .label(format!("{}%", (level * 100.0).round() as u8)),
            None => Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(Color::DarkGray))
                .ratio(0.0)
                .label("no audio control"),
        }
    }

    fn build_graph_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let mut label_spans = vec![Span::raw("     ")];
        for (i, freq) in EQ_FREQUENCIES.iter().enumerate() {
            let label = format!("{}Hz", freq);
            let style = if i == self.cursor {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let text = if i == self.cursor {
                format!("[{:^7}]", label)
            } else {
                format!(" {:^7} ", label)
            };
            label_spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(label_spans));
        lines.push(Line::default());

        // +50 down to -50 in steps of 10
        for db in (GAIN_MIN..=GAIN_MAX).rev().step_by(GRAPH_STEP as usize) {
            let mut spans = vec![Span::raw(format!("{:+4} ", db))];

            for (i, &val) in self.bands.iter().enumerate() {
                let is_selected = i == self.cursor;

                let (text, color) = if db == 0 {
                    if is_selected {
                        ("\u{2550}".repeat(9), Color::Yellow)
                    } else {
                        ("\u{2500}".repeat(9), Color::Yellow)
                    }
                } else if db > 0 && val >= db {
                    ("    \u{2588}    ".to_string(), Color::Green)
                } else if db < 0 && val <= db {
                    ("    \u{2588}    ".to_string(), Color::Red)
                } else if db > 0 && db - GRAPH_STEP < val && val < db {
                    ("    \u{2584}    ".to_string(), Color::Green)
                } else if db < 0 && db < val && val < db + GRAPH_STEP {
                    ("    \u{2580}    ".to_string(), Color::Red)
                } else {
                    ("    \u{00b7}    ".to_string(), Color::DarkGray)
                };

                let mut style = Style::default().fg(color);
                if is_selected {
                    style = style.add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(text, style));
            }

            lines.push(Line::from(spans));
        }

        lines.push(Line::default());

        let mut val_spans = vec![Span::raw("     ")];
        for (i, &val) in self.bands.iter().enumerate() {
            let style = if i == self.cursor {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if val > 0 {
                Style::default().fg(Color::Green)
            } else if val < 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            val_spans.push(Span::styled(format!(" {:^7} ", format!("{}dB", val)), style));
        }
        lines.push(Line::from(val_spans));
        lines.push(Line::default());

        let info = format!(
            "  Selected: {}Hz = {}dB",
            EQ_FREQUENCIES[self.cursor], self.bands[self.cursor]
        );
        let preset_info = match &self.active_preset {
            Some(name) => format!("  Preset: {}{}", name, if self.modified { " *" } else { "" }),
            None if self.modified => "  Custom *".to_string(),
            None => String::new(),
        };
        lines.push(Line::from(vec![
            Span::styled(
                info,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(preset_info, Style::default().fg(Color::DarkGray)),
        ]));

        lines
    }

    fn nudge_band(&mut self, delta: i32) {
        let band = &mut self.bands[self.cursor];
        *band = (*band + delta).clamp(GAIN_MIN, GAIN_MAX);
        self.modified = true;
    }

    fn nudge_volume(&mut self, delta: f32, volume: &mut Option<&mut dyn VolumeControl>) {
        let (Some(control), Some(level)) = (volume.as_mut(), self.volume) else {
            return;
        };
        let level = (level + delta).clamp(0.0, 1.0);
        match control.set_master_volume(level) {
            Ok(()) => self.volume = Some(level),
            Err(e) => tracing::error!("Changing the system volume failed: {e}"),
        }
    }

    fn handle_normal_key(
        &mut self,
        key: KeyEvent,
        volume: &mut Option<&mut dyn VolumeControl>,
    ) -> bool {
        match key.code {
            KeyCode::Left => {
                self.cursor = (self.cursor + NUM_BANDS - 1) % NUM_BANDS;
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1) % NUM_BANDS;
            }
            KeyCode::Up => self.nudge_band(SMALL_STEP),
            KeyCode::Down => self.nudge_band(-SMALL_STEP),
            KeyCode::PageUp => self.nudge_band(LARGE_STEP),
            KeyCode::PageDown => self.nudge_band(-LARGE_STEP),
            KeyCode::Char('0') => {
                self.bands[self.cursor] = 0;
                self.modified = true;
            }
            KeyCode::Char('r') => {
                self.bands = [0; NUM_BANDS];
                self.modified = false;
                self.active_preset = Some(NORMAL.to_string());
            }
            KeyCode::Char('+') => self.nudge_volume(VOLUME_STEP, volume),
            KeyCode::Char('-') => self.nudge_volume(-VOLUME_STEP, volume),
            KeyCode::Char('p') => {
                self.mode = EditorMode::PresetSelect;
                self.preset_list_state.select(Some(
                    self.active_preset
                        .as_ref()
                        .and_then(|name| self.presets.iter().position(|p| p.name == *name))
                        .unwrap_or(0),
                ));
            }
            KeyCode::Char('s') => {
                self.mode = EditorMode::PresetSave;
                self.save_input = self
                    .active_preset
                    .as_ref()
                    .filter(|name| !is_builtin(name))
                    .cloned()
                    .unwrap_or_default();
            }
            KeyCode::Char('d') => {
                if !self.user_presets().is_empty() {
                    self.mode = EditorMode::PresetDelete;
                    self.preset_list_state.select(Some(0));
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => return true,
            _ => {}
        }
        false
    }

    fn handle_preset_select_key(&mut self, key: KeyEvent) {
        let len = self.presets.len();
        if len == 0 {
            self.mode = EditorMode::Normal;
            return;
        }

        match key.code {
            KeyCode::Up => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state
                    .select(Some(if i == 0 { len - 1 } else { i - 1 }));
            }
            KeyCode::Down => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state.select(Some((i + 1) % len));
            }
            KeyCode::Enter => {
                if let Some(preset) = self
                    .preset_list_state
                    .selected()
                    .and_then(|i| self.presets.get(i))
                {
                    self.bands = preset.bands;
                    self.active_preset = Some(preset.name.clone());
                    self.modified = false;
                }
                self.mode = EditorMode::Normal;
            }
            KeyCode::Esc => {
                self.mode = EditorMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_preset_save_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                if self.save_input.len() < MAX_NAME_LEN {
                    self.save_input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.save_input.pop();
            }
            KeyCode::Enter => {
                let name = self.save_input.trim().to_string();
                if is_builtin(&name) {
                    tracing::warn!("Built-in preset {name} cannot be overwritten");
                } else if !name.is_empty() {
                    let preset = EqPreset::new(name.clone(), self.bands);
                    let mut user_presets = self.user_presets();
                    if let Some(existing) =
                        user_presets.iter_mut().find(|p| same_name(&p.name, &name))
                    {
                        *existing = preset;
                    } else {
                        user_presets.push(preset);
                    }
                    self.store(&user_presets);
                    self.active_preset = Some(name);
                    self.modified = false;
                }
                self.save_input.clear();
                self.mode = EditorMode::Normal;
            }
            KeyCode::Esc => {
                self.save_input.clear();
                self.mode = EditorMode::Normal;
            }
            _ => {}
        }
    }

    fn handle_preset_delete_key(&mut self, key: KeyEvent) {
        let user_presets = self.user_presets();
        if user_presets.is_empty() {
            self.mode = EditorMode::Normal;
            return;
        }
        let len = user_presets.len();

        match key.code {
            KeyCode::Up => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state
                    .select(Some(if i == 0 { len - 1 } else { i - 1 }));
            }
            KeyCode::Down => {
                let i = self.preset_list_state.selected().unwrap_or(0);
                self.preset_list_state.select(Some((i + 1) % len));
            }
            KeyCode::Enter => {
                if let Some(name) = self
                    .preset_list_state
                    .selected()
                    .and_then(|i| user_presets.get(i))
                    .map(|p| p.name.clone())
                {
                    let remaining: Vec<_> =
                        user_presets.into_iter().filter(|p| p.name != name).collect();
                    self.store(&remaining);
                    if self.active_preset.as_deref() == Some(name.as_str()) {
                        self.active_preset = None;
                    }
                }
                self.preset_list_state.select(Some(0));
                self.mode = EditorMode::Normal;
            }
            KeyCode::Esc => {
                self.mode = EditorMode::Normal;
            }
            _ => {}
        }
    }

    fn user_presets(&self) -> Vec<EqPreset> {
        load_user_presets_from(&self.presets_file)
    }

    fn store(&mut self, user_presets: &[EqPreset]) {
        if let Err(e) = save_user_presets_to(&self.presets_file, user_presets) {
            tracing::error!("Saving presets to {} failed: {e}", self.presets_file.display());
        }
        self.presets = merge_presets(user_presets.to_vec());
    }

    fn draw_preset_select(&mut self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(40, 60, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Select Preset ")
            .borders(Borders::ALL);

        let items: Vec<ListItem> = self
            .presets
            .iter()
            .map(|p| {
                let suffix = if is_builtin(&p.name) { "" } else { " (custom)" };
                let style = if Some(&p.name) == self.active_preset.as_ref() {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{}{}", p.name, suffix)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("\u{25b6} ");

        frame.render_stateful_widget(list, popup, &mut self.preset_list_state);
    }

    fn draw_preset_save(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Save Preset ")
            .borders(Borders::ALL);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let lines = vec![
            Line::default(),
            Line::from(vec![
                Span::raw("  Name: "),
                Span::styled(
                    format!("{}_", self.save_input),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::default(),
            Line::from(Span::styled(
                "  Enter: Save  Esc: Cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_preset_delete(&mut self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(40, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Delete Preset ")
            .borders(Borders::ALL);

        let items: Vec<ListItem> = self
            .user_presets()
            .into_iter()
            .map(|p| ListItem::new(p.name))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Red)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("\u{25b6} ");

        frame.render_stateful_widget(list, popup, &mut self.preset_list_state);
    }
}

impl Default for EqEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn build_footer() -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(vec![
            Span::styled("\u{2190}\u{2192}", bold),
            Span::raw(": Band  "),
            Span::styled("\u{2191}\u{2193}", bold),
            Span::raw(": \u{00b1}1dB  "),
            Span::styled("PgUp/Dn", bold),
            Span::raw(": \u{00b1}5dB  "),
            Span::styled("0", bold),
            Span::raw(": Reset band  "),
            Span::styled("r", bold),
            Span::raw(": Reset all  "),
            Span::styled("+/-", bold),
            Span::raw(": Volume"),
        ]),
        Line::from(vec![
            Span::styled("p", bold),
            Span::raw(": Presets  "),
            Span::styled("s", bold),
            Span::raw(": Save preset  "),
            Span::styled("d", bold),
            Span::raw(": Delete preset  "),
            Span::styled("Esc", bold),
            Span::raw("/"),
            Span::styled("q", bold),
            Span::raw(": Quit"),
        ]),
    ];
    Paragraph::new(lines)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryVolume;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(editor: &mut EqEditor, text: &str, volume: &mut Option<&mut dyn VolumeControl>) {
        for c in text.chars() {
            editor.handle_key(press(KeyCode::Char(c)), volume);
        }
    }

    #[test]
    fn band_steps_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = EqEditor::with_presets_file(dir.path().join("eq_presets.json"));
        let mut none: Option<&mut dyn VolumeControl> = None;

        for _ in 0..20 {
            editor.handle_key(press(KeyCode::PageUp), &mut none);
        }
        assert_eq!(editor.bands[0], GAIN_MAX);
        editor.handle_key(press(KeyCode::Down), &mut none);
        assert_eq!(editor.bands[0], GAIN_MAX - 1);

        editor.handle_key(press(KeyCode::Left), &mut none);
        assert_eq!(editor.cursor, NUM_BANDS - 1);
        editor.handle_key(press(KeyCode::PageDown), &mut none);
        assert_eq!(editor.bands[NUM_BANDS - 1], -5);
        assert!(editor.modified);
    }

    #[test]
    fn loads_a_builtin_preset() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = EqEditor::with_presets_file(dir.path().join("eq_presets.json"));
        let mut none: Option<&mut dyn VolumeControl> = None;

        editor.handle_key(press(KeyCode::Char('p')), &mut none);
        assert_eq!(editor.mode, EditorMode::PresetSelect);
        editor.handle_key(press(KeyCode::Down), &mut none);
        editor.handle_key(press(KeyCode::Enter), &mut none);
        assert_eq!(editor.active_preset.as_deref(), Some("Bass"));
        assert_eq!(editor.bands, [45, 35, 25, 15, 0, -15, -25, -35, -45, -45]);
    }

    #[test]
    fn save_and_delete_user_preset() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("eq_presets.json");
        let mut editor = EqEditor::with_presets_file(file.clone());
        let mut none: Option<&mut dyn VolumeControl> = None;

        editor.handle_key(press(KeyCode::Up), &mut none);
        editor.handle_key(press(KeyCode::Char('s')), &mut none);
        type_text(&mut editor, "Mine", &mut none);
        editor.handle_key(press(KeyCode::Enter), &mut none);

        let stored = load_user_presets_from(&file);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Mine");
        assert_eq!(stored[0].bands[0], 1);
        assert_eq!(editor.presets.last().unwrap().name, "Mine");

        editor.handle_key(press(KeyCode::Char('d')), &mut none);
        assert_eq!(editor.mode, EditorMode::PresetDelete);
        editor.handle_key(press(KeyCode::Enter), &mut none);
        assert!(load_user_presets_from(&file).is_empty());
        assert_eq!(editor.active_preset, None);
    }

    #[test]
    fn builtin_names_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("eq_presets.json");
        let mut editor = EqEditor::with_presets_file(file.clone());
        let mut none: Option<&mut dyn VolumeControl> = None;

        for name in ["Rock", "rock", "JAZZ"] {
            editor.handle_key(press(KeyCode::Char('s')), &mut none);
            type_text(&mut editor, name, &mut none);
            editor.handle_key(press(KeyCode::Enter), &mut none);
            assert!(load_user_presets_from(&file).is_empty(), "{name} saved");
            assert_eq!(editor.mode, EditorMode::Normal);
        }
    }

    #[test]
    fn volume_keys_drive_the_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = EqEditor::with_presets_file(dir.path().join("eq_presets.json"));
        let mut control = MemoryVolume::new(0.5);
        editor.volume = Some(0.5);
        let mut volume: Option<&mut dyn VolumeControl> = Some(&mut control);

        editor.handle_key(press(KeyCode::Char('+')), &mut volume);
        editor.handle_key(press(KeyCode::Char('+')), &mut volume);
        editor.handle_key(press(KeyCode::Char('-')), &mut volume);
        drop(volume);
        assert!((control.master_volume().unwrap() - 0.55).abs() < 1e-4);
    }

    #[test]
    fn quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = EqEditor::with_presets_file(dir.path().join("eq_presets.json"));
        let mut none: Option<&mut dyn VolumeControl> = None;
        assert!(editor.handle_key(press(KeyCode::Char('q')), &mut none));
        assert!(editor.handle_key(press(KeyCode::Esc), &mut none));
    }
}
