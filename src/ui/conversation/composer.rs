use crate::config::UiConfig;
use crate::ui::markdown::chunk_by_width;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Widget,
    },
};

/// Tallest the composer grows before it stops adding rows
const MAX_VISIBLE_LINES: u16 = 6;

const CURSOR: char = '▌';

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position counted in chars, not bytes
    pub cursor_position: usize,
}

impl TextAreaState {
    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(index, _)| index)
            .unwrap_or(self.content.len())
    }
}

/// Prompt composer: multi-line input capped at a fixed number of chars
#[derive(Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    max_chars: usize,
    has_focus: bool,
}

impl ConversationComposer {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: ui.placeholder.clone(),
            max_chars: ui.max_input_chars,
            has_focus: true,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.insert_char('\n');
                } else if self.can_submit() {
                    let content = std::mem::take(&mut self.state.content);
                    self.state.cursor_position = 0;
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Char(c) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.insert_char(c);
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.state.cursor_position = self.state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor_position < self.state.char_len() {
                    self.state.cursor_position += 1;
                }
            }
            KeyCode::Home => self.state.cursor_position = 0,
            KeyCode::End => self.state.cursor_position = self.state.char_len(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text, truncated to whatever room is left
    pub fn paste(&mut self, text: &str) {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        for c in normalized.chars() {
            if !self.insert_char(c) {
                break;
            }
        }
    }

    /// Insert a character at the cursor position; false once the cap is hit
    fn insert_char(&mut self, c: char) -> bool {
        if self.state.char_len() >= self.max_chars {
            return false;
        }
        let at = self.state.byte_index(self.state.cursor_position);
        self.state.content.insert(at, c);
        self.state.cursor_position += 1;
        true
    }

    /// Delete character before cursor
    fn backspace(&mut self) {
        if self.state.cursor_position > 0 {
            self.state.cursor_position -= 1;
            let at = self.state.byte_index(self.state.cursor_position);
            self.state.content.remove(at);
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) {
        if self.state.cursor_position < self.state.char_len() {
            let at = self.state.byte_index(self.state.cursor_position);
            self.state.content.remove(at);
        }
    }

    /// Submission is allowed only with some non-whitespace text
    pub fn can_submit(&self) -> bool {
        !self.state.content.trim().is_empty()
    }

    #[allow(dead_code)]
    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    pub fn clear(&mut self) {
        self.state = TextAreaState::default();
    }

    /// Rows needed to show the current text in a box `width` columns wide,
    /// borders included
    pub fn height(&self, width: u16) -> u16 {
        let (rows, _) = self.visual_rows(width.saturating_sub(2) as usize);
        (rows.len() as u16).clamp(1, MAX_VISIBLE_LINES) + 2
    }

    /// Text wrapped to `width` columns, plus the row holding the cursor
    fn visual_rows(&self, width: usize) -> (Vec<String>, usize) {
        let mut content = self.state.content.clone();
        if self.has_focus {
            content.insert(self.state.byte_index(self.state.cursor_position), CURSOR);
        }

        let mut rows = Vec::new();
        let mut cursor_row = 0;
        for line in content.split('\n') {
            for row in chunk_by_width(line, width) {
                if row.contains(CURSOR) {
                    cursor_row = rows.len();
                }
                rows.push(row);
            }
        }

        (rows, cursor_row)
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = &self.state;

        let hint_style = if self.can_submit() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let counter = format!(" {}/{} ", state.char_len(), self.max_chars);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Prompt ")
            .title(
                Title::from(Line::from(vec![
                    Span::styled(counter, Style::default().fg(Color::DarkGray)),
                    Span::styled(" ↑ send ", hint_style),
                ]))
                .position(Position::Bottom)
                .alignment(Alignment::Right),
            )
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder = Line::from(Span::styled(&self.placeholder, Style::default().fg(Color::DarkGray)));
            buf.set_line(inner_area.x, inner_area.y, &placeholder, inner_area.width);
            return;
        }

        // Keep the cursor row in view once the text outgrows the box
        let (rows, cursor_row) = self.visual_rows(inner_area.width as usize);
        let height = inner_area.height as usize;
        let first = (cursor_row + 1).saturating_sub(height);

        for (i, row) in rows.into_iter().skip(first).take(height).enumerate() {
            let line = Line::from(Span::styled(row, Style::default().fg(Color::White)));
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> ConversationComposer {
        ConversationComposer::new(&UiConfig::default())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut ConversationComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    fn render(composer: &ConversationComposer, width: u16) -> Buffer {
        let area = Rect::new(0, 0, width, composer.height(width));
        let mut buf = Buffer::empty(area);
        composer.render(area, &mut buf);
        buf
    }

    fn rows(buf: &Buffer) -> Vec<String> {
        let width = buf.area.width as usize;
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    fn hint_color(buf: &Buffer) -> Color {
        let bottom = buf.area.height - 1;
        (0..buf.area.width)
            .map(|x| buf.get(x, bottom))
            .find(|cell| cell.symbol() == "↑")
            .map(|cell| cell.fg)
            .unwrap()
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut composer = composer();
        type_text(&mut composer, "Hello");

        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Submitted("Hello".to_string())
        );
        assert_eq!(composer.content(), "");
        assert!(!composer.can_submit());
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let mut composer = composer();
        type_text(&mut composer, "a");
        let result = composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut composer, "b");

        assert_eq!(result, ComposerResult::None);
        assert_eq!(composer.content(), "a\nb");
        assert_eq!(composer.height(40), 4);
    }

    #[test]
    fn whitespace_only_cannot_submit() {
        let mut composer = composer();
        type_text(&mut composer, "   ");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));

        assert!(!composer.can_submit());
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
        assert_eq!(composer.content(), "   \n");
    }

    #[test]
    fn input_is_capped() {
        let mut composer = composer();
        composer.paste(&"x".repeat(990));
        type_text(&mut composer, &"y".repeat(20));

        assert_eq!(composer.content().chars().count(), 1000);
        assert!(composer.content().ends_with(&"y".repeat(10)));

        composer.clear();
        composer.paste(&"é".repeat(1500));
        assert_eq!(composer.content().chars().count(), 1000);
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut composer = composer();
        type_text(&mut composer, "héllo");
        composer.handle_key(press(KeyCode::Home));
        composer.handle_key(press(KeyCode::Right));
        composer.handle_key(press(KeyCode::Delete));
        composer.handle_key(press(KeyCode::End));
        composer.handle_key(press(KeyCode::Backspace));

        assert_eq!(composer.content(), "hll");
    }

    #[test]
    fn control_chords_do_not_type() {
        let mut composer = composer();
        composer.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn long_prompt_wraps_and_grows_the_box() {
        let mut composer = composer();
        let letters: String = ('a'..='z').cycle().take(100).collect();
        type_text(&mut composer, &letters);
        type_text(&mut composer, "Z");

        // 38 inner columns: 101 chars plus the cursor need three rows
        assert_eq!(composer.height(40), 5);

        let text = rows(&render(&composer, 40)).join("\n");
        assert!(text.contains("Z▌"));
        assert!(text.contains(&letters[..38]));
    }

    #[test]
    fn cursor_row_stays_visible_past_max_height() {
        let mut composer = composer();
        composer.paste(&"x".repeat(400));
        type_text(&mut composer, "Z");
        assert_eq!(composer.height(40), MAX_VISIBLE_LINES + 2);

        let text = rows(&render(&composer, 40)).join("\n");
        assert!(text.contains("Z▌"));

        composer.handle_key(press(KeyCode::Home));
        let text = rows(&render(&composer, 40)).join("\n");
        assert!(text.contains("▌x"));
        assert!(!text.contains('Z'));
    }

    #[test]
    fn send_hint_reflects_whether_submit_is_allowed() {
        let mut composer = composer();
        composer.set_focus(false);
        assert_eq!(hint_color(&render(&composer, 40)), Color::DarkGray);

        composer.paste("   ");
        assert_eq!(hint_color(&render(&composer, 40)), Color::DarkGray);

        composer.paste("hi");
        assert_eq!(hint_color(&render(&composer, 40)), Color::Green);
    }

    #[test]
    fn paste_normalizes_line_endings() {
        let mut composer = composer();
        composer.paste("one\r\ntwo");
        assert_eq!(composer.content(), "one\ntwo");
    }
}
