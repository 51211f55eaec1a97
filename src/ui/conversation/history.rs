//! Conversation history display component

use crate::events::Role;
use crate::ui::markdown::{render_markdown, render_plain};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::cell::Cell;

/// A single message in the conversation; immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    content: String,
    role: Role,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { content: content.into(), role: Role::User }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self { content: content.into(), role: Role::Bot }
    }

    #[allow(dead_code)]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Conversation history display component
pub struct ConversationHistory {
    messages: Vec<Message>,
    render_markdown: bool,
    /// Lines scrolled up from the newest message
    scroll_offset: usize,
    /// Largest useful offset as of the last render
    max_scroll: Cell<usize>,
}

impl ConversationHistory {
    pub fn new(render_markdown: bool) -> Self {
        Self {
            messages: Vec::new(),
            render_markdown,
            scroll_offset: 0,
            max_scroll: Cell::new(0),
        }
    }

    /// Append a message and jump to the bottom so it is visible
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.scroll_to_bottom();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_scroll.get());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    #[allow(dead_code)]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Lay out every message for a pane `width` columns wide
    fn layout(&self, width: u16) -> Vec<Line<'static>> {
        let width = width as usize;
        let mut lines = Vec::new();

        for message in &self.messages {
            match message.role {
                Role::User => {
                    // Bubbles take at most three quarters of the pane, right side
                    let bubble = (width * 3 / 4).max(1);
                    let style = Style::default().fg(Color::White).bg(Color::Blue);
                    lines.push(header(Role::User).alignment(Alignment::Right));
                    for line in render_plain(&message.content, bubble.saturating_sub(2), style) {
                        let mut spans = vec![Span::styled(" ", style)];
                        spans.extend(line.spans);
                        spans.push(Span::styled(" ", style));
                        lines.push(Line::from(spans).alignment(Alignment::Right));
                    }
                }
                Role::Bot => {
                    let style = Style::default().fg(Color::Gray);
                    let room = width.saturating_sub(2);
                    lines.push(header(Role::Bot));
                    let body = if self.render_markdown {
                        render_markdown(&message.content, room, style)
                    } else {
                        render_plain(&message.content, room, style)
                    };
                    for line in body {
                        let mut spans = vec![Span::raw("  ")];
                        spans.extend(line.spans);
                        lines.push(Line::from(spans));
                    }
                }
            }
            lines.push(Line::default());
        }

        lines
    }
}

fn header(role: Role) -> Line<'static> {
    let style = match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Bot => Style::default().fg(Color::Green),
    };
    Line::from(Span::styled(role.to_string(), style.add_modifier(Modifier::BOLD)))
}

impl Widget for &ConversationHistory {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("💬 Chat");
        let inner = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome = vec![
                Line::from(Span::styled("Start by asking anything below.", Style::default().fg(Color::Gray))),
                Line::default(),
                Line::from(Span::styled(
                    "Press Enter to send, Shift+Enter for a new line, Esc to quit.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            Paragraph::new(welcome).render(inner, buf);
            return;
        }

        let lines = self.layout(inner.width);
        let height = inner.height as usize;
        let max_scroll = lines.len().saturating_sub(height);
        self.max_scroll.set(max_scroll);

        let offset = self.scroll_offset.min(max_scroll);
        let end = lines.len() - offset;
        let start = end.saturating_sub(height);
        let visible: Vec<Line<'static>> = lines[start..end].to_vec();

        Paragraph::new(visible).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(buf: &Buffer) -> Vec<String> {
        let width = buf.area.width as usize;
        buf.content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn keeps_chronological_order() {
        let mut history = ConversationHistory::new(true);
        history.push(Message::user("Hello"));
        history.push(Message::bot("Hi there"));
        history.push(Message::user("Hello"));

        let roles: Vec<Role> = history.messages().iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::User, Role::Bot, Role::User]);
        assert_eq!(history.messages()[1].content(), "Hi there");
    }

    #[test]
    fn user_messages_are_right_aligned() {
        let mut history = ConversationHistory::new(true);
        history.push(Message::user("Hello"));

        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        let row = rows(&buf).into_iter().find(|row| row.contains("Hello")).unwrap();
        assert!(row.trim_end_matches('│').ends_with("Hello "));
    }

    #[test]
    fn newest_message_stays_visible() {
        let mut history = ConversationHistory::new(false);
        for i in 0..10 {
            history.push(Message::bot(format!("reply {i}")));
        }

        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        let text = rows(&buf).join("\n");
        assert!(text.contains("reply 9"));
        assert!(!text.contains("reply 0"));
    }

    #[test]
    fn scrolling_is_clamped_and_reset_on_push() {
        let mut history = ConversationHistory::new(false);
        for i in 0..10 {
            history.push(Message::bot(format!("reply {i}")));
        }
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        history.scroll_up(1_000);
        let max = history.scroll_offset();
        assert!(max > 0);

        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);
        assert!(rows(&buf).join("\n").contains("reply 0"));

        history.push(Message::user("more"));
        assert_eq!(history.scroll_offset(), 0);
    }
}
