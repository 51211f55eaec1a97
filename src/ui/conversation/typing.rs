use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::Instant;

/// "Bot is typing" indicator with animated dots
#[derive(Debug, Clone, Copy)]
pub struct TypingIndicator {
    started: Instant,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }

    /// Dots for a point `elapsed_ms` into the animation
    pub fn dots(elapsed_ms: u128) -> &'static str {
        match (elapsed_ms / 300) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TypingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dots = Self::dots(self.started.elapsed().as_millis());
        let line = Line::from(vec![
            Span::styled("🤖 ", Style::default().fg(Color::Green)),
            Span::styled("Bot is typing", Style::default().fg(Color::Green)),
            Span::styled(dots, Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_cycle() {
        assert_eq!(TypingIndicator::dots(0), ".");
        assert_eq!(TypingIndicator::dots(350), "..");
        assert_eq!(TypingIndicator::dots(650), "...");
        assert_eq!(TypingIndicator::dots(950), "   ");
        assert_eq!(TypingIndicator::dots(1200), ".");
    }
}
