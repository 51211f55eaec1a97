use crate::ui::conversation::ChatBot;
use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    event::{
        DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io::{self, Stdout};
use std::time::Duration;

/// Redraw cadence; keeps the typing animation moving between input events
const TICK: Duration = Duration::from_millis(100);

const SCROLL_STEP: usize = 5;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// What the loop should do after an input event
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the chat surface until the user quits, restoring the terminal after
pub async fn run(bot: ChatBot) -> Result<()> {
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    let _guard = TerminalGuard::enter(enhanced)?;
    install_panic_hook(enhanced);

    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("Failed to create terminal")?;
    event_loop(&mut terminal, bot).await
}

/// Puts the terminal back to normal when dropped, on error paths and
/// while unwinding from a panic
struct TerminalGuard {
    enhanced: bool,
    restore: fn(bool),
}

impl TerminalGuard {
    fn enter(enhanced: bool) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = Self { enhanced, restore: restore_terminal };

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        // Lets terminals that support it report Shift+Enter distinctly
        if enhanced {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
        }
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)(self.enhanced);
    }
}

/// Restore before the panic message prints, so it lands on the normal screen
fn install_panic_hook(enhanced: bool) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal(enhanced);
        previous(info);
    }));
}

fn restore_terminal(enhanced: bool) {
    let mut stdout = io::stdout();
    if enhanced {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    if let Err(e) = disable_raw_mode() {
        log::warn!("Failed to disable raw mode: {}", e);
    }
    let _ = execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen, Show);
}

async fn event_loop(terminal: &mut Tui, mut bot: ChatBot) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        bot.process_events();
        terminal.draw(|f| f.render_widget(&bot, f.size()))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if handle_event(&mut bot, event) == Flow::Quit {
                            log::info!("Exiting on user request");
                            break;
                        }
                    }
                    Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                    None => break,
                }
            }
            _ = tick.tick() => {}
        }
    }

    Ok(())
}

fn handle_event(bot: &mut ChatBot, event: Event) -> Flow {
    match event {
        Event::Key(key) => handle_key(bot, key),
        Event::Paste(text) => {
            bot.handle_paste(&text);
            Flow::Continue
        }
        Event::FocusGained => {
            bot.set_focus(true);
            Flow::Continue
        }
        Event::FocusLost => {
            bot.set_focus(false);
            Flow::Continue
        }
        Event::Mouse(_) | Event::Resize(_, _) => Flow::Continue,
    }
}

fn handle_key(bot: &mut ChatBot, key: KeyEvent) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Esc => Flow::Quit,
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Flow::Quit
        }
        KeyCode::PageUp => {
            bot.scroll_up(SCROLL_STEP);
            Flow::Continue
        }
        KeyCode::PageDown => {
            bot.scroll_down(SCROLL_STEP);
            Flow::Continue
        }
        _ => {
            bot.handle_key(key);
            Flow::Continue
        }
    }
}
