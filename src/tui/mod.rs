//! Interactive terminal front end.

mod app;
mod draw;
mod input;

use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::store::FileStore;
use crate::{AppConfig, Result};

use self::app::App;
use self::draw::draw;
use self::input::{handle_input, handle_paste};

/// Holds the terminal in raw mode on the alternate screen with bracketed
/// paste. Dropping it, including while unwinding, puts the terminal back.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            crossterm::event::EnableBracketedPaste
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(
            io::stdout(),
            crossterm::event::DisableBracketedPaste,
            LeaveAlternateScreen
        );
    }
}

/// Runs the interactive calculator against the configured settings file.
///
/// # Errors
///
/// Returns an error if the settings cannot be read or terminal I/O fails.
pub fn run(config: &AppConfig) -> Result<()> {
    let store = FileStore::open(&config.settings.path)?;
    let mut app = App::new(store);

    let _terminal_guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout
        if crossterm::event::poll(Duration::from_millis(100))? {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_input(&mut app, key),
                Event::Paste(text) => handle_paste(&mut app, &text),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Show cursor before exit (the guard restores the rest)
    terminal.show_cursor()?;
    Ok(())
}
