//! Console progress indicator shown while waiting on a container.
//!
//! The spinner runs as its own task and is always stopped and joined
//! before the next state (or anything else) is printed.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FRAMES: [&str; 4] = ["-", "\\", "|", "/"];
const TICK: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Animated spinner on a terminal.
    Spinner,
    /// One plain line per state.
    Plain,
    /// Nothing at all.
    Silent,
}

struct Running {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Reports what a long-running step is doing.
pub struct Progress {
    mode: Mode,
    running: Option<Running>,
}

impl Progress {
    /// Spinner on a terminal, plain lines in verbose mode, silent otherwise.
    pub fn new(verbose: bool) -> Self {
        let mode = if verbose {
            Mode::Plain
        } else if std::io::stdout().is_terminal() {
            Mode::Spinner
        } else {
            Mode::Silent
        };
        Self {
            mode,
            running: None,
        }
    }

    pub fn silent() -> Self {
        Self {
            mode: Mode::Silent,
            running: None,
        }
    }

    /// Replace the current state with `message`.
    pub async fn set_state(&mut self, message: &str) {
        self.stop().await;
        match self.mode {
            Mode::Plain => println!("{message}..."),
            Mode::Spinner => {
                let (stop, stopped) = oneshot::channel();
                let handle = tokio::spawn(spin(message.to_string(), stopped));
                self.running = Some(Running { stop, handle });
            }
            Mode::Silent => {}
        }
    }

    /// Stop the indicator and clear its line.
    pub async fn finish(&mut self) {
        self.stop().await;
    }

    async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.stop.send(());
            if let Err(e) = running.handle.await {
                tracing::debug!(error = %e, "Spinner task ended abnormally");
            }
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}

async fn spin(message: String, mut stopped: oneshot::Receiver<()>) {
    let mut stdout = std::io::stdout();
    let mut frames = FRAMES.iter().cycle();
    let mut tick = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = tick.tick() => {
                let frame = frames.next().copied().unwrap_or_default();
                let _ = execute!(
                    stdout,
                    MoveToColumn(0),
                    Clear(ClearType::CurrentLine),
                    Print(format!("{frame} {message}")),
                );
            }
        }
    }

    let _ = execute!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine));
    let _ = stdout.flush();
}
