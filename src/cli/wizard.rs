//! Interactive prompts for values not given on the command line.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::provision::{EngineKind, Prompter, ProvisionError, Validator};

type Result<T> = std::result::Result<T, ProvisionError>;

/// Terminal implementation of [`Prompter`].
pub struct Wizard {
    editor: DefaultEditor,
}

impl Wizard {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.editor.readline(prompt).map_err(readline_error)
    }
}

impl Prompter for Wizard {
    fn select_engine(&mut self, choices: &[EngineKind]) -> Result<EngineKind> {
        println!("Database type?");
        for (i, kind) in choices.iter().enumerate() {
            println!("  {}) {kind}", i + 1);
        }
        loop {
            let line = self.read_line(&format!("Choose [1-{}]: ", choices.len()))?;
            match parse_choice(&line, choices) {
                Some(kind) => return Ok(kind),
                None => eprintln!("  Enter a number or one of the names above"),
            }
        }
    }

    fn ask(&mut self, question: &str, placeholder: &str, validate: Validator<'_>) -> Result<String> {
        loop {
            let line = self.read_line(&prompt_text(question, placeholder))?;
            let value = line.trim();
            if value.is_empty() {
                return Ok(String::new());
            }
            match validate(value) {
                Ok(()) => return Ok(value.to_string()),
                Err(e) => eprintln!("  {e}"),
            }
        }
    }

    fn ask_password(
        &mut self,
        question: &str,
        placeholder: &str,
        validate: Validator<'_>,
    ) -> Result<String> {
        loop {
            let value = read_hidden(&prompt_text(question, placeholder))?;
            if value.is_empty() {
                return Ok(value);
            }
            match validate(&value) {
                Ok(()) => return Ok(value),
                Err(e) => eprintln!("  {e}"),
            }
        }
    }
}

fn prompt_text(question: &str, placeholder: &str) -> String {
    if placeholder.is_empty() {
        format!("{question} ")
    } else {
        format!("{question} ({placeholder}) ")
    }
}

/// A 1-based index into `choices`, or an engine name.
fn parse_choice(input: &str, choices: &[EngineKind]) -> Option<EngineKind> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| choices.get(i)).copied();
    }
    input
        .parse::<EngineKind>()
        .ok()
        .filter(|kind| choices.contains(kind))
}

/// Leaves raw mode when dropped, including on early return.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read a line without echoing it.
fn read_hidden(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().map_err(io_error)?;

    let result = read_hidden_keys();
    println!();
    result
}

fn read_hidden_keys() -> Result<String> {
    let _raw = RawMode::enable().map_err(io_error)?;
    let mut value = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read().map_err(io_error)?
        else {
            continue;
        };
        match code {
            KeyCode::Enter => return Ok(value),
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(cancelled());
            }
            KeyCode::Esc => return Err(cancelled()),
            KeyCode::Char(c) => value.push(c),
            _ => {}
        }
    }
}

fn cancelled() -> ProvisionError {
    ProvisionError::Prompt {
        reason: "cancelled".to_string(),
    }
}

fn readline_error(e: ReadlineError) -> ProvisionError {
    match e {
        ReadlineError::Interrupted | ReadlineError::Eof => cancelled(),
        other => ProvisionError::Prompt {
            reason: other.to_string(),
        },
    }
}

fn io_error(e: io::Error) -> ProvisionError {
    ProvisionError::Prompt {
        reason: e.to_string(),
    }
}
