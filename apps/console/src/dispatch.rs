//! Menu-driven command loop. Reads one line per iteration, resolves it to a
//! registered action, runs the action to completion, and keeps looping until
//! the quit code. A failing action is reported and the loop continues.

use std::io::{self, BufRead, Write};

use futures::future::BoxFuture;
use tracing::debug;

pub type Action = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub struct MenuEntry {
    pub code: &'static str,
    pub label: &'static str,
    pub action: Action,
}

pub const QUIT_CODE: &str = "Q";

pub struct Dispatcher {
    title: String,
    entries: Vec<MenuEntry>,
}

enum Selection<'a> {
    Blank,
    Quit,
    Entry(&'a MenuEntry),
    Invalid,
}

impl Dispatcher {
    pub fn new(title: impl Into<String>, entries: Vec<MenuEntry>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }

    /// Run the loop until the quit code or end of input.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> io::Result<()> {
        loop {
            self.render_menu(out)?;
            write!(out, "Selection: ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // End of input behaves like quit.
                return Ok(());
            }

            match self.resolve(&line) {
                Selection::Blank => continue,
                Selection::Quit => return Ok(()),
                Selection::Invalid => writeln!(out, "Invalid input. Try again.")?,
                Selection::Entry(entry) => {
                    debug!(code = entry.code, "running menu action");
                    if let Err(err) = (entry.action)().await {
                        writeln!(out, "{}", flatten_error(&err))?;
                    }
                }
            }
        }
    }

    fn resolve(&self, line: &str) -> Selection<'_> {
        let code = line.trim();
        if code.is_empty() {
            return Selection::Blank;
        }
        if code.eq_ignore_ascii_case(QUIT_CODE) {
            return Selection::Quit;
        }
        match self
            .entries
            .iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(code))
        {
            Some(entry) => Selection::Entry(entry),
            None => Selection::Invalid,
        }
    }

    fn render_menu(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.title)?;
        for entry in &self.entries {
            writeln!(out, "{:<4}{}", entry.code, entry.label)?;
        }
        writeln!(out, "{:<4}Quit", QUIT_CODE)?;
        Ok(())
    }
}

/// One message per line, walking the whole cause chain.
pub fn flatten_error(err: &anyhow::Error) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
