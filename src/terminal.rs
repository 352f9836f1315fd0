//! Line-oriented terminal rendering of a conversation
//!
//! The renderer only reads [`ConversationView`]s. It diffs each view against
//! what it has already printed, so coalesced watch notifications are fine.

use crate::store::{ConversationView, MessageId, Role};
use std::io::{self, Write};
use tokio::sync::watch;

const PROMPT: &str = "> ";

fn label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

#[derive(Debug, Default)]
pub struct Renderer {
    /// Id and content of every message printed so far
    shown: Vec<(MessageId, String)>,
    /// The last printed message has no trailing newline yet
    line_open: bool,
    prompt_shown: bool,
    last_error: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print whatever changed since the previous call
    pub fn render(&mut self, view: &ConversationView, out: &mut impl Write) -> io::Result<()> {
        let diverged = self.shown.len() > view.messages.len()
            || self
                .shown
                .iter()
                .zip(&view.messages)
                .any(|((id, _), message)| *id != message.id);
        if diverged {
            self.end_line(out)?;
            writeln!(out, "--- conversation cleared ---")?;
            self.shown.clear();
            self.wrote();
        }

        for (index, message) in view.messages.iter().enumerate() {
            match self.shown.get_mut(index) {
                Some((_, printed)) if *printed == message.content => {}
                Some((_, printed)) => {
                    if let Some(suffix) = message.content.strip_prefix(printed.as_str()) {
                        write!(out, "{suffix}")?;
                    } else {
                        // Replaced body, e.g. a failure notice
                        if self.line_open {
                            writeln!(out)?;
                        }
                        write!(out, "{}: {}", label(message.role), message.content)?;
                    }
                    printed.clone_from(&message.content);
                    self.line_open = true;
                    self.wrote();
                }
                None => {
                    self.end_line(out)?;
                    write!(out, "{}: {}", label(message.role), message.content)?;
                    self.shown.push((message.id, message.content.clone()));
                    self.line_open = true;
                    self.wrote();
                }
            }
        }

        if view.last_error != self.last_error {
            if let Some(error) = &view.last_error {
                self.end_line(out)?;
                writeln!(out, "(error: {error})")?;
                self.wrote();
            }
            self.last_error.clone_from(&view.last_error);
        }

        if view.stream.is_idle() && !self.prompt_shown {
            self.end_line(out)?;
            write!(out, "{PROMPT}")?;
            self.prompt_shown = true;
        }
        Ok(())
    }

    fn end_line(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.line_open {
            writeln!(out)?;
            self.line_open = false;
        }
        Ok(())
    }

    fn wrote(&mut self) {
        self.prompt_shown = false;
    }
}

/// Render every change of `view` to stdout until the session goes away
pub async fn render_to_stdout(mut view: watch::Receiver<ConversationView>) -> io::Result<()> {
    let mut renderer = Renderer::new();
    loop {
        let snapshot = view.borrow_and_update().clone();
        {
            let mut out = io::stdout().lock();
            renderer.render(&snapshot, &mut out)?;
            out.flush()?;
        }
        if view.changed().await.is_err() {
            return Ok(());
        }
    }
}
