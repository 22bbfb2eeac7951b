use parking_lot::Mutex;
use std::io::Write;

/// Output side of the client: chat lines, info lines, and chat the player
/// sends to themselves (which other mods may pick up as commands).
pub trait Display: Send + Sync {
    fn display_message(&self, message: &str);
    fn display_info_message(&self, message: &str);
    fn send_chat_message_to_self(&self, message: &str);
}

/// One line written through a [`Display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Message(String),
    Info(String),
    Chat(String),
}

impl Line {
    pub fn text(&self) -> &str {
        match self {
            Line::Message(s) | Line::Info(s) | Line::Chat(s) => s,
        }
    }
}

/// Writes lines to a terminal with ANSI markers.
pub struct ConsoleDisplay<W> {
    writer: Mutex<W>,
}

impl ConsoleDisplay<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write(&self, marker: &[u8], message: &str) {
        let mut w = self.writer.lock();
        let res = (|| -> std::io::Result<()> {
            for line in message.lines() {
                w.write_all(marker)?;
                w.write_all(line.as_bytes())?;
                w.write_all(b"\x1b[0m\n")?;
            }
            w.flush()
        })();
        if let Err(e) = res {
            tracing::warn!(error = %e, "failed to write to console");
        }
    }
}

impl<W: Write + Send> Display for ConsoleDisplay<W> {
    fn display_message(&self, message: &str) {
        self.write(b"\x1b[93m[collar]\x1b[0m ", message); // yellow marker
    }

    fn display_info_message(&self, message: &str) {
        self.write(b"\x1b[96m[collar]\x1b[0m \x1b[37m", message); // cyan marker, grey text
    }

    fn send_chat_message_to_self(&self, message: &str) {
        self.write(b"\x1b[92m[chat]\x1b[0m ", message);
    }
}

/// Keeps every line in memory. Used by tests and by hosts that render the
/// lines themselves.
#[derive(Debug, Default)]
pub struct BufferDisplay {
    lines: Mutex<Vec<Line>>,
}

impl BufferDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<Line> {
        self.lines.lock().clone()
    }

    /// Text of every line, regardless of kind.
    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(|l| l.text().to_string()).collect()
    }

    pub fn chat(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|l| match l {
                Line::Chat(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn take(&self) -> Vec<Line> {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Display for BufferDisplay {
    fn display_message(&self, message: &str) {
        self.lines.lock().push(Line::Message(message.to_string()));
    }

    fn display_info_message(&self, message: &str) {
        self.lines.lock().push(Line::Info(message.to_string()));
    }

    fn send_chat_message_to_self(&self, message: &str) {
        self.lines.lock().push(Line::Chat(message.to_string()));
    }
}
