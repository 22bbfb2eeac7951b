/// Who typed a command line. Passed through dispatch untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The in-game chat box.
    Client,
    /// The standalone console.
    Console,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Client => "client",
            Source::Console => "console",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
