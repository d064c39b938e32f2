/// Log tags identify which subsystem produced a message
///
/// Each tag maps to a `--debug <key>` command-line value that enables
/// debug-level output for that subsystem only.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Monitor,
    Prober,
    Scheduler,
    Events,
    Store,
}

impl LogTag {
    /// All tags, used to validate `--debug` values
    pub const ALL: [LogTag; 7] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Monitor,
        LogTag::Prober,
        LogTag::Scheduler,
        LogTag::Events,
        LogTag::Store,
    ];

    /// Key used by `--debug <key>`
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Monitor => "monitor",
            LogTag::Prober => "prober",
            LogTag::Scheduler => "scheduler",
            LogTag::Events => "events",
            LogTag::Store => "store",
        }
        .to_string()
    }

    /// Uppercase label written to the log file
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }

    pub fn from_debug_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.iter().copied().find(|tag| tag.to_debug_key() == key)
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
