//! Distribution commands.

use std::fmt;

/// What a job does to a message on its target instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Publish the message.
    Create,
    /// Replace the content of a published message.
    Update,
    /// Recall the message.
    Delete,
}

impl Command {
    /// Uppercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
