/// Crate-wide result type for registration and dispatch.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between receiving a message and running its action.
///
/// The display text of every dispatch-time variant is what the user sees as the
/// final reply, so it is phrased for chat rather than for logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An action definition was rejected at registration.
    #[error("{message}")]
    Validation { message: String },

    /// The message contained no command at all.
    #[error("Please provide a command. Type `help` for more info")]
    Usage,

    /// No action is registered under this name.
    #[error("`{name}` is not a recognized command. Type `help` for more info")]
    UnknownAction { name: String },

    /// Fewer arguments than the action's required parameters.
    #[error("`{name}` requires at least {min} arguments.")]
    Arity { name: String, min: usize },

    /// Help was requested for an action that does not exist.
    #[error("The command `{name}` does not exist.")]
    NotFound { name: String },

    /// The action handler itself failed.
    #[error("{0}")]
    Handler(anyhow::Error),
}

impl Error {
    #[must_use]
    pub fn validation(message: impl std::fmt::Display) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_action(name: impl Into<String>) -> Self {
        Self::UnknownAction { name: name.into() }
    }

    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Short stable label, used for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Usage => "usage",
            Self::UnknownAction { .. } => "unknown_action",
            Self::Arity { .. } => "arity",
            Self::NotFound { .. } => "not_found",
            Self::Handler(_) => "handler",
        }
    }
}
