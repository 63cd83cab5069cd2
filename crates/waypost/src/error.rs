//! Error types for registration and dispatch.

use thiserror::Error;

use crate::hooks::HookPhase;

/// Errors produced by command registration and dispatch.
///
/// Registration failures (`InvalidCommand`, `CommandNotFound`,
/// `NameCollision`) are reported before the tree is mutated. Dispatch
/// failures identify the stage they occurred in; hook and handler errors
/// carry the user error verbatim as their source.
#[derive(Debug, Error)]
pub enum Error {
    /// A command was registered with an empty or whitespace-only name.
    #[error("command name cannot be empty")]
    InvalidCommand,

    /// A command path did not resolve.
    #[error("command not found: {path}")]
    CommandNotFound {
        /// The space-joined path that failed to resolve.
        path: String,
    },

    /// A sibling already uses this name or alias (case-sensitive).
    #[error("command name collision: {name}")]
    NameCollision {
        /// The colliding name or alias.
        name: String,
    },

    /// The flag parser rejected the token sequence.
    #[error("flag parse error: {0}")]
    FlagParse(#[from] clap::Error),

    /// Fewer positional values than the command's required argument count.
    #[error("missing required arguments (need {required}, got {given})")]
    MissingArguments {
        /// Number of required arguments declared by the command.
        required: usize,
        /// Number of positional values actually supplied.
        given: usize,
    },

    /// More positional values than declared arguments, with no variadic
    /// argument to absorb the excess.
    #[error("too many arguments (got {given}, max {max})")]
    TooManyArguments {
        /// Number of positional values actually supplied.
        given: usize,
        /// Number of arguments the command declares.
        max: usize,
    },

    /// A lifecycle hook failed; the user error is preserved unwrapped.
    #[error("{phase} hook failed: {source}")]
    Hook {
        /// The phase the failing hook was attached to.
        phase: HookPhase,
        /// The error returned by the hook.
        source: anyhow::Error,
    },

    /// The command handler failed; the user error is preserved unwrapped.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// Writing rendered help to the output sink failed.
    #[error("failed to write help output: {0}")]
    Io(#[from] std::io::Error),
}
