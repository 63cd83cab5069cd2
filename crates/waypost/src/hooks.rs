//! Lifecycle hooks.
//!
//! A hook is a side-effecting callback bound to one of four CLI-level
//! phases, or to a command's own before/after lists. Before-phase chains
//! are fail-fast: the first error stops the chain and the command.
//! After-phase chains are best-effort: every hook runs, and a hook error
//! only becomes the dispatch result if nothing failed earlier.

use std::fmt;
use std::rc::Rc;

use crate::context::Context;

/// A lifecycle callback. Hooks observe the invocation context but do not
/// wrap the handler; use a middleware for that.
pub type Hook = Rc<dyn Fn(&Context) -> anyhow::Result<()>>;

/// The CLI-level phases a hook can be registered for.
///
/// `BeforeRun`/`AfterRun` bracket the whole `run` call and fire once per
/// invocation, whether or not a command is resolved. `BeforeCommand`/
/// `AfterCommand` bracket the resolved command's execution and also label
/// errors from the command-scoped before/after lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before any dispatch work for a `run` call.
    BeforeRun,
    /// After dispatch has finished, regardless of outcome.
    AfterRun,
    /// After the invocation context is built, before the handler.
    BeforeCommand,
    /// After the handler has returned, regardless of outcome.
    AfterCommand,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::BeforeRun => write!(f, "before-run"),
            HookPhase::AfterRun => write!(f, "after-run"),
            HookPhase::BeforeCommand => write!(f, "before-command"),
            HookPhase::AfterCommand => write!(f, "after-command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(HookPhase::BeforeRun.to_string(), "before-run");
        assert_eq!(HookPhase::AfterRun.to_string(), "after-run");
        assert_eq!(HookPhase::BeforeCommand.to_string(), "before-command");
        assert_eq!(HookPhase::AfterCommand.to_string(), "after-command");
    }
}
