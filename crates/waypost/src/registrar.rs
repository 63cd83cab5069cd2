//! The plugin registration surface.
//!
//! Anything that wants to contribute commands, middleware, or hooks
//! without holding a concrete [`Cli`] codes against [`Registrar`]. A
//! plugin entry point takes `&mut dyn Registrar`, so it works the same
//! whether the host hands it a real CLI or a test double.
//!
//! All registration must finish before the first dispatch.

use crate::cli::Cli;
use crate::command::Command;
use crate::context::Context;
use crate::error::Error;
use crate::hooks::{Hook, HookPhase};
use crate::middleware::{Handler, Middleware};

/// The registration contract a host exposes to plugins.
pub trait Registrar {
    /// Registers `cmd` under the command at `parent_path` (empty path
    /// means the root). Fails on blank names, unresolvable paths, and
    /// sibling name or alias collisions.
    fn register_command(&mut self, parent_path: &[&str], cmd: Command) -> Result<(), Error>;

    /// Appends a global middleware, outermost around every handler.
    fn register_middleware(&mut self, middleware: Middleware);

    /// Appends a hook for a CLI-level phase.
    fn register_hook(&mut self, phase: HookPhase, hook: Hook);

    /// Resolves a command by path for inspection; the empty path is the
    /// root. Hidden commands do not resolve.
    fn resolve_command(&self, path: &[&str]) -> Option<&Command>;
}

impl Registrar for Cli {
    fn register_command(&mut self, parent_path: &[&str], cmd: Command) -> Result<(), Error> {
        Cli::register_command(self, parent_path, cmd)
    }

    fn register_middleware(&mut self, middleware: Middleware) {
        Cli::middleware(self, move |next: Handler| middleware(next));
    }

    fn register_hook(&mut self, phase: HookPhase, hook: Hook) {
        Cli::hook(self, phase, move |ctx: &Context| hook(ctx));
    }

    fn resolve_command(&self, path: &[&str]) -> Option<&Command> {
        self.find_command(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(reg: &mut dyn Registrar) -> Result<(), Error> {
        reg.register_command(&[], Command::new("plugin").summary("From a plugin"))?;
        reg.register_command(&["plugin"], Command::new("sub"))?;
        Ok(())
    }

    #[test]
    fn test_plugin_registers_through_trait_object() {
        let mut cli = Cli::new(Command::new("host"));
        install(&mut cli).unwrap();

        assert!(cli.resolve_command(&["plugin"]).is_some());
        assert!(cli.resolve_command(&["plugin", "sub"]).is_some());
        assert!(cli.resolve_command(&["absent"]).is_none());
    }

    #[test]
    fn test_resolve_command_empty_path_is_root() {
        let cli = Cli::new(Command::new("host"));
        let root = cli.resolve_command(&[]).unwrap();
        assert_eq!(root.get_name(), "host");
    }
}
