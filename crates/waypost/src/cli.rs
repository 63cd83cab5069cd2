//! The CLI instance and dispatch engine.
//!
//! [`Cli`] owns the command tree, the hook registry, the global middleware
//! list, and the output sinks. Construction and registration happen first;
//! [`Cli::run`] may then be called any number of times, each call an
//! independent, fully synchronous dispatch on the caller's thread.
//!
//! Dispatch walks the tree to the deepest command whose name or alias
//! matches the next token, parses the remaining tokens through the flag
//! adapter, validates the positional remainder, then executes:
//!
//! ```text
//! before-command hooks (CLI, ancestors root→leaf, command)   fail-fast
//! handler wrapped in middleware (leaf innermost, global outermost)
//! after hooks (command, ancestors leaf→root, CLI)            best-effort
//! ```
//!
//! An after hook's error only becomes the result when everything before
//! it succeeded; a handler error is never masked.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::command::{Arg, Command};
use crate::context::{App, CancelToken, Context, Extensions};
use crate::error::Error;
use crate::flags::FlagSet;
use crate::help::render_help;
use crate::hooks::{Hook, HookPhase};
use crate::middleware::{self, Handler, Middleware};

/// A CLI instance: the root command plus everything registered against it.
pub struct Cli {
    app: Rc<App>,
    root: Command,
    out: RefCell<Box<dyn Write>>,
    err: RefCell<Box<dyn Write>>,
    hooks: HashMap<HookPhase, Vec<Hook>>,
    middleware: Vec<Middleware>,
    help_command_name: String,
    cancel: CancelToken,
}

impl Cli {
    /// Creates a CLI with default configuration. Equivalent to
    /// `Cli::builder(root).build()`.
    pub fn new(root: Command) -> Self {
        Self::builder(root).build()
    }

    /// Starts building a CLI around the given root command.
    pub fn builder(root: Command) -> CliBuilder {
        CliBuilder::new(root)
    }

    /// The shared application state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The root of the command tree.
    pub fn root(&self) -> &Command {
        &self.root
    }

    /// The configured name of the built-in help command.
    pub fn help_command_name(&self) -> &str {
        &self.help_command_name
    }

    /// Exclusive access to the configured output sink.
    pub fn out(&self) -> RefMut<'_, dyn Write> {
        RefMut::map(self.out.borrow_mut(), |w| w.as_mut())
    }

    /// Exclusive access to the configured error sink.
    pub fn err(&self) -> RefMut<'_, dyn Write> {
        RefMut::map(self.err.borrow_mut(), |w| w.as_mut())
    }

    /// Appends a global middleware; it wraps every dispatched handler
    /// outermost, observing the call first on entry and last on exit.
    pub fn middleware<F>(&mut self, middleware: F)
    where
        F: Fn(Handler) -> Handler + 'static,
    {
        self.middleware.push(Rc::new(middleware));
    }

    /// Registers a hook for a CLI-level phase. Hooks of one phase run in
    /// registration order.
    pub fn hook<F>(&mut self, phase: HookPhase, hook: F)
    where
        F: Fn(&Context) -> anyhow::Result<()> + 'static,
    {
        self.hooks.entry(phase).or_default().push(Rc::new(hook));
    }

    /// Resolves a command by path, one visible name or alias per segment.
    /// The empty path resolves to the root.
    pub fn find_command(&self, path: &[&str]) -> Option<&Command> {
        let mut current = &self.root;
        for segment in path {
            current = current.find_child(segment)?;
        }
        Some(current)
    }

    fn find_command_mut(&mut self, path: &[&str]) -> Option<&mut Command> {
        let mut current = &mut self.root;
        for segment in path {
            current = current.find_child_mut(segment)?;
        }
        Some(current)
    }

    /// Registers `cmd` as a child of the command at `parent_path` (empty
    /// path means the root).
    ///
    /// Fails with [`Error::InvalidCommand`] on an empty or whitespace
    /// name, [`Error::CommandNotFound`] when a path segment does not
    /// resolve, and [`Error::NameCollision`] when the name or any alias
    /// already matches a sibling's name or alias (case-sensitive). Must
    /// only be called before the first `run`.
    pub fn register_command(&mut self, parent_path: &[&str], cmd: Command) -> Result<(), Error> {
        if cmd.name.trim().is_empty() {
            return Err(Error::InvalidCommand);
        }

        let parent = self
            .find_command_mut(parent_path)
            .ok_or_else(|| Error::CommandNotFound {
                path: parent_path.join(" "),
            })?;

        if parent.collides(&cmd.name) {
            return Err(Error::NameCollision {
                name: cmd.name.clone(),
            });
        }
        if let Some(alias) = cmd.aliases.iter().find(|a| parent.collides(a)) {
            return Err(Error::NameCollision {
                name: alias.clone(),
            });
        }

        log::debug!(
            "registered command '{}' under '{}'",
            cmd.name,
            parent.name
        );
        parent.commands.push(cmd);
        Ok(())
    }

    /// Runs one dispatch for `tokens` (the argument vector, program name
    /// excluded). With no tokens, renders root help. Returns the first
    /// fail-fast error, the handler error, or an after-hook error when
    /// nothing failed before it. Translating the error into a process
    /// exit code is the caller's business.
    pub fn run<I, S>(&self, tokens: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();

        let run_ctx = Context::new(
            Rc::clone(&self.app),
            &self.root,
            Vec::new(),
            HashMap::new(),
            self.cancel.clone(),
        );

        // A before-run failure skips dispatch but still reaches the
        // after-run chain below.
        let mut result = run_fail_fast(
            self.phase_hooks(HookPhase::BeforeRun),
            &run_ctx,
            HookPhase::BeforeRun,
        )
        .err();

        if result.is_none() {
            result = if tokens.is_empty() {
                self.print_help(&self.root).err()
            } else {
                self.execute(&self.root, &tokens, &mut Vec::new()).err()
            };
        }

        run_best_effort(
            self.phase_hooks(HookPhase::AfterRun),
            &run_ctx,
            HookPhase::AfterRun,
            &mut result,
        );

        match result {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn execute<'t>(
        &'t self,
        cmd: &'t Command,
        tokens: &[String],
        parents: &mut Vec<&'t Command>,
    ) -> Result<(), Error> {
        if let Some(first) = tokens.first() {
            if let Some(sub) = cmd.find_child(first) {
                parents.push(cmd);
                return self.execute(sub, &tokens[1..], parents);
            }
        }

        log::debug!("dispatching '{}' with {} token(s)", cmd.name, tokens.len());

        let mut flag_set = FlagSet::new();
        if let Some(declare) = &cmd.flags {
            declare(&mut flag_set);
        }
        let parsed = flag_set.parse(&cmd.name, tokens)?;

        if parsed.help {
            return self.print_help(cmd);
        }

        cmd.validate_positional(&parsed.positional)?;

        let ctx = Context::new(
            Rc::clone(&self.app),
            cmd,
            parsed.positional,
            parsed.flags,
            self.cancel.clone(),
        );

        run_fail_fast(
            self.phase_hooks(HookPhase::BeforeCommand),
            &ctx,
            HookPhase::BeforeCommand,
        )?;
        for parent in parents.iter() {
            run_fail_fast(&parent.before, &ctx, HookPhase::BeforeCommand)?;
        }
        run_fail_fast(&cmd.before, &ctx, HookPhase::BeforeCommand)?;

        let handler = match &cmd.handler {
            Some(handler) => Rc::clone(handler),
            None if cmd.builtin_help => return self.run_help_lookup(&ctx),
            None => return self.print_help(cmd),
        };

        let mut assembled = middleware::apply(handler, &cmd.middleware);
        for parent in parents.iter().rev() {
            assembled = middleware::apply(assembled, &parent.middleware);
        }
        assembled = middleware::apply(assembled, &self.middleware);

        let mut result = assembled(&ctx).map_err(Error::Handler).err();

        run_best_effort(&cmd.after, &ctx, HookPhase::AfterCommand, &mut result);
        for parent in parents.iter().rev() {
            run_best_effort(&parent.after, &ctx, HookPhase::AfterCommand, &mut result);
        }
        run_best_effort(
            self.phase_hooks(HookPhase::AfterCommand),
            &ctx,
            HookPhase::AfterCommand,
            &mut result,
        );

        match result {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Handles the built-in help command: no arguments renders root help,
    /// otherwise the arguments form a command path to render.
    fn run_help_lookup(&self, ctx: &Context) -> Result<(), Error> {
        if ctx.args().is_empty() {
            return self.print_help(&self.root);
        }
        let path: Vec<&str> = ctx.args().iter().map(String::as_str).collect();
        match self.find_command(&path) {
            Some(target) => self.print_help(target),
            None => Err(Error::CommandNotFound {
                path: path.join(" "),
            }),
        }
    }

    fn print_help(&self, cmd: &Command) -> Result<(), Error> {
        let mut out = self.out.borrow_mut();
        render_help(cmd, out.as_mut())?;
        Ok(())
    }

    fn phase_hooks(&self, phase: HookPhase) -> &[Hook] {
        self.hooks.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    fn install_help_command(&mut self) {
        let name = self.help_command_name.clone();
        if self.root.name == name || self.root.collides(&name) {
            return;
        }

        let mut help = Command::new(name)
            .summary("Show help")
            .description("Show help for a command")
            .arg(
                Arg::new("path")
                    .description("Command path, e.g. remote add")
                    .optional(true)
                    .variadic(true),
            );
        help.builtin_help = true;
        self.root.commands.push(help);
    }
}

fn run_fail_fast(hooks: &[Hook], ctx: &Context, phase: HookPhase) -> Result<(), Error> {
    for hook in hooks {
        hook(ctx).map_err(|source| Error::Hook { phase, source })?;
    }
    Ok(())
}

/// Runs every hook; a hook error only fills a still-empty result slot.
fn run_best_effort(hooks: &[Hook], ctx: &Context, phase: HookPhase, result: &mut Option<Error>) {
    for hook in hooks {
        if let Err(source) = hook(ctx) {
            if result.is_none() {
                *result = Some(Error::Hook { phase, source });
            } else {
                log::debug!("{phase} hook error suppressed by earlier failure: {source}");
            }
        }
    }
}

/// Builder for [`Cli`] instances.
pub struct CliBuilder {
    root: Command,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    help_command_name: String,
    data: Extensions,
    cancel: CancelToken,
}

impl CliBuilder {
    fn new(root: Command) -> Self {
        Self {
            root,
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            help_command_name: "help".to_string(),
            data: Extensions::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the output sink (help text goes here).
    pub fn writer(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Replaces the error sink. The core itself never writes to it; it is
    /// offered to handlers and binaries via [`Cli::err`].
    pub fn error_writer(mut self, err: impl Write + 'static) -> Self {
        self.err = Box::new(err);
        self
    }

    /// Renames the built-in help command. Blank names are ignored.
    pub fn help_command_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.help_command_name = name;
        }
        self
    }

    /// Seeds a value into the [`App`] data bag, retrievable from any
    /// handler via `ctx.app().data().get::<T>()`.
    pub fn app_value<T: 'static>(mut self, value: T) -> Self {
        self.data.insert(value);
        self
    }

    /// Attaches a cancellation token every invocation context will carry.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Builds the CLI and installs the help command (skipped when its
    /// name would collide with the root or an existing child). A blank
    /// root name defaults to `"app"`.
    pub fn build(self) -> Cli {
        let mut root = self.root;
        if root.name.trim().is_empty() {
            root.name = "app".to_string();
        }

        let mut cli = Cli {
            app: Rc::new(App::new(self.data)),
            root,
            out: RefCell::new(self.out),
            err: RefCell::new(self.err),
            hooks: HashMap::new(),
            middleware: Vec::new(),
            help_command_name: self.help_command_name,
            cancel: self.cancel,
        };
        cli.install_help_command();
        cli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_root_name_defaults_to_app() {
        let cli = Cli::new(Command::new("  "));
        assert_eq!(cli.root().get_name(), "app");
    }

    #[test]
    fn test_help_command_installed_under_root() {
        let cli = Cli::new(Command::new("tool"));
        assert!(cli.find_command(&["help"]).is_some());
    }

    #[test]
    fn test_help_command_skipped_on_collision() {
        let cli = Cli::new(Command::new("tool").subcommand(Command::new("help").summary("Mine")));
        let help = cli.find_command(&["help"]).unwrap();
        assert_eq!(help.get_summary(), "Mine");
    }

    #[test]
    fn test_help_command_renamed() {
        let cli = Cli::builder(Command::new("tool"))
            .help_command_name("assist")
            .build();
        assert!(cli.find_command(&["assist"]).is_some());
        assert!(cli.find_command(&["help"]).is_none());
    }

    #[test]
    fn test_blank_help_command_name_ignored() {
        let cli = Cli::builder(Command::new("tool"))
            .help_command_name("   ")
            .build();
        assert_eq!(cli.help_command_name(), "help");
    }

    #[test]
    fn test_register_command_rejects_blank_name() {
        let mut cli = Cli::new(Command::new("tool"));
        assert!(matches!(
            cli.register_command(&[], Command::new("  ")),
            Err(Error::InvalidCommand)
        ));
    }

    #[test]
    fn test_register_command_unknown_parent() {
        let mut cli = Cli::new(Command::new("tool"));
        let err = cli
            .register_command(&["missing"], Command::new("child"))
            .unwrap_err();
        assert!(matches!(err, Error::CommandNotFound { .. }));
    }

    #[test]
    fn test_register_command_collisions() {
        let mut cli = Cli::new(Command::new("tool"));
        cli.register_command(&[], Command::new("fetch").alias("f"))
            .unwrap();

        // name vs name
        assert!(matches!(
            cli.register_command(&[], Command::new("fetch")),
            Err(Error::NameCollision { name }) if name == "fetch"
        ));
        // name vs existing alias
        assert!(matches!(
            cli.register_command(&[], Command::new("f")),
            Err(Error::NameCollision { name }) if name == "f"
        ));
        // alias vs existing name
        assert!(matches!(
            cli.register_command(&[], Command::new("grab").alias("fetch")),
            Err(Error::NameCollision { name }) if name == "fetch"
        ));
        // different case is a different name
        cli.register_command(&[], Command::new("Fetch")).unwrap();
    }

    #[test]
    fn test_registered_command_resolvable_by_name_and_alias() {
        let mut cli = Cli::new(Command::new("tool"));
        cli.register_command(&[], Command::new("remote")).unwrap();
        cli.register_command(&["remote"], Command::new("add").alias("a"))
            .unwrap();

        assert!(cli.find_command(&["remote", "add"]).is_some());
        assert!(cli.find_command(&["remote", "a"]).is_some());
    }

    #[test]
    fn test_find_command_empty_path_is_root() {
        let cli = Cli::new(Command::new("tool"));
        assert!(std::ptr::eq(cli.find_command(&[]).unwrap(), cli.root()));
    }

    #[test]
    fn test_find_command_is_stable_between_registrations() {
        let mut cli = Cli::new(Command::new("tool"));
        cli.register_command(&[], Command::new("fetch")).unwrap();

        let first = cli.find_command(&["fetch"]).unwrap() as *const Command;
        let second = cli.find_command(&["fetch"]).unwrap() as *const Command;
        assert_eq!(first, second);
    }
}
