//! The command tree data model.
//!
//! A [`Command`] is a named, optionally executable node. Children are
//! owned by value, so a child can never outlive its parent. The tree is
//! assembled with the builder methods here (or through
//! [`Registrar::register_command`](crate::Registrar::register_command))
//! during a registration phase that must finish before the first `run`;
//! it is read-only afterwards.

use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::flags::FlagSet;
use crate::hooks::Hook;
use crate::middleware::{Handler, Middleware};

pub(crate) type FlagsFn = Rc<dyn Fn(&mut FlagSet)>;

/// A declared positional argument.
///
/// The required-argument count of a command is the number of args that
/// are neither optional nor variadic. A variadic arg absorbs any number
/// of trailing positional tokens and should be declared last.
#[derive(Debug, Clone)]
pub struct Arg {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) optional: bool,
    pub(crate) variadic: bool,
}

impl Arg {
    /// Creates a required, non-variadic argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            optional: false,
            variadic: false,
        }
    }

    /// Sets the description shown in help.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the argument optional.
    pub fn optional(mut self, yes: bool) -> Self {
        self.optional = yes;
        self
    }

    /// Marks the argument variadic.
    pub fn variadic(mut self, yes: bool) -> Self {
        self.variadic = yes;
        self
    }

    /// The argument name.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The argument description.
    pub fn get_description(&self) -> &str {
        &self.description
    }

    /// Whether the argument may be omitted.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the argument absorbs all trailing tokens.
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// A node in the dispatch tree.
pub struct Command {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) summary: String,
    pub(crate) hidden: bool,
    pub(crate) aliases: Vec<String>,
    pub(crate) args: Vec<Arg>,
    pub(crate) flags: Option<FlagsFn>,
    pub(crate) handler: Option<Handler>,
    pub(crate) commands: Vec<Command>,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
    pub(crate) middleware: Vec<Middleware>,
    /// Set on the auto-installed help command; dispatched at the
    /// no-handler branch instead of rendering this node's own help.
    pub(crate) builtin_help: bool,
}

impl Command {
    /// Creates a command with the given name and no behavior.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            summary: String::new(),
            hidden: false,
            aliases: Vec::new(),
            args: Vec::new(),
            flags: None,
            handler: None,
            commands: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            middleware: Vec::new(),
            builtin_help: false,
        }
    }

    /// Sets the long description shown in help.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the one-line summary shown in help listings.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Hides the command from resolution and help listings.
    pub fn hidden(mut self, yes: bool) -> Self {
        self.hidden = yes;
        self
    }

    /// Adds an alternate name the command resolves under.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Appends a declared positional argument.
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Sets the flag-declaration callback, invoked once per dispatch to
    /// register this command's flags on a fresh [`FlagSet`].
    pub fn flags<F>(mut self, declare: F) -> Self
    where
        F: Fn(&mut FlagSet) + 'static,
    {
        self.flags = Some(Rc::new(declare));
        self
    }

    /// Sets the handler executed when this command is dispatched. A
    /// command without a handler renders its help instead.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&crate::Context) -> anyhow::Result<()> + 'static,
    {
        self.handler = Some(Rc::new(handler));
        self
    }

    /// Appends a child command. No collision checking happens here;
    /// use [`Cli::register_command`](crate::Cli::register_command) for
    /// validated registration.
    pub fn subcommand(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Appends a hook run before this command's handler (fail-fast).
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&crate::Context) -> anyhow::Result<()> + 'static,
    {
        self.before.push(Rc::new(hook));
        self
    }

    /// Appends a hook run after this command's handler (best-effort).
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&crate::Context) -> anyhow::Result<()> + 'static,
    {
        self.after.push(Rc::new(hook));
        self
    }

    /// Appends a middleware scoped to this command. Later entries nest
    /// closer to the handler.
    pub fn middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(Handler) -> Handler + 'static,
    {
        self.middleware.push(Rc::new(middleware));
        self
    }

    /// The command name.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The long description.
    pub fn get_description(&self) -> &str {
        &self.description
    }

    /// The one-line summary.
    pub fn get_summary(&self) -> &str {
        &self.summary
    }

    /// The command's aliases.
    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The declared positional arguments.
    pub fn get_args(&self) -> &[Arg] {
        &self.args
    }

    /// The child commands, in registration order.
    pub fn get_subcommands(&self) -> &[Command] {
        &self.commands
    }

    /// Whether the command is hidden from resolution and help.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Finds a visible child whose name or alias equals `token`
    /// (case-sensitive). This is the resolution rule shared by dispatch
    /// and `find_command`.
    pub(crate) fn find_child(&self, token: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|c| !c.hidden && (c.name == token || c.aliases.iter().any(|a| a == token)))
    }

    pub(crate) fn find_child_mut(&mut self, token: &str) -> Option<&mut Command> {
        self.commands
            .iter_mut()
            .find(|c| !c.hidden && (c.name == token || c.aliases.iter().any(|a| a == token)))
    }

    /// Returns `true` if any child (hidden included) already claims
    /// `name_or_alias` as its name or one of its aliases.
    pub(crate) fn collides(&self, name_or_alias: &str) -> bool {
        self.commands
            .iter()
            .any(|c| c.name == name_or_alias || c.aliases.iter().any(|a| a == name_or_alias))
    }

    /// Checks the positional remainder against the declared args.
    ///
    /// A command that declares no args accepts any token count: unmatched
    /// trailing tokens are treated as its own undeclared arguments.
    pub(crate) fn validate_positional(&self, given: &[String]) -> Result<(), Error> {
        if self.args.is_empty() {
            return Ok(());
        }

        let required = self
            .args
            .iter()
            .filter(|a| !a.optional && !a.variadic)
            .count();
        let has_variadic = self.args.iter().any(|a| a.variadic);

        if given.len() < required {
            return Err(Error::MissingArguments {
                required,
                given: given.len(),
            });
        }
        if !has_variadic && given.len() > self.args.len() {
            return Err(Error::TooManyArguments {
                given: given.len(),
                max: self.args.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("args", &self.args)
            .field("subcommands", &self.commands.len())
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builder_sets_fields() {
        let cmd = Command::new("sync")
            .summary("Sync things")
            .description("Synchronizes the local state with the remote.")
            .alias("s")
            .hidden(false)
            .arg(Arg::new("remote").description("remote name"));

        assert_eq!(cmd.get_name(), "sync");
        assert_eq!(cmd.get_summary(), "Sync things");
        assert_eq!(cmd.get_aliases(), ["s"]);
        assert_eq!(cmd.get_args().len(), 1);
        assert!(!cmd.is_hidden());
    }

    #[test]
    fn test_find_child_matches_name_and_alias() {
        let parent = Command::new("root")
            .subcommand(Command::new("sub1"))
            .subcommand(Command::new("sub2").alias("s2"));

        assert_eq!(parent.find_child("sub1").unwrap().get_name(), "sub1");
        assert_eq!(parent.find_child("s2").unwrap().get_name(), "sub2");
        assert!(parent.find_child("nonexistent").is_none());
    }

    #[test]
    fn test_find_child_skips_hidden() {
        let parent = Command::new("root").subcommand(Command::new("secret").hidden(true));
        assert!(parent.find_child("secret").is_none());
        // collision detection still sees hidden children
        assert!(parent.collides("secret"));
    }

    #[test]
    fn test_collides_checks_names_and_aliases() {
        let parent = Command::new("root").subcommand(Command::new("existing").alias("ex"));

        assert!(parent.collides("existing"));
        assert!(parent.collides("ex"));
        assert!(!parent.collides("new"));
        // case-sensitive, exact match
        assert!(!parent.collides("Existing"));
    }

    #[test]
    fn test_validate_positional_required_and_optional() {
        let cmd = Command::new("cp")
            .arg(Arg::new("source"))
            .arg(Arg::new("dest").optional(true));

        assert!(cmd.validate_positional(&strings(&["a"])).is_ok());
        assert!(cmd.validate_positional(&strings(&["a", "b"])).is_ok());
        assert!(matches!(
            cmd.validate_positional(&[]),
            Err(Error::MissingArguments {
                required: 1,
                given: 0
            })
        ));
        assert!(matches!(
            cmd.validate_positional(&strings(&["a", "b", "c"])),
            Err(Error::TooManyArguments { given: 3, max: 2 })
        ));
    }

    #[test]
    fn test_validate_positional_variadic_absorbs_excess() {
        let cmd = Command::new("add")
            .arg(Arg::new("first"))
            .arg(Arg::new("rest").variadic(true));

        assert!(cmd.validate_positional(&strings(&["a"])).is_ok());
        assert!(cmd
            .validate_positional(&strings(&["a", "b", "c", "d"]))
            .is_ok());
        assert!(matches!(
            cmd.validate_positional(&[]),
            Err(Error::MissingArguments { .. })
        ));
    }

    #[test]
    fn test_validate_positional_skipped_without_declared_args() {
        let cmd = Command::new("bare");
        assert!(cmd.validate_positional(&strings(&["anything", "goes"])).is_ok());
    }
}
