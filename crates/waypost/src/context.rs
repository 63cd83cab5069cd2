//! Shared application state and the per-dispatch invocation context.
//!
//! [`App`] is constructed once per CLI instance and shared by reference
//! with every handler, hook, and middleware for the instance's lifetime.
//! [`Context`] is ephemeral: built fresh for each dispatch, dropped when
//! it returns, never shared across invocations.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::command::Command;
use crate::flags::FlagValue;

/// Type-keyed container backing the [`App`] data bag.
///
/// Values are stored by their `TypeId`, so each type can appear once.
/// Shared mutable state (counters, caches) should use interior mutability
/// inside the stored value.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value of the same type if
    /// one was stored.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Gets a reference to the stored value of type `T`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Gets the stored value of type `T`, or an error naming the missing
    /// type. Convenient inside handlers, which already return
    /// `anyhow::Result`.
    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "app value missing: type {} was never seeded",
                std::any::type_name::<T>()
            )
        })
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Process-wide shared state for one CLI instance.
///
/// Read-mostly: seeded through `CliBuilder::app_value` during construction
/// and shared by reference afterwards. Logging goes through the `log`
/// facade rather than a handle stored here; install a sink such as
/// `env_logger` in the binary.
#[derive(Debug, Default)]
pub struct App {
    data: Extensions,
}

impl App {
    pub(crate) fn new(data: Extensions) -> Self {
        Self { data }
    }

    /// The free-form data bag seeded at construction time.
    pub fn data(&self) -> &Extensions {
        &self.data
    }
}

/// Cloneable cancellation signal.
///
/// The dispatcher never polls the token itself; it only guarantees the
/// same token is observable from every hook, middleware, and handler of a
/// dispatch, so a caller-supplied deadline (for example a ctrl-c handler
/// on another thread) can be honored by user code.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation. Irrevocable for the token's lifetime.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any
    /// clone of this token.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The invocation context handed to handlers, hooks, and middleware.
///
/// Carries the shared [`App`], the resolved [`Command`], and owned
/// snapshots of the positional arguments and parsed flag values. Run-phase
/// hooks (before-run/after-run) receive a context resolved to the root
/// command with empty snapshots.
pub struct Context<'a> {
    app: Rc<App>,
    command: &'a Command,
    args: Vec<String>,
    flags: HashMap<String, FlagValue>,
    cancel: CancelToken,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        app: Rc<App>,
        command: &'a Command,
        args: Vec<String>,
        flags: HashMap<String, FlagValue>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            app,
            command,
            args,
            flags,
            cancel,
        }
    }

    /// The shared application state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The command this dispatch resolved to.
    pub fn command(&self) -> &'a Command {
        self.command
    }

    /// Positional arguments left over after flag parsing, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// All parsed flag values, keyed by flag name.
    pub fn flags(&self) -> &HashMap<String, FlagValue> {
        &self.flags
    }

    /// Looks up a single flag value by name.
    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    /// The cancellation token attached to this invocation.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Shorthand for `cancel_token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("command", &self.command.get_name())
            .field("args", &self.args)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_insert_and_get() {
        struct Database {
            url: String,
        }

        let mut ext = Extensions::new();
        assert!(ext.is_empty());

        ext.insert(Database {
            url: "postgres://localhost".into(),
        });
        assert_eq!(ext.len(), 1);
        assert!(ext.contains::<Database>());
        assert_eq!(ext.get::<Database>().unwrap().url, "postgres://localhost");
    }

    #[test]
    fn test_extensions_replace_returns_old_value() {
        struct Counter(u32);

        let mut ext = Extensions::new();
        ext.insert(Counter(1));
        let old = ext.insert(Counter(2));
        assert_eq!(old.unwrap().0, 1);
        assert_eq!(ext.get::<Counter>().unwrap().0, 2);
    }

    #[test]
    fn test_extensions_get_required_names_missing_type() {
        #[derive(Debug)]
        struct Missing;

        let ext = Extensions::new();
        let err = ext.get_required::<Missing>().unwrap_err();
        assert!(err.to_string().contains("app value missing"));
    }

    #[test]
    fn test_cancel_token_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_context_accessors() {
        let command = Command::new("deploy");
        let mut flags = HashMap::new();
        flags.insert("force".to_string(), FlagValue::Bool(true));

        let ctx = Context::new(
            Rc::new(App::default()),
            &command,
            vec!["prod".into()],
            flags,
            CancelToken::new(),
        );

        assert_eq!(ctx.command().get_name(), "deploy");
        assert_eq!(ctx.args(), ["prod"]);
        assert_eq!(ctx.flag("force"), Some(&FlagValue::Bool(true)));
        assert!(ctx.flag("dry-run").is_none());
        assert!(!ctx.is_cancelled());
    }
}
