//! Handler and middleware types.
//!
//! A middleware takes a handler and produces a handler, enabling
//! cross-cutting behavior (timing, auth, tracing) without touching command
//! logic. Within one list, later entries nest closer to the underlying
//! handler; across scopes the dispatcher layers leaf middleware innermost
//! and CLI-global middleware outermost, so global middleware observes the
//! call first on entry and last on exit.

use std::rc::Rc;

use crate::context::Context;

/// The unit of work executed for a resolved command.
///
/// Handlers are shared `Fn` closures; mutable state they need should live
/// in the [`App`](crate::App) data bag behind interior mutability, or be
/// captured via `Rc<RefCell<_>>`.
pub type Handler = Rc<dyn Fn(&Context) -> anyhow::Result<()>>;

/// A handler-to-handler wrapper.
pub type Middleware = Rc<dyn Fn(Handler) -> Handler>;

/// Wraps `handler` with every middleware in `chain`.
///
/// Applied back to front so that `chain[0]` ends up outermost.
pub(crate) fn apply(handler: Handler, chain: &[Middleware]) -> Handler {
    let mut wrapped = handler;
    for middleware in chain.iter().rev() {
        wrapped = middleware(wrapped);
    }
    wrapped
}
