//! waypost — a command dispatch engine for building CLI tools.
//!
//! waypost owns the command tree and the dispatch pipeline; flag syntax
//! is delegated to [`clap`]. Building a tool is three steps: assemble a
//! tree of [`Command`]s, wrap it in a [`Cli`] (optionally attaching
//! hooks, middleware, and shared app values), then call [`Cli::run`]
//! with the process arguments.
//!
//! ```no_run
//! use waypost::{Arg, Cli, Command};
//!
//! let root = Command::new("greet").subcommand(
//!     Command::new("hello")
//!         .summary("Say hello")
//!         .arg(Arg::new("name"))
//!         .flags(|fs| {
//!             fs.bool("shout", false, "print in caps");
//!         })
//!         .handler(|ctx| {
//!             let mut line = format!("hello, {}", ctx.args()[0]);
//!             if ctx.flag("shout").and_then(|v| v.as_bool()).unwrap_or(false) {
//!                 line = line.to_uppercase();
//!             }
//!             println!("{line}");
//!             Ok(())
//!         }),
//! );
//!
//! let cli = Cli::new(root);
//! if let Err(err) = cli.run(std::env::args().skip(1)) {
//!     eprintln!("{err}");
//!     std::process::exit(1);
//! }
//! ```
//!
//! A dispatch resolves the deepest matching command, parses the
//! remaining tokens as that command's flags, validates the positional
//! remainder against its declared [`Arg`]s, then runs the handler inside
//! its middleware onion with before/after hooks around it. Commands
//! without a handler render their help, and a `help` command is
//! installed automatically.
//!
//! Extension points:
//!
//! - [`Registrar`] — the contract plugins register commands, middleware,
//!   and hooks through.
//! - [`HookPhase`] — CLI-level hook phases around the run and around
//!   every command.
//! - [`Middleware`] — handler decorators, scoped per command or global.
//! - [`Extensions`] / [`App`] — type-keyed shared state seeded at
//!   construction and visible to every handler.
//!
//! Dispatch is synchronous and single-threaded; [`CancelToken`] lets
//! another thread request cooperative cancellation that handlers can
//! poll via [`Context::is_cancelled`].

mod cli;
mod command;
mod context;
mod error;
mod flags;
mod help;
mod hooks;
mod middleware;
mod registrar;

pub use cli::{Cli, CliBuilder};
pub use command::{Arg, Command};
pub use context::{App, CancelToken, Context, Extensions};
pub use error::Error;
pub use flags::{FlagSet, FlagValue};
pub use help::render_help;
pub use hooks::{Hook, HookPhase};
pub use middleware::{Handler, Middleware};
pub use registrar::Registrar;
