//! The flag adapter.
//!
//! The dispatcher never parses flag syntax itself; it hands the remaining
//! tokens to a per-invocation [`FlagSet`], which assembles a scoped
//! `clap::Command` and parses with it. The adapter always registers the
//! boolean help flag under `-h` and `--help`, and a trailing catch-all
//! positional that captures the non-flag remainder: flag parsing stops at
//! the first positional token, everything after it is delivered verbatim.
//!
//! Parse results come back as tagged [`FlagValue`]s so downstream code
//! never probes for a typed accessor at runtime.

use std::collections::HashMap;
use std::fmt;

use clap::{Arg as ClapArg, ArgAction};

/// Arg id of the built-in help flag. `h` and `help` are reserved; a
/// command must not declare flags under either name.
const HELP_ID: &str = "help";
/// Arg id of the catch-all positional capturing the non-flag remainder.
const REST_ID: &str = "__rest";

/// A parsed flag value, tagged with its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    /// Boolean flag; bare `--flag` means true, `--flag=false` overrides.
    Bool(bool),
    /// Signed integer flag.
    Int(i64),
    /// Floating-point flag.
    Float(f64),
    /// String flag.
    String(String),
}

impl FlagValue {
    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FlagValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The string payload, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Int(i) => write!(f, "{i}"),
            FlagValue::Float(x) => write!(f, "{x}"),
            FlagValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// One declared flag: name, usage text, and typed default.
#[derive(Debug, Clone)]
pub(crate) struct FlagSpec {
    pub(crate) name: String,
    pub(crate) usage: String,
    pub(crate) default: FlagValue,
}

impl FlagSpec {
    fn to_clap(&self) -> ClapArg {
        let arg = ClapArg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone())
            .default_value(self.default.to_string());
        match self.default {
            FlagValue::Bool(_) => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(clap::value_parser!(bool)),
            FlagValue::Int(_) => arg.value_parser(clap::value_parser!(i64)),
            FlagValue::Float(_) => arg.value_parser(clap::value_parser!(f64)),
            FlagValue::String(_) => arg.value_parser(clap::value_parser!(String)),
        }
    }
}

/// Everything one parse produces: the help-flag state, the positional
/// remainder, and the typed flag snapshot (defaults filled in for flags
/// absent from the command line).
#[derive(Debug)]
pub(crate) struct ParsedFlags {
    pub(crate) help: bool,
    pub(crate) positional: Vec<String>,
    pub(crate) flags: HashMap<String, FlagValue>,
}

/// The per-invocation flag registry a command declares its flags on.
///
/// Flag names are long-form (`--name`) and must be unique within one set;
/// redeclaring a name, or declaring `h`/`help`, is a programming error
/// the parser will panic on, mirroring the underlying parser's contract.
#[derive(Debug, Default)]
pub struct FlagSet {
    specs: Vec<FlagSpec>,
}

impl FlagSet {
    /// Creates an empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a boolean flag.
    pub fn bool(&mut self, name: impl Into<String>, default: bool, usage: impl Into<String>) -> &mut Self {
        self.push(name.into(), usage.into(), FlagValue::Bool(default))
    }

    /// Declares an integer flag.
    pub fn int(&mut self, name: impl Into<String>, default: i64, usage: impl Into<String>) -> &mut Self {
        self.push(name.into(), usage.into(), FlagValue::Int(default))
    }

    /// Declares a floating-point flag.
    pub fn float(&mut self, name: impl Into<String>, default: f64, usage: impl Into<String>) -> &mut Self {
        self.push(name.into(), usage.into(), FlagValue::Float(default))
    }

    /// Declares a string flag.
    pub fn string(
        &mut self,
        name: impl Into<String>,
        default: impl Into<String>,
        usage: impl Into<String>,
    ) -> &mut Self {
        self.push(name.into(), usage.into(), FlagValue::String(default.into()))
    }

    fn push(&mut self, name: String, usage: String, default: FlagValue) -> &mut Self {
        self.specs.push(FlagSpec {
            name,
            usage,
            default,
        });
        self
    }

    pub(crate) fn specs(&self) -> &[FlagSpec] {
        &self.specs
    }

    /// Parses `tokens` against this set plus the built-in help flag.
    ///
    /// `command_name` only labels parse errors; tokens must not include it.
    pub(crate) fn parse(
        &self,
        command_name: &str,
        tokens: &[String],
    ) -> Result<ParsedFlags, clap::Error> {
        let mut cmd = clap::Command::new(command_name.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .arg(
                ClapArg::new(HELP_ID)
                    .short('h')
                    .long("help")
                    .help("show help")
                    .action(ArgAction::SetTrue),
            );
        for spec in &self.specs {
            cmd = cmd.arg(spec.to_clap());
        }
        cmd = cmd.arg(
            ClapArg::new(REST_ID)
                .num_args(0..)
                .trailing_var_arg(true)
                .value_parser(clap::value_parser!(String)),
        );

        let matches = cmd.try_get_matches_from(tokens)?;

        let positional = matches
            .get_many::<String>(REST_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        let mut flags = HashMap::new();
        for spec in &self.specs {
            let value = match &spec.default {
                FlagValue::Bool(default) => FlagValue::Bool(
                    matches.get_one::<bool>(&spec.name).copied().unwrap_or(*default),
                ),
                FlagValue::Int(default) => FlagValue::Int(
                    matches.get_one::<i64>(&spec.name).copied().unwrap_or(*default),
                ),
                FlagValue::Float(default) => FlagValue::Float(
                    matches.get_one::<f64>(&spec.name).copied().unwrap_or(*default),
                ),
                FlagValue::String(default) => FlagValue::String(
                    matches
                        .get_one::<String>(&spec.name)
                        .cloned()
                        .unwrap_or_else(|| default.clone()),
                ),
            };
            flags.insert(spec.name.clone(), value);
        }

        Ok(ParsedFlags {
            help: matches.get_flag(HELP_ID),
            positional,
            flags,
        })
    }
}
