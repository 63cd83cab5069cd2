//! Help rendering.
//!
//! A pure formatter over a command node: nothing here mutates the tree,
//! and the only failure mode is a write error on the sink. Output is
//! stable enough for golden-file comparison but is not a wire protocol.

use std::io::{self, Write};

use crate::command::{Arg, Command};
use crate::flags::{FlagSet, FlagSpec};

/// Renders the help text for `cmd` to `out`.
///
/// Sections, in order: title line (name plus summary if present), long
/// description, usage line, Arguments, Flags (sorted by name, built-in
/// help flags excluded), Commands (visible children sorted by name).
/// Sections with nothing to show are omitted.
pub fn render_help(cmd: &Command, out: &mut dyn Write) -> io::Result<()> {
    if cmd.summary.is_empty() {
        writeln!(out, "{}", cmd.name)?;
    } else {
        writeln!(out, "{} - {}", cmd.name, cmd.summary)?;
    }
    writeln!(out)?;

    if !cmd.description.is_empty() {
        writeln!(out, "{}", cmd.description)?;
        writeln!(out)?;
    }

    write!(out, "Usage:\n  {}", cmd.name)?;
    for arg in &cmd.args {
        write!(out, " {}", usage_token(arg))?;
    }
    writeln!(out)?;
    writeln!(out)?;

    if !cmd.args.is_empty() {
        render_arguments(&cmd.args, out)?;
    }

    let mut flag_set = FlagSet::new();
    if let Some(declare) = &cmd.flags {
        declare(&mut flag_set);
    }
    if !flag_set.specs().is_empty() {
        render_flags(flag_set.specs(), out)?;
    }

    let visible: Vec<&Command> = cmd.commands.iter().filter(|c| !c.hidden).collect();
    if !visible.is_empty() {
        render_subcommands(visible, out)?;
    }

    Ok(())
}

fn usage_token(arg: &Arg) -> String {
    let mut token = arg.name.clone();
    if arg.variadic {
        token.push_str("...");
    }
    if arg.optional {
        format!("[{token}]")
    } else {
        format!("<{token}>")
    }
}

fn render_arguments(args: &[Arg], out: &mut dyn Write) -> io::Result<()> {
    let width = args.iter().map(|a| a.name.len()).max().unwrap_or(0);

    writeln!(out, "Arguments:")?;
    for arg in args {
        let mut annotations = String::new();
        if arg.optional {
            annotations.push_str(" (optional)");
        }
        if arg.variadic {
            annotations.push_str(" (variadic)");
        }
        let line = format!(
            "  {:<width$}  {}{}",
            arg.name, arg.description, annotations
        );
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_flags(specs: &[FlagSpec], out: &mut dyn Write) -> io::Result<()> {
    let mut sorted: Vec<&FlagSpec> = specs.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let width = sorted.iter().map(|s| s.name.len() + 2).max().unwrap_or(0);

    writeln!(out, "Flags:")?;
    for spec in sorted {
        let line = format!(
            "  {:<width$}  {} (default {:?})",
            format!("--{}", spec.name),
            spec.usage,
            spec.default.to_string()
        );
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_subcommands(mut children: Vec<&Command>, out: &mut dyn Write) -> io::Result<()> {
    children.sort_by(|a, b| a.name.cmp(&b.name));

    let width = children.iter().map(|c| c.name.len()).max().unwrap_or(0);

    writeln!(out, "Commands:")?;
    for child in children {
        let blurb = if !child.summary.is_empty() {
            child.summary.as_str()
        } else if !child.description.is_empty() {
            child.description.as_str()
        } else {
            "-"
        };
        let line = format!("  {:<width$}  {}", child.name, blurb);
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Arg;

    fn render(cmd: &Command) -> String {
        let mut buf = Vec::new();
        render_help(cmd, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_full_help_layout() {
        let cmd = Command::new("tool")
            .summary("Does tooling")
            .description("Long description.")
            .arg(Arg::new("input").description("the input file"))
            .arg(
                Arg::new("extras")
                    .description("more inputs")
                    .optional(true)
                    .variadic(true),
            )
            .flags(|fs| {
                fs.string("name", "", "who");
                fs.int("count", 0, "how many");
            })
            .subcommand(Command::new("run").summary("Run it"))
            .subcommand(Command::new("sub"));

        let expected = "\
tool - Does tooling

Long description.

Usage:
  tool <input> [extras...]

Arguments:
  input   the input file
  extras  more inputs (optional) (variadic)

Flags:
  --count  how many (default \"0\")
  --name   who (default \"\")

Commands:
  run  Run it
  sub  -

";
        assert_eq!(render(&cmd), expected);
    }

    #[test]
    fn test_minimal_command_renders_name_and_usage_only() {
        let cmd = Command::new("bare");
        assert_eq!(render(&cmd), "bare\n\nUsage:\n  bare\n\n");
    }

    #[test]
    fn test_flags_sorted_alphabetically() {
        let cmd = Command::new("tool").flags(|fs| {
            fs.string("zeta", "z", "last");
            fs.bool("alpha", false, "first");
        });

        let output = render(&cmd);
        let alpha = output.find("--alpha").unwrap();
        let zeta = output.find("--zeta").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn test_hidden_children_are_not_listed() {
        let cmd = Command::new("root")
            .subcommand(Command::new("visible").summary("Shown"))
            .subcommand(Command::new("secret").hidden(true));

        let output = render(&cmd);
        assert!(output.contains("visible"));
        assert!(!output.contains("secret"));
    }

    #[test]
    fn test_required_variadic_usage_token() {
        let cmd = Command::new("hash").arg(Arg::new("files").variadic(true));
        assert!(render(&cmd).contains("hash <files...>"));
    }

    #[test]
    fn test_commands_fall_back_to_description_then_placeholder() {
        let cmd = Command::new("root")
            .subcommand(Command::new("a").description("described only"))
            .subcommand(Command::new("b"));

        let output = render(&cmd);
        assert!(output.contains("a  described only"));
        assert!(output.contains("b  -"));
    }
}
