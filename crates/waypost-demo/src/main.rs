//! A small end-to-end demo of the waypost dispatch engine.
//!
//! ```text
//! waypost-demo greet sam --times=2 --shout
//! waypost-demo hi sam
//! waypost-demo help greet
//! waypost-demo version
//! ```

use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use waypost::{Arg, Cli, Command, Context, Error, Handler, HookPhase, Registrar};

fn greet_command() -> Command {
    Command::new("greet")
        .alias("hi")
        .summary("Greet someone")
        .description("Prints a greeting, optionally shouted and repeated.")
        .arg(Arg::new("name").description("who to greet"))
        .flags(|fs| {
            fs.bool("shout", false, "print the greeting in caps")
                .int("times", 1, "how many times to greet");
        })
        .handler(|ctx: &Context| {
            let name = &ctx.args()[0];
            let shout = ctx.flag("shout").and_then(|v| v.as_bool()).unwrap_or(false);
            let times = ctx.flag("times").and_then(|v| v.as_int()).unwrap_or(1);

            let mut line = format!("hello, {name}");
            if shout {
                line = line.to_uppercase();
            }
            for _ in 0..times {
                println!("{line}");
            }
            Ok(())
        })
}

/// Logs how long each dispatched handler took.
fn timing_middleware(next: Handler) -> Handler {
    Rc::new(move |ctx| {
        let started = Instant::now();
        let result = next(ctx);
        log::info!(
            "{} finished in {:?}",
            ctx.command().get_name(),
            started.elapsed()
        );
        result
    })
}

/// Everything a third-party extension would contribute, wired through the
/// registration contract rather than the concrete CLI type.
fn install_plugins(reg: &mut dyn Registrar) -> Result<(), Error> {
    reg.register_command(
        &[],
        Command::new("version")
            .summary("Print the version")
            .handler(|_ctx| {
                println!("waypost-demo {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }),
    )?;
    reg.register_hook(
        HookPhase::AfterCommand,
        Rc::new(|ctx| {
            log::debug!("command '{}' completed", ctx.command().get_name());
            Ok(())
        }),
    );
    Ok(())
}

fn build_cli() -> Result<Cli, Error> {
    let root = Command::new("waypost-demo")
        .summary("waypost demo application")
        .subcommand(greet_command());

    let mut cli = Cli::builder(root).build();
    cli.middleware(timing_middleware);
    cli.hook(HookPhase::BeforeRun, |_ctx| {
        log::debug!("run starting");
        Ok(())
    });
    install_plugins(&mut cli)?;
    Ok(cli)
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match build_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match cli.run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
