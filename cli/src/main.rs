//! CLI / REPL for evaluating math language programs.

use anyhow::Context;
use clap::Parser;

use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process,
};

use mathlang::Session;

mod repl;

const ABOUT: &str = "CLI and REPL for a small expression-oriented math language \
    with vectors, matrices and user-defined functions.";

const AFTER_HELP: &str = "\
EXIT CODES:
    0    Normal exit
    1    Invalid command-line option
    2    Evaluation error in non-interactive mode";

const ERROR_EXIT_CODE: i32 = 2;

#[derive(Debug, Parser)]
#[command(about = ABOUT, after_help = AFTER_HELP, version)]
struct Args {
    /// Launch the interactive REPL.
    #[arg(long, short = 'i', conflicts_with_all = ["file", "command"])]
    interactive: bool,
    /// Read the program from the given file.
    #[arg(long, short = 'f', conflicts_with = "command")]
    file: Option<PathBuf>,
    /// Program to evaluate. If omitted, the program is read from stdin.
    command: Option<String>,
}

impl Args {
    fn run(self) -> anyhow::Result<()> {
        if self.interactive {
            return repl::repl();
        }

        let source = if let Some(path) = &self.file {
            fs::read_to_string(path)
                .with_context(|| format!("cannot read program from `{}`", path.display()))?
        } else if let Some(command) = self.command {
            command
        } else {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("cannot read program from stdin")?;
            buffer
        };

        let mut session = Session::new();
        let response = session.evaluate(&source);
        for output in &response.outputs {
            println!("{output}");
        }
        for error in &response.errors {
            eprintln!("error: {error}");
        }
        if !response.errors.is_empty() {
            process::exit(ERROR_EXIT_CODE);
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    Args::parse().run()
}
