//! Interactive REPL on top of a persistent evaluation session.

use rustyline::{error::ReadlineError, DefaultEditor};

use mathlang::Session;

pub(crate) fn repl() -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut session = Session::new();
    println!(
        "mathlang REPL v{}. Enter statements; Ctrl-C or Ctrl-D to exit.",
        env!("CARGO_PKG_VERSION")
    );

    loop {
        match editor.readline(">>> ") {
            Ok(line) => {
                editor.add_history_entry(&line)?;
                let response = session.evaluate(&line);
                for output in &response.outputs {
                    println!("{output}");
                }
                for error in &response.errors {
                    eprintln!("error: {error}");
                }
            }

            Err(ReadlineError::Interrupted) => {
                println!("Bye");
                break Ok(());
            }

            Err(ReadlineError::Eof) => {
                break Ok(());
            }

            Err(error) => break Err(error.into()),
        }
    }
}
