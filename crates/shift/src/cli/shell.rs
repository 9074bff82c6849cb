//! Interactive shell, used when no subcommand is given.

use std::future::Future;

use anyhow::Result;
use clap::Parser;
use dialoguer::Input;

use super::command::Commands;
use super::output;

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(name = "shift", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug)]
pub(crate) enum ShellInput {
    Empty,
    Exit,
    Command(Commands),
    Invalid(clap::Error),
}

pub(crate) fn parse_line(line: &str) -> ShellInput {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => ShellInput::Empty,
        ["exit"] | ["quit"] => ShellInput::Exit,
        _ => match ShellLine::try_parse_from(words) {
            Ok(parsed) => ShellInput::Command(parsed.command),
            Err(e) => ShellInput::Invalid(e),
        },
    }
}

/// Read commands until `exit` or end of input.
///
/// A failing command is reported and the shell keeps going.
pub async fn run<F, Fut>(dispatch: F) -> Result<()>
where
    F: Fn(Commands) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    println!("Shift interactive shell. Type 'help' for commands, 'exit' to quit.");

    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("shift")
                .allow_empty(true)
                .interact_text()
        })
        .await?;

        // Ctrl-D or a closed terminal ends the session
        let Ok(line) = line else {
            break;
        };

        match parse_line(&line) {
            ShellInput::Empty => continue,
            ShellInput::Exit => break,
            ShellInput::Invalid(e) => {
                e.print().ok();
            }
            ShellInput::Command(command) => {
                if let Err(e) = dispatch(command).await {
                    output::failure(format_args!("{:#}", e));
                }
            }
        }
    }

    Ok(())
}
