use crate::output::{print_lines, render_line};
use crate::transport;
use anyhow::Context;
use northfall_core::config::Config;
use northfall_core::dispatch::{
    completion_stream, job_queue, CompletionStream, JobDispatcher, NullDispatcher,
};
use northfall_core::interpreter::{Interpreter, Outcome};
use northfall_core::job::JobCompletionPayload;
use northfall_core::log::LogLine;
use northfall_core::session::TerminalSession;
use northfall_core::tabs::DEFAULT_TAB_NAME;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub fn run(root: &Path, offline: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let context = config.job_context();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        if offline {
            return repl(Interpreter::new(NullDispatcher, context), None).await;
        }

        let (dispatcher, queue) = job_queue();
        let (sender, completions) = completion_stream();
        let link = transport::spawn(config.server.url.clone(), queue, sender);
        let result = repl(Interpreter::new(dispatcher, context), Some(completions)).await;
        link.abort();
        result
    })
}

/// Read lines until EOF, printing what each one adds to the log. Completion
/// frames are printed as they arrive, between prompts.
async fn repl<D: JobDispatcher>(
    interpreter: Interpreter<D>,
    mut completions: Option<CompletionStream>,
) -> anyhow::Result<()> {
    let mut session = TerminalSession::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("Northfall terminal. Type --help for commands, Ctrl-D to exit.");
    prompt()?;

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                let mark = session.log().len();
                if session.submit(&line, &interpreter) == Outcome::Cleared {
                    // ANSI: clear screen, cursor home
                    print!("\x1b[2J\x1b[H");
                }
                print_lines(session.log().since(mark));
                prompt()?;
            }
            frame = next_completion(&mut completions) => match frame {
                Some(frame) => {
                    session.apply_completion(&frame);
                    println!("\r{}", render_line(&LogLine::from(&frame)));
                    prompt()?;
                }
                None => completions = None,
            },
        }
    }

    println!();
    Ok(())
}

async fn next_completion(stream: &mut Option<CompletionStream>) -> Option<JobCompletionPayload> {
    match stream {
        Some(s) => s.recv().await,
        None => std::future::pending().await,
    }
}

fn prompt() -> anyhow::Result<()> {
    print!("{DEFAULT_TAB_NAME} > ");
    std::io::stdout().flush()?;
    Ok(())
}
