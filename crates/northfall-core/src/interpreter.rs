use crate::dispatch::JobDispatcher;
use crate::grammar::{self, Command};
use crate::history::CommandHistory;
use crate::job::{BackendCommand, JobContext};
use crate::log::{LogLine, TerminalLog};
use tracing::{debug, info};

/// How a single submission was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank input: nothing recorded.
    Idle,
    /// `clear` emptied the log.
    Cleared,
    /// A local command printed its static response.
    Responded(Command),
    /// An action command printed its response and submitted a job.
    Dispatched {
        command: Command,
        backend: BackendCommand,
        job_id: String,
    },
    /// Input outside the vocabulary.
    NotFound(String),
}

/// Resolves one raw input line at a time against the command grammar.
///
/// Holds no per-session state of its own; the history and log it mutates
/// are passed in on every call.
pub struct Interpreter<D> {
    dispatcher: D,
    context: JobContext,
}

impl<D: JobDispatcher> Interpreter<D> {
    pub fn new(dispatcher: D, context: JobContext) -> Self {
        Self {
            dispatcher,
            context,
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Total over all inputs: every string resolves to exactly one
    /// [`Outcome`] and nothing is returned as an error.
    pub fn handle_command(
        &self,
        raw: &str,
        history: &mut CommandHistory,
        log: &mut TerminalLog,
    ) -> Outcome {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Outcome::Idle;
        }

        history.append(trimmed);

        let Some(command) = Command::lookup(trimmed) else {
            debug!(input = %trimmed, "unrecognized command");
            log.append(LogLine::error(trimmed));
            log.append(LogLine::error(grammar::not_found_message(trimmed)));
            return Outcome::NotFound(trimmed.to_string());
        };

        log.append(LogLine::command(trimmed));

        if command == Command::Clear {
            log.replace_all(Vec::new());
            debug!("terminal cleared");
            return Outcome::Cleared;
        }

        log.append(LogLine::client(command.response()));

        match command.backend_command() {
            None => {
                debug!(command = %command, "local command answered");
                Outcome::Responded(command)
            }
            Some(backend) => {
                let payload = self.context.payload(backend);
                let job_id = payload.job_id.clone();
                info!(job_id = %job_id, command = %backend, "dispatching job");
                self.dispatcher.send(payload);
                Outcome::Dispatched {
                    command,
                    backend,
                    job_id,
                }
            }
        }
    }
}
