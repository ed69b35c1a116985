//! Scripted [`Executor`] shared by unit tests.
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::cancel::CancelToken;
use crate::error::ExecError;
use crate::exec::{CommandSpec, ExecResult, Executor};

/// Canned outcome for one command line.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    Fail(String),
    Timeout,
}

/// Executor answering from a script keyed by rendered command line.
///
/// Replies queued for the same command are consumed in order; the last one
/// sticks. Unscripted commands fail with exit code 1.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    on_path: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, command: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(self, command: &str, stdout: &str) -> Self {
        self.reply(command, Reply::Ok(stdout.to_string()))
    }

    pub fn fail(self, command: &str, stderr: &str) -> Self {
        self.reply(command, Reply::Fail(stderr.to_string()))
    }

    pub fn on_path(self, program: &str) -> Self {
        self.on_path.lock().unwrap().insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| *c == command).count()
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ExecResult, ExecError> {
        cancel.check()?;
        let command = spec.to_string();
        self.calls.lock().unwrap().push(command.clone());
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&command) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Ok(stdout)) => Ok(ExecResult {
                stdout,
                stderr: String::new(),
                code: Some(0),
            }),
            Some(Reply::Fail(output)) => Err(ExecError::Failed {
                command,
                code: 1,
                output,
            }),
            Some(Reply::Timeout) => Err(ExecError::Timeout { command }),
            None => Err(ExecError::Failed {
                command: command.clone(),
                code: 1,
                output: format!("unscripted: {command}"),
            }),
        }
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.on_path
            .lock()
            .unwrap()
            .contains(program)
            .then(|| PathBuf::from(program))
    }
}
