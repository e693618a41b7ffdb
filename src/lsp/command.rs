//! The run-scenario command
//!
//! Scenarios run inside a single reusable shell session named `crank`. The
//! session is spawned on first use and forgotten once its process exits, so
//! the next run spawns a fresh one.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

pub const RUN_SCENARIO_COMMAND: &str = "crankScenarioLanguage.runScenario";
pub const TERMINAL_NAME: &str = "crank";
pub const DEFAULT_RUNNER: &str = "crank";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start shell {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },
    #[error("shell session {name} is not accepting input: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing scenario file argument")]
    MissingPath,
}

/// Filesystem path for the command's file argument.
///
/// Accepts a URI string or an object with `fsPath` or `path`. `file:` URIs
/// become local paths; anything else is used as given.
pub fn scenario_path(argument: &serde_json::Value) -> Result<String, CommandError> {
    let raw = match argument {
        serde_json::Value::String(s) => s.as_str(),
        serde_json::Value::Object(map) => map
            .get("fsPath")
            .or_else(|| map.get("path"))
            .and_then(serde_json::Value::as_str)
            .ok_or(CommandError::MissingPath)?,
        _ => return Err(CommandError::MissingPath),
    };
    if raw.is_empty() {
        return Err(CommandError::MissingPath);
    }

    match url::Url::parse(raw) {
        Ok(uri) if uri.scheme() == "file" => Ok(uri
            .to_file_path()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|()| uri.path().to_string())),
        _ => Ok(raw.to_string()),
    }
}

/// Output and lifecycle notifications from shell sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Output { session: u64, line: String },
    Closed { session: u64 },
}

#[async_trait]
pub trait ShellSession: Send {
    /// Unique per spawned session.
    fn id(&self) -> u64;

    fn name(&self) -> &str;

    /// Sends one line of input, as if typed and followed by enter.
    async fn send_text(&mut self, text: &str) -> Result<(), CommandError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self, name: &str) -> Result<Box<dyn ShellSession>, CommandError>;
}

/// Owns the optional `crank` session.
pub struct TerminalManager {
    factory: Box<dyn SessionFactory>,
    session: Mutex<Option<Box<dyn ShellSession>>>,
    runner: String,
}

impl TerminalManager {
    pub fn new(factory: Box<dyn SessionFactory>, runner: impl Into<String>) -> Self {
        Self {
            factory,
            session: Mutex::new(None),
            runner: runner.into(),
        }
    }

    pub fn runner(&self) -> &str {
        &self.runner
    }

    pub fn run_command_line(&self, path: &str) -> String {
        format!("{} run {}", self.runner, quote_path(path))
    }

    /// Clears the session and runs the scenario at `path` in it.
    pub async fn run_scenario(&self, path: &str) -> Result<(), CommandError> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let session = self.factory.create(TERMINAL_NAME).await?;
            info!("Created shell session {} ({})", session.name(), session.id());
            *guard = Some(session);
        }

        let Some(session) = guard.as_mut() else {
            return Ok(());
        };

        let sent = match session.send_text("clear").await {
            Ok(()) => session.send_text(&self.run_command_line(path)).await,
            Err(e) => Err(e),
        };
        if sent.is_err() {
            warn!("Dropping unusable shell session {}", session.id());
            *guard = None;
        }
        sent
    }

    /// Forgets the session if it is the one that closed.
    pub async fn on_session_closed(&self, id: u64) {
        let mut guard = self.session.lock().await;
        if guard.as_ref().is_some_and(|s| s.id() == id) {
            debug!("Shell session {} closed", id);
            *guard = None;
        }
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }
}

impl std::fmt::Debug for TerminalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalManager")
            .field("runner", &self.runner)
            .finish()
    }
}

/// Quotes `path` as a single shell word. Paths made only of characters that
/// no shell treats specially are left as they are.
fn quote_path(path: &str) -> String {
    let plain = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/\\._-:+,@=".contains(c));
    if plain {
        path.to_string()
    } else if cfg!(windows) {
        format!("\"{}\"", path.replace('"', "\"\""))
    } else {
        format!("'{}'", path.replace('\'', "'\\''"))
    }
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Spawns the user's shell with piped stdio. Output lines and process exit
/// are reported on `events`.
pub struct ProcessShellFactory {
    shell: String,
    events: mpsc::UnboundedSender<ShellEvent>,
}

impl ProcessShellFactory {
    pub fn new(events: mpsc::UnboundedSender<ShellEvent>) -> Self {
        Self {
            shell: default_shell(),
            events,
        }
    }

    pub fn with_shell(shell: impl Into<String>, events: mpsc::UnboundedSender<ShellEvent>) -> Self {
        Self {
            shell: shell.into(),
            events,
        }
    }
}

fn default_shell() -> String {
    let var = if cfg!(windows) { "COMSPEC" } else { "SHELL" };
    std::env::var(var)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| if cfg!(windows) { "cmd".to_string() } else { "sh".to_string() })
}

fn forward_lines<R>(reader: R, session: u64, events: mpsc::UnboundedSender<ShellEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if events.send(ShellEvent::Output { session, line }).is_err() {
                break;
            }
        }
    });
}

#[async_trait]
impl SessionFactory for ProcessShellFactory {
    async fn create(&self, name: &str) -> Result<Box<dyn ShellSession>, CommandError> {
        let mut child = Command::new(&self.shell)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst);

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, id, self.events.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, id, self.events.clone());
        }
        let stdin = child.stdin.take();

        let events = self.events.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("Shell session {} exited with {}", id, status),
                Err(e) => warn!("Failed to wait for shell session {}: {}", id, e),
            }
            let _ = events.send(ShellEvent::Closed { session: id });
        });

        Ok(Box::new(ProcessShell {
            id,
            name: name.to_string(),
            stdin,
        }))
    }
}

struct ProcessShell {
    id: u64,
    name: String,
    stdin: Option<ChildStdin>,
}

#[async_trait]
impl ShellSession for ProcessShell {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn send_text(&mut self, text: &str) -> Result<(), CommandError> {
        let write_error = |source| CommandError::Write {
            name: self.name.clone(),
            source,
        };
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))
        })?;
        stdin.write_all(format!("{}\n", text).as_bytes()).await.map_err(write_error)?;
        stdin.flush().await.map_err(write_error)
    }
}
