//! Engine Process Spawning
//!
//! Launches the engine executable with piped stdin/stdout and starts the
//! background task that forwards stdout into the channel.

use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStdout, Command};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use super::channel::{ProcessChannel, StreamEvent};
use crate::config::EngineCommand;
use crate::error::{Error, Result};
use crate::models::EngineProcess;

/// Read buffer for the stdout pump
const READ_BUFFER_SIZE: usize = 8192;

/// Spawn an engine process
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns [`Error::SpawnFailed`] if the executable is missing, not runnable,
/// or its standard streams cannot be captured.
pub async fn spawn_engine(command: &EngineCommand) -> Result<(EngineProcess, ProcessChannel)> {
    let program = command.path.to_string_lossy().to_string();
    let spawn_failed = |reason: String| Error::SpawnFailed {
        command: program.clone(),
        reason,
    };

    let mut child = Command::new(&command.path)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_failed(e.to_string()))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| spawn_failed("stdin was not captured".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| spawn_failed("stdout was not captured".to_string()))?;

    let pid = child.id();
    let mut process = EngineProcess::new(program.clone(), command.args.clone());
    process.mark_spawned(pid);
    info!("Spawned engine '{}' (pid {:?})", program, pid);

    let (tx, rx) = unbounded_channel();
    tokio::spawn(pump_output(program.clone(), stdout, tx));

    let channel = ProcessChannel::from_parts(program, stdin, rx).with_child(child);
    Ok((process, channel))
}

/// Forward engine stdout into the channel until EOF, error, or the
/// receiving side goes away
async fn pump_output(label: String, mut stdout: ChildStdout, tx: UnboundedSender<StreamEvent>) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut pending = Vec::new();

    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => {
                debug!("[{}] stdout EOF - engine terminated", label);
                if !pending.is_empty() {
                    let tail = String::from_utf8_lossy(&pending).into_owned();
                    let _ = tx.send(StreamEvent::Output(tail));
                }
                let _ = tx.send(StreamEvent::Exited);
                break;
            }
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let chunk = decode_utf8(&mut pending);
                if chunk.is_empty() {
                    continue;
                }
                if tx.send(StreamEvent::Output(chunk)).is_err() {
                    debug!("[{}] receiver dropped, stopping output pump", label);
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("[{}] stdout read error ({}): {}", label, e.kind(), e);
                let _ = tx.send(StreamEvent::Error(e.to_string()));
                break;
            }
        }
    }
    trace!("[{}] output pump exiting", label);
}

/// Decode as much of `pending` as possible, leaving an incomplete trailing
/// UTF-8 sequence in place for the next read
///
/// Invalid bytes become U+FFFD.
fn decode_utf8(pending: &mut Vec<u8>) -> String {
    let mut text = String::new();
    let mut start = 0;

    while start < pending.len() {
        match std::str::from_utf8(&pending[start..]) {
            Ok(valid) => {
                text.push_str(valid);
                start = pending.len();
            }
            Err(e) => {
                let end = start + e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[start..end]));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        start = end + len;
                    }
                    None => {
                        start = end;
                        break;
                    }
                }
            }
        }
    }

    pending.drain(..start);
    text
}
