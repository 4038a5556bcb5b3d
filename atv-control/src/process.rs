//! `atvremote` process channel
//!
//! Runs the `atvremote` command line tool for every device command and turns
//! its output into [`DeviceEvent`]s:
//!
//! - `playing` output becomes one `Status` event per reported property
//! - `scan` output becomes a `DevicesDiscovered` JSON document
//! - stderr of a failed command becomes a `Log` event
//! - `pair` output becomes a `PairingResult`, plus the pairing guid as a
//!   `GeneratedDeviceId` on success
//!
//! Every invocation runs under a deadline. A process that outlives it is
//! killed and the call fails with `ChannelUnavailable`, so a hung tool never
//! keeps the command gate.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace, warn};
use wait_timeout::ChildExt;

use crate::channel::{DeviceControlChannel, ExitCode, PAIR_COMMAND, STATUS_COMMAND};
use crate::devices::DiscoveredDevices;
use crate::error::{ControlError, Result};
use crate::event::{DeviceEvent, LogLevel};

/// Default executable name, resolved through `PATH`
pub const DEFAULT_EXECUTABLE: &str = "atvremote";

/// Default limit for one `atvremote` run
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Control channel backed by the `atvremote` executable
pub struct AtvRemoteChannel {
    executable: PathBuf,
    events: mpsc::Sender<DeviceEvent>,
    command_timeout: Duration,
}

impl AtvRemoteChannel {
    pub fn new(executable: impl Into<PathBuf>, events: mpsc::Sender<DeviceEvent>) -> Self {
        Self {
            executable: executable.into(),
            events,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Kill runs that take longer than `timeout`
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    fn spawn(&self, args: &[String], deadline: Duration) -> Result<Output> {
        let unavailable = |e: std::io::Error| {
            ControlError::ChannelUnavailable(format!("{}: {}", self.executable.display(), e))
        };

        debug!("Running {} {}", self.executable.display(), args.join(" "));
        let mut child = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(unavailable)?;

        // Drain both pipes while waiting so a chatty process cannot block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = child.wait_timeout(deadline).map_err(unavailable)? else {
            if let Err(e) = child.kill() {
                trace!("Kill after timeout failed: {}", e);
            }
            let _ = child.wait();
            warn!(
                "{} {} timed out after {:?}",
                self.executable.display(),
                args.join(" "),
                deadline
            );
            return Err(ControlError::ChannelUnavailable(format!(
                "{} timed out after {:?}",
                self.executable.display(),
                deadline
            )));
        };

        Ok(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    fn emit(&self, event: DeviceEvent) {
        if self.events.send(event).is_err() {
            trace!("Device event receiver dropped");
        }
    }

    fn report_pairing(&self, code: ExitCode, output: &Output) {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = last_line(&stdout)
            .or_else(|| last_line(&stderr))
            .unwrap_or_default()
            .to_string();

        if code.is_success() {
            if let Some(id) = pairing_guid(&stdout) {
                self.emit(DeviceEvent::GeneratedDeviceId(id.to_string()));
            }
        }
        self.emit(DeviceEvent::PairingResult {
            success: code.is_success(),
            message,
        });
    }

    fn report_stderr(&self, output: &Output) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim();
        if !message.is_empty() {
            self.emit(DeviceEvent::Log {
                level: LogLevel::Warn,
                message: message.to_string(),
            });
        }
    }
}

impl DeviceControlChannel for AtvRemoteChannel {
    fn execute(&self, tokens: &[String], address: &str, login_id: &str) -> Result<ExitCode> {
        let mut args = vec!["--address".to_string(), address.to_string()];
        // Not yet paired devices have no login id
        if !login_id.is_empty() {
            args.extend(["--login_id".to_string(), login_id.to_string()]);
        }
        args.extend(tokens.iter().cloned());

        let output = self.spawn(&args, self.command_timeout)?;
        let code = exit_code(&output);

        if tokens.iter().any(|t| t == PAIR_COMMAND) {
            self.report_pairing(code, &output);
        } else if !code.is_success() {
            self.report_stderr(&output);
        } else if tokens.iter().any(|t| t == STATUS_COMMAND) {
            let stdout = String::from_utf8_lossy(&output.stdout);
            for (property, value) in parse_playing_output(&stdout) {
                self.emit(DeviceEvent::Status { property, value });
            }
        }
        Ok(code)
    }

    fn scan(&self, timeout: Duration) -> Result<ExitCode> {
        let seconds = timeout.as_secs().clamp(1, 10);
        let args = vec!["--scan-timeout".to_string(), seconds.to_string(), "scan".to_string()];

        // The scan itself may use up its whole window before printing anything
        let output = self.spawn(&args, self.command_timeout + Duration::from_secs(seconds))?;
        let code = exit_code(&output);
        if !code.is_success() {
            self.report_stderr(&output);
            return Ok(code);
        }

        let devices = DiscoveredDevices::from_scan_output(&String::from_utf8_lossy(&output.stdout));
        debug!("Scan found {} device(s)", devices.len());
        self.emit(DeviceEvent::DevicesDiscovered(devices.to_json()?));
        Ok(code)
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

/// First `0x`-prefixed hex token in pairing output
pub fn pairing_guid(output: &str) -> Option<&str> {
    output
        .split_whitespace()
        .map(|t| t.trim_end_matches(['.', ',', ')']))
        .find(|t| {
            t.len() > 2
                && t.starts_with("0x")
                && t[2..].chars().all(|c| c.is_ascii_hexdigit())
        })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(reader: JoinHandle<Vec<u8>>) -> Vec<u8> {
    reader.join().unwrap_or_default()
}

fn exit_code(output: &Output) -> ExitCode {
    // Killed by a signal: no code
    ExitCode(output.status.code().unwrap_or(-1))
}

/// Parse the report printed by `atvremote playing`
///
/// ```text
/// Media type: Music
/// Play state: Playing
///      Title: Song
///   Position: 12/240s (5.0%)
///     Repeat: Off
///    Shuffle: False
/// ```
///
/// Returns `(property, raw value)` pairs using the status property names.
pub fn parse_playing_output(output: &str) -> Vec<(String, String)> {
    let mut properties = Vec::new();
    let mut push = |property: &str, value: &str| {
        properties.push((property.to_string(), value.trim().to_string()));
    };

    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        match label.trim() {
            "Media type" => push("mediaType", value),
            "Play state" => push("state", value),
            "Title" => push("title", value),
            "Artist" => push("artist", value),
            "Album" => push("album", value),
            "Genre" => push("genre", value),
            "Repeat" => push("repeat", value),
            "Shuffle" => push("shuffle", value),
            "Total time" => push("totalTime", value.trim().trim_end_matches('s')),
            "Position" => {
                let value = value.trim();
                match value.split_once('/') {
                    Some((position, rest)) => {
                        push("position", position);
                        let (total, progress) = match rest.split_once('(') {
                            Some((total, progress)) => (total, Some(progress)),
                            None => (rest, None),
                        };
                        push("totalTime", total.trim().trim_end_matches('s'));
                        if let Some(progress) = progress {
                            push("progress", progress.trim().trim_end_matches(')'));
                        }
                    }
                    None => push("position", value.trim_end_matches('s')),
                }
            }
            other => trace!("Ignoring status line '{}'", other),
        }
    }
    properties
}
