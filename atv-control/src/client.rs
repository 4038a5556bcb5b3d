//! Gated access to one device
//!
//! [`GatedChannel`] binds a control channel to a device target and routes
//! every call through the [`CommandGate`]. A non-zero exit code becomes
//! [`ControlError::CommandFailed`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::channel::{DeviceControlChannel, DeviceTarget, ExitCode, PAIR_COMMAND, STATUS_COMMAND};
use crate::error::{ControlError, Result};
use crate::gate::CommandGate;

/// Repeat modes understood by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatMode {
    Off = 0,
    Track = 1,
    All = 2,
}

impl RepeatMode {
    /// Parse `off|track|all` or `0|1|2`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(RepeatMode::Off),
            "track" | "1" => Some(RepeatMode::Track),
            "all" | "2" => Some(RepeatMode::All),
            _ => None,
        }
    }
}

/// Control channel bound to a device, serialized by a gate
pub struct GatedChannel {
    gate: CommandGate,
    channel: Arc<dyn DeviceControlChannel>,
    target: DeviceTarget,
}

impl GatedChannel {
    pub fn new(channel: Arc<dyn DeviceControlChannel>, target: DeviceTarget, gate: CommandGate) -> Self {
        Self {
            gate,
            channel,
            target,
        }
    }

    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    pub fn gate(&self) -> &CommandGate {
        &self.gate
    }

    /// Ask the device for its playback status
    ///
    /// The status itself arrives asynchronously as device events.
    pub fn fetch_status(&self) -> Result<()> {
        self.run(vec![STATUS_COMMAND.to_string()])
    }

    /// Send one or more remote key presses
    pub fn send_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        let tokens: Vec<String> = keys
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if tokens.is_empty() {
            debug!("No keys to send to {}", self.target);
            return Ok(());
        }
        self.run(tokens)
    }

    /// Seek to an absolute position in seconds
    pub fn set_position(&self, seconds: u64) -> Result<()> {
        self.run(vec![format!("set_position={}", seconds)])
    }

    pub fn set_shuffle(&self, enabled: bool) -> Result<()> {
        let flag = if enabled { "True" } else { "False" };
        self.run(vec![format!("set_shuffle={}", flag)])
    }

    pub fn set_repeat(&self, mode: RepeatMode) -> Result<()> {
        self.run(vec![format!("set_repeat={}", mode as u8)])
    }

    /// Pair as remote `remote_name` using the pin shown by the device
    ///
    /// The outcome arrives as `PairingResult` and `GeneratedDeviceId` events.
    pub fn pair(&self, remote_name: &str, pin: &str) -> Result<()> {
        self.run(vec![
            "--remote-name".to_string(),
            remote_name.to_string(),
            "--pin".to_string(),
            pin.to_string(),
            PAIR_COMMAND.to_string(),
        ])
    }

    /// Scan the network; results arrive as a `DevicesDiscovered` event
    pub fn scan(&self, timeout: Duration) -> Result<()> {
        let code = self.gate.run(|| self.channel.scan(timeout))??;
        check_exit("scan", code)
    }

    fn run(&self, tokens: Vec<String>) -> Result<()> {
        let code = self.gate.run(|| {
            self.channel
                .execute(&tokens, &self.target.address, &self.target.login_id)
        })??;
        check_exit(&tokens.join(" "), code)
    }
}

fn check_exit(command: &str, code: ExitCode) -> Result<()> {
    if code.is_success() {
        debug!("Command '{}' completed", command);
        Ok(())
    } else {
        warn!("Command '{}' exited with {}", command, code);
        Err(ControlError::CommandFailed {
            command: command.to_string(),
            code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct ScriptedChannel {
        calls: Mutex<Vec<Vec<String>>>,
        exit: i32,
    }

    impl ScriptedChannel {
        fn new(exit: i32) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                exit,
            })
        }
    }

    impl DeviceControlChannel for ScriptedChannel {
        fn execute(&self, tokens: &[String], address: &str, login_id: &str) -> Result<ExitCode> {
            assert_eq!((address, login_id), ("10.0.0.5", "0xABC"));
            self.calls.lock().push(tokens.to_vec());
            Ok(ExitCode(self.exit))
        }

        fn scan(&self, _timeout: Duration) -> Result<ExitCode> {
            self.calls.lock().push(vec!["scan".to_string()]);
            Ok(ExitCode(self.exit))
        }
    }

    fn gated(channel: Arc<ScriptedChannel>) -> GatedChannel {
        GatedChannel::new(channel, DeviceTarget::new("10.0.0.5", "0xABC"), CommandGate::new())
    }

    #[test]
    fn test_command_tokens() {
        let channel = ScriptedChannel::new(0);
        let client = gated(Arc::clone(&channel));

        client.fetch_status().unwrap();
        client.send_keys(&["up", " ", "select"]).unwrap();
        client.set_position(754).unwrap();
        client.set_shuffle(true).unwrap();
        client.set_repeat(RepeatMode::All).unwrap();
        client.pair("living-room", "1234").unwrap();
        client.scan(Duration::from_secs(3)).unwrap();

        assert_eq!(
            *channel.calls.lock(),
            vec![
                vec!["playing".to_string()],
                vec!["up".to_string(), "select".to_string()],
                vec!["set_position=754".to_string()],
                vec!["set_shuffle=True".to_string()],
                vec!["set_repeat=2".to_string()],
                ["--remote-name", "living-room", "--pin", "1234", "pair"]
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>(),
                vec!["scan".to_string()],
            ]
        );
    }

    #[test]
    fn test_empty_key_list_is_not_sent() {
        let channel = ScriptedChannel::new(0);
        let client = gated(Arc::clone(&channel));
        client.send_keys::<&str>(&[]).unwrap();
        assert!(channel.calls.lock().is_empty());
    }

    #[test]
    fn test_non_zero_exit_is_failure() {
        let client = gated(ScriptedChannel::new(1));
        match client.set_position(10) {
            Err(ControlError::CommandFailed { command, code }) => {
                assert_eq!(command, "set_position=10");
                assert_eq!(code, ExitCode(1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_busy_gate_skips_device_call() {
        let channel = ScriptedChannel::new(0);
        let client = GatedChannel::new(
            Arc::clone(&channel) as Arc<dyn DeviceControlChannel>,
            DeviceTarget::new("10.0.0.5", "0xABC"),
            CommandGate::with_timeout(Duration::from_millis(10)),
        );

        let result = client.gate().run(|| client.fetch_status()).unwrap();
        assert!(matches!(result, Err(ControlError::Gate(_))));
        assert!(result.unwrap_err().is_transient());
        assert!(channel.calls.lock().is_empty());
    }

    #[test]
    fn test_repeat_mode_parsing() {
        assert_eq!(RepeatMode::parse("Track"), Some(RepeatMode::Track));
        assert_eq!(RepeatMode::parse("0"), Some(RepeatMode::Off));
        assert_eq!(RepeatMode::parse(" all "), Some(RepeatMode::All));
        assert_eq!(RepeatMode::parse("sometimes"), None);
    }
}
