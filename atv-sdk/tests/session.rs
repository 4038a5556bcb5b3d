//! DeviceSession behavior against a recording control channel

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use atv_control::ControlError;
use atv_sdk::{
    ChannelMap, ChannelStateSink, DeviceControlChannel, DeviceEvent, DeviceSession, ExitCode,
    PropertyKey, SdkError, SessionConfig, StatusCallback,
};
use atv_state::PositionError;

/// Records every command; optionally answers `playing` with status events
struct FakeDevice {
    commands: Mutex<Vec<String>>,
    exit: Mutex<i32>,
    events: Mutex<Option<mpsc::Sender<DeviceEvent>>>,
}

impl FakeDevice {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            exit: Mutex::new(0),
            events: Mutex::new(None),
        })
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

impl DeviceControlChannel for FakeDevice {
    fn execute(&self, tokens: &[String], _address: &str, _login_id: &str) -> Result<ExitCode, ControlError> {
        let command = tokens.join(" ");
        if command == "playing" {
            if let Some(events) = self.events.lock().as_ref() {
                events.send(DeviceEvent::status("state", "Playing")).ok();
                events.send(DeviceEvent::status("title", "Come Together")).ok();
            }
        }
        self.commands.lock().push(command);
        Ok(ExitCode(*self.exit.lock()))
    }

    fn scan(&self, _timeout: Duration) -> Result<ExitCode, ControlError> {
        self.commands.lock().push("scan".to_string());
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().clone()
    }
}

impl ChannelStateSink for RecordingSink {
    fn publish(&self, channel_id: &str, value: &str) {
        self.updates.lock().push((channel_id.to_string(), value.to_string()));
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        key_movie: "top_menu select".to_string(),
        update_interval: 10,
        skip_count: 1000,
        ..SessionConfig::new("192.168.1.20", "0x4A2B")
    }
}

fn session() -> (DeviceSession, Arc<FakeDevice>, Arc<RecordingSink>) {
    let device = FakeDevice::new();
    let sink = Arc::new(RecordingSink::default());
    let session = DeviceSession::new(
        config(),
        Arc::clone(&device) as Arc<dyn DeviceControlChannel>,
        Arc::clone(&sink) as Arc<dyn ChannelStateSink>,
    )
    .unwrap();
    (session, device, sink)
}

#[test]
fn test_relative_seek_uses_current_position() {
    let (session, device, _sink) = session();
    session.handle_status_event("position", "100");

    session.handle_command("playStatus#position", "+30").unwrap();
    assert_eq!(device.commands(), vec!["set_position=130"]);
    assert_eq!(session.pending_updates(), 3);
}

#[test]
fn test_backward_seek_clamps_at_zero() {
    let (session, device, _sink) = session();
    session.handle_status_event("totalTime", "500");
    session.handle_status_event("position", "100");

    session.handle_command("playStatus#position", "-150").unwrap();
    assert_eq!(device.commands(), vec!["set_position=0"]);
}

#[test]
fn test_percentage_seek_without_total_sends_nothing() {
    let (session, device, _sink) = session();

    let result = session.handle_command("playStatus#position", "50%");
    assert!(matches!(
        result,
        Err(SdkError::Position(PositionError::PositionUnknown(_)))
    ));
    assert!(device.commands().is_empty());
    assert_eq!(session.pending_updates(), 0);
}

#[test]
fn test_percentage_seek_with_total() {
    let (session, device, _sink) = session();
    session.handle_status_event("totalTime", "200");

    session.handle_command("playStatus#position", "50%").unwrap();
    assert_eq!(device.commands(), vec!["set_position=100"]);
}

#[test]
fn test_unparseable_seek_is_rejected() {
    let (session, device, _sink) = session();

    let result = session.handle_command("playStatus#position", "soon");
    assert!(matches!(result, Err(SdkError::Position(PositionError::Format(_)))));
    assert!(device.commands().is_empty());
}

#[test]
fn test_key_alias_and_toggles() {
    let (session, device, _sink) = session();

    session.handle_command("control#keysSequence", "movie").unwrap();
    session.handle_command("playStatus#shuffle", "on").unwrap();
    session.handle_command("playStatus#repeatState", "all").unwrap();

    assert_eq!(
        device.commands(),
        vec!["top_menu select", "set_shuffle=True", "set_repeat=2"]
    );
    assert_eq!(session.pending_updates(), 9);
}

#[test]
fn test_refresh_only_queues_polls() {
    let (session, device, _sink) = session();

    session.handle_command("mediaInformation#title", "REFRESH").unwrap();
    assert!(device.commands().is_empty());
    assert_eq!(session.pending_updates(), 3);
}

#[test]
fn test_failed_command_leaves_budget_alone() {
    let (session, device, _sink) = session();
    *device.exit.lock() = 1;

    let result = session.handle_command("control#remoteKey", "select");
    assert!(matches!(
        result,
        Err(SdkError::Control(ControlError::CommandFailed { .. }))
    ));
    assert_eq!(session.pending_updates(), 0);
}

#[test]
fn test_status_events_are_published_once() {
    let (session, _device, sink) = session();

    session.handle_status_event("title", "Come Together");
    session.handle_status_event("title", "Come Together");
    session.handle_status_event("volume", "30");

    assert_eq!(
        sink.updates(),
        vec![("mediaInformation#title".to_string(), "Come Together".to_string())]
    );
    assert_eq!(session.status(PropertyKey::Title), "Come Together");
}

#[test]
fn test_media_type_change_resets_music_metadata() {
    let (session, _device, sink) = session();
    session.handle_status_event("mediaType", "Music");
    session.handle_status_event("artist", "The Beatles");
    session.handle_status_event("album", "Abbey Road");
    session.handle_status_event("genre", "Rock");
    let before = sink.updates().len();

    session.handle_status_event("mediaType", "Video");
    assert_eq!(sink.updates().len() - before, 4);

    session.handle_status_event("mediaType", "Video");
    assert_eq!(sink.updates().len() - before, 4);
}

#[test]
fn test_play_state_change_requests_follow_up_poll() {
    let (session, _device, _sink) = session();
    session.handle_status_event("state", "Playing");
    assert_eq!(session.pending_updates(), 1);
    session.handle_status_event("state", "Playing");
    assert_eq!(session.pending_updates(), 1);
}

#[test]
fn test_results_after_shutdown_are_dropped() {
    let (session, device, sink) = session();
    session.shutdown();
    session.shutdown();

    session.handle_status_event("title", "Late");
    assert!(sink.updates().is_empty());
    assert!(matches!(
        session.handle_command("control#remoteKey", "select"),
        Err(SdkError::TornDown)
    ));
    assert!(device.commands().is_empty());
}

#[test]
fn test_device_events_are_recorded() {
    let (session, _device, _sink) = session();

    session.on_pairing_result(true, "Paired");
    session.on_device_id("0xFEED");
    session.on_devices_discovered(
        r#"{"devices":[{"name":"Den","ipAddress":"192.168.1.20","loginId":"0x4A2B"}]}"#,
    );
    session.on_devices_discovered("garbage");

    assert!(session.pairing_result().unwrap().success);
    assert_eq!(session.device_id().as_deref(), Some("0xFEED"));
    let devices = session.discovered_devices().unwrap();
    assert_eq!(devices.find_by_address("192.168.1.20").unwrap().name, "Den");
}

#[test]
fn test_pair_uses_configured_remote_name() {
    let (session, device, _sink) = session();

    session.pair(" 1234 ").unwrap();
    assert_eq!(device.commands(), vec!["--remote-name atv-sdk --pin 1234 pair"]);
    assert_eq!(session.pending_updates(), 0);
}

#[test]
fn test_invalid_pin_is_not_sent() {
    let (session, device, _sink) = session();

    for pin in ["", "12a4", "-1234"] {
        assert!(matches!(session.pair(pin), Err(SdkError::InvalidPin(_))));
    }
    assert!(device.commands().is_empty());
}

#[test]
fn test_rejected_pairing_returns_command_failed() {
    let (session, device, _sink) = session();
    *device.exit.lock() = 1;

    assert!(matches!(
        session.pair("0000"),
        Err(SdkError::Control(ControlError::CommandFailed { .. }))
    ));
}

#[test]
fn test_concurrent_events_and_seeks_keep_mirror_consistent() {
    let (session, device, sink) = session();
    let session = Arc::new(session);

    let check = |session: &DeviceSession| {
        let pos = session.position();
        assert!(
            pos.total_time() == 0 || pos.position() <= pos.total_time(),
            "position {} beyond total {}",
            pos.position(),
            pos.total_time()
        );
    };

    let mut workers = Vec::new();
    for i in 0..4u64 {
        let session = Arc::clone(&session);
        workers.push(thread::spawn(move || {
            for n in 0..200u64 {
                if n % 3 == 0 {
                    session.handle_status_event("totalTime", &(100 + (n * 7 + i * 50) % 300).to_string());
                } else {
                    session.handle_status_event("position", &((n * 13 + i * 31) % 500).to_string());
                }
                check(&session);
            }
        }));
    }
    for request in ["+5", "-5"] {
        let session = Arc::clone(&session);
        workers.push(thread::spawn(move || {
            for _ in 0..100 {
                session.handle_command("playStatus#position", request).unwrap();
                check(&session);
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }

    check(&session);
    assert_eq!(device.commands().len(), 200);

    // The last value each channel received is what the mirror holds
    let mut last: HashMap<String, String> = HashMap::new();
    for (channel, value) in sink.updates() {
        last.insert(channel, value);
    }
    let channels = ChannelMap::default();
    assert!(last.contains_key("playStatus#position"));
    for (channel, value) in &last {
        let key = channels.property_for(channel).unwrap();
        assert_eq!(&session.status(key), value, "channel {}", channel);
    }
}

#[test]
fn test_unknown_channel_is_rejected() {
    let (session, device, _sink) = session();
    assert!(matches!(
        session.handle_command("audio#volume", "10"),
        Err(SdkError::UnknownChannel(_))
    ));
    assert!(device.commands().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_started_session_converges() {
    let device = FakeDevice::new();
    let sink = Arc::new(RecordingSink::default());
    let (events_tx, events_rx) = mpsc::channel();
    *device.events.lock() = Some(events_tx);

    let session = Arc::new(
        DeviceSession::new(
            config(),
            Arc::clone(&device) as Arc<dyn DeviceControlChannel>,
            Arc::clone(&sink) as Arc<dyn ChannelStateSink>,
        )
        .unwrap(),
    );
    let pump = session.spawn_event_pump(events_rx);
    session.start().unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    session.shutdown();

    assert!(device.commands().iter().any(|c| c == "playing"));
    assert_eq!(session.status(PropertyKey::State), "Playing");
    assert!(sink
        .updates()
        .contains(&("mediaInformation#title".to_string(), "Come Together".to_string())));

    // Closing the event stream ends the pump
    device.events.lock().take();
    pump.join().unwrap();
}
