// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scanner screen
//!
//! The screen is driven message by message against a fake camera backend,
//! a recording UI surface and a recording URI launcher.

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use upi_scanner::app::frame_processor::{
    DecodedPayload, FrameDecoder, ResultRouter, RouteAction, RouteEvent, StatsSnapshot,
};
use upi_scanner::app::platform::{
    PermissionAnswer, PermissionGate, PreviewSurface, UiSurface, UriLauncher,
};
use upi_scanner::app::{Flow, Message, PermissionState, Screen, ScreenParts, ScreenSettings};
use upi_scanner::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendManager, CameraBackendType,
    CameraDevice, CameraFrame, CameraStream, FrameSink, PixelFormat,
};
use upi_scanner::config::RouterPolicy;
use upi_scanner::errors::{DecodeResult, DispatchError};

// ===== Fakes =====

type Log = Arc<Mutex<Vec<String>>>;

struct FakeStream {
    device: CameraDevice,
    log: Log,
    running: bool,
}

impl CameraStream for FakeStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.running = false;
        let id = self.device.camera_id().unwrap_or("?").to_string();
        self.log.lock().unwrap().push(format!("stop:{}", id));
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

struct FakeBackend {
    cameras: Vec<CameraDevice>,
    log: Log,
    sinks: Arc<Mutex<Vec<FrameSink>>>,
    fail_open: bool,
}

impl CameraBackend for FakeBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Still
    }

    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.cameras.clone()
    }

    fn open_stream(
        &self,
        device: &CameraDevice,
        sink: FrameSink,
    ) -> BackendResult<Box<dyn CameraStream>> {
        if self.fail_open {
            return Err(BackendError::Busy("camera in use".to_string()));
        }
        let id = device.camera_id().unwrap_or("?").to_string();
        self.log.lock().unwrap().push(format!("open:{}", id));
        self.sinks.lock().unwrap().push(sink);
        Ok(Box::new(FakeStream {
            device: device.clone(),
            log: Arc::clone(&self.log),
            running: true,
        }))
    }
}

/// Decodes a frame's bytes as its text payload
struct TextDecoder;

impl FrameDecoder for TextDecoder {
    fn decode(&self, frame: CameraFrame) -> BoxFuture<'static, DecodeResult<Vec<DecodedPayload>>> {
        Box::pin(async move {
            let text = String::from_utf8_lossy(&frame.data).into_owned();
            Ok(vec![DecodedPayload::new(text)])
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UiEvent {
    Notify(String),
    Dialog(String, String),
    Menu(Vec<String>),
    Preview(bool),
}

#[derive(Clone, Default)]
struct RecordingSurface(Arc<Mutex<Vec<UiEvent>>>);

impl UiSurface for RecordingSurface {
    fn notify(&mut self, text: &str) {
        self.0.lock().unwrap().push(UiEvent::Notify(text.to_string()));
    }

    fn show_dialog(&mut self, title: &str, body: &str) {
        self.0
            .lock()
            .unwrap()
            .push(UiEvent::Dialog(title.to_string(), body.to_string()));
    }

    fn set_menu(&mut self, entries: &[String]) {
        self.0.lock().unwrap().push(UiEvent::Menu(entries.to_vec()));
    }

    fn set_preview_active(&mut self, active: bool) {
        self.0.lock().unwrap().push(UiEvent::Preview(active));
    }
}

struct NullPreview;

impl PreviewSurface for NullPreview {
    fn present(&self, _frame: &CameraFrame) {}
}

struct FakePermission {
    granted: bool,
    answer: PermissionAnswer,
}

impl PermissionGate for FakePermission {
    fn is_granted(&self) -> bool {
        self.granted
    }

    fn request(&mut self) -> PermissionAnswer {
        self.answer
    }

    fn record_answer(&mut self, granted: bool) {
        self.granted = granted;
    }
}

#[derive(Clone, Default)]
struct RecordingLauncher {
    launched: Log,
    fail: bool,
}

impl UriLauncher for RecordingLauncher {
    fn launch(&self, uri: &str) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::NoHandler {
                uri: uri.to_string(),
                reason: "no application registered".to_string(),
            });
        }
        self.launched.lock().unwrap().push(uri.to_string());
        Ok(())
    }
}

// ===== Harness =====

struct Setup {
    cameras: Vec<CameraDevice>,
    policy: RouterPolicy,
    permission: FakePermission,
    fail_open: bool,
    fail_launch: bool,
    settings: ScreenSettings,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            cameras: vec![camera("0")],
            policy: RouterPolicy::Dispatch,
            permission: FakePermission {
                granted: true,
                answer: PermissionAnswer::Granted,
            },
            fail_open: false,
            fail_launch: false,
            settings: ScreenSettings {
                repeat_suppression: Some(Duration::from_secs(3)),
                default_camera: None,
            },
        }
    }
}

struct Harness {
    // Field order matters: the screen must stop before the runtime goes away
    screen: Screen,
    rx: UnboundedReceiver<Message>,
    surface: RecordingSurface,
    launcher: RecordingLauncher,
    log: Log,
    sinks: Arc<Mutex<Vec<FrameSink>>>,
    _runtime: tokio::runtime::Runtime,
}

fn camera(id: &str) -> CameraDevice {
    CameraDevice::new(id, format!("Camera {}", id), format!("/dev/video{}", id))
}

fn text_frame(text: &str) -> CameraFrame {
    CameraFrame::packed(text.len() as u32, 1, PixelFormat::Gray8, text.as_bytes().to_vec())
}

impl Harness {
    fn new(setup: Setup) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let log: Log = Arc::default();
        let sinks = Arc::new(Mutex::new(Vec::new()));
        let backend = FakeBackend {
            cameras: setup.cameras,
            log: Arc::clone(&log),
            sinks: Arc::clone(&sinks),
            fail_open: setup.fail_open,
        };
        let surface = RecordingSurface::default();
        let launcher = RecordingLauncher {
            fail: setup.fail_launch,
            ..RecordingLauncher::default()
        };

        let parts = ScreenParts {
            manager: CameraBackendManager::new(Box::new(backend)),
            decoder: Arc::new(TextDecoder),
            router: ResultRouter::new(setup.policy, "upi://"),
            surface: Box::new(surface.clone()),
            preview: Arc::new(NullPreview),
            permission: Box::new(setup.permission),
            launcher: Box::new(launcher.clone()),
            settings: setup.settings,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let screen = Screen::new(parts, runtime.handle().clone(), tx).unwrap();

        Self {
            screen,
            rx,
            surface,
            launcher,
            log,
            sinks,
            _runtime: runtime,
        }
    }

    /// Create and show the screen
    fn start(&mut self) {
        assert_eq!(self.screen.update(Message::Created), Flow::Continue);
        assert_eq!(self.screen.update(Message::Resumed), Flow::Continue);
    }

    fn push_to_latest_sink(&self, text: &str) {
        let sink = self.sinks.lock().unwrap().last().cloned().unwrap();
        sink.push(text_frame(text));
    }

    /// Wait for the analyzer to report a result and apply it
    fn pump_routed(&mut self) -> RouteEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(message) = self.rx.try_recv() {
                let Message::Routed(event) = message.clone() else {
                    panic!("unexpected message {:?}", message);
                };
                self.screen.update(message);
                return event;
            }
            assert!(Instant::now() < deadline, "no routed result arrived");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn wait_for_stats(&self, condition: impl Fn(&StatsSnapshot) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition(&self.screen.analyzer().stats()) {
            assert!(Instant::now() < deadline, "analyzer never reached the expected state");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn events(&self) -> Vec<UiEvent> {
        self.surface.0.lock().unwrap().clone()
    }

    fn launched(&self) -> Vec<String> {
        self.launcher.launched.lock().unwrap().clone()
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn routed(&self, uri: &str) -> Message {
        Message::Routed(RouteEvent {
            binding: self.screen.active_binding().unwrap(),
            sequence: 0,
            action: RouteAction::Dispatch {
                uri: uri.to_string(),
            },
        })
    }
}

// ===== Tests =====

#[test]
fn test_upi_code_is_dispatched_verbatim() {
    let mut h = Harness::new(Setup::default());
    h.start();

    assert!(h.screen.is_bound());
    assert_eq!(h.log(), vec!["open:0"]);
    assert!(h.events().contains(&UiEvent::Menu(vec!["Camera ID 0".to_string()])));
    assert_eq!(h.events().last(), Some(&UiEvent::Preview(true)));

    let uri = "upi://pay?pa=merchant@bank&pn=Shop&am=12.50&cu=INR";
    h.push_to_latest_sink(uri);
    let event = h.pump_routed();

    assert_eq!(event.action, RouteAction::Dispatch { uri: uri.to_string() });
    assert_eq!(h.launched(), vec![uri]);
    assert!(h.events().contains(&UiEvent::Notify(uri.to_string())));
}

#[test]
fn test_missing_handler_is_reported() {
    let mut h = Harness::new(Setup {
        fail_launch: true,
        ..Setup::default()
    });
    h.start();

    h.push_to_latest_sink("upi://pay?pa=a@b");
    h.pump_routed();

    assert!(h.launched().is_empty());
    assert_eq!(
        h.events().last(),
        Some(&UiEvent::Notify("No UPI app found".to_string()))
    );
}

#[test]
fn test_plain_text_is_ignored_when_dispatching() {
    let mut h = Harness::new(Setup::default());
    h.start();

    h.push_to_latest_sink("hello world");
    h.wait_for_stats(|stats| stats.unmatched == 1);

    assert!(h.rx.try_recv().is_err());
    assert!(h.launched().is_empty());
    assert!(!h.events().iter().any(|e| matches!(e, UiEvent::Dialog(..))));
}

#[test]
fn test_display_policy_shows_text_verbatim() {
    let mut h = Harness::new(Setup {
        policy: RouterPolicy::Display,
        ..Setup::default()
    });
    h.start();

    h.push_to_latest_sink("hello world");
    h.pump_routed();

    assert_eq!(
        h.events().last(),
        Some(&UiEvent::Dialog(
            "Scanned code".to_string(),
            "hello world".to_string()
        ))
    );
    assert!(h.launched().is_empty());
}

#[test]
fn test_denied_permission_leaves_camera_unbound() {
    let mut h = Harness::new(Setup {
        permission: FakePermission {
            granted: false,
            answer: PermissionAnswer::Denied,
        },
        ..Setup::default()
    });
    h.start();

    assert_eq!(h.screen.permission_state(), PermissionState::Denied);
    assert!(!h.screen.is_bound());
    assert!(h.log().is_empty());
    assert!(h
        .events()
        .contains(&UiEvent::Notify("Camera permission denied".to_string())));
}

#[test]
fn test_prompt_answer_arrives_as_input() {
    let mut h = Harness::new(Setup {
        permission: FakePermission {
            granted: false,
            answer: PermissionAnswer::Pending,
        },
        ..Setup::default()
    });
    h.start();
    assert_eq!(h.screen.permission_state(), PermissionState::Pending);
    assert!(!h.screen.is_bound());

    h.screen.update(Message::Input("y".to_string()));

    assert_eq!(h.screen.permission_state(), PermissionState::Granted);
    assert!(h.screen.is_bound());
    assert_eq!(h.log(), vec!["open:0"]);
}

#[test]
fn test_retry_after_denial() {
    let mut h = Harness::new(Setup {
        permission: FakePermission {
            granted: false,
            answer: PermissionAnswer::Pending,
        },
        ..Setup::default()
    });
    h.start();
    h.screen.update(Message::Input("no".to_string()));
    assert_eq!(h.screen.permission_state(), PermissionState::Denied);

    h.screen.update(Message::Input("retry-permission".to_string()));
    assert_eq!(h.screen.permission_state(), PermissionState::Pending);
    h.screen.update(Message::Input("yes".to_string()));
    assert!(h.screen.is_bound());
}

#[test]
fn test_no_cameras_means_empty_menu_and_no_preview() {
    let mut h = Harness::new(Setup {
        cameras: Vec::new(),
        ..Setup::default()
    });
    h.start();

    assert!(h.screen.menu().is_empty());
    assert_eq!(h.screen.selected_camera(), None);
    assert!(!h.screen.is_bound());
    assert!(h.events().contains(&UiEvent::Menu(Vec::new())));
    assert!(!h.events().contains(&UiEvent::Preview(true)));
    assert!(h.log().is_empty());
}

#[test]
fn test_cameras_without_identifier_are_not_listed() {
    let mut h = Harness::new(Setup {
        cameras: vec![
            CameraDevice::without_id("Mystery", "/dev/video9"),
            camera("2"),
        ],
        ..Setup::default()
    });
    h.start();

    assert_eq!(h.screen.menu().labels(), vec!["Camera ID 2"]);
    assert_eq!(h.log(), vec!["open:2"]);
}

#[test]
fn test_switching_camera_unbinds_before_binding() {
    let mut h = Harness::new(Setup {
        cameras: vec![camera("0"), camera("1")],
        ..Setup::default()
    });
    h.start();
    let first = h.screen.active_binding().unwrap();

    h.screen
        .update(Message::SelectCamera("Camera ID 1".to_string()));

    assert_eq!(h.log(), vec!["open:0", "stop:0", "open:1"]);
    assert_eq!(h.screen.selected_camera(), Some("1"));
    assert_ne!(h.screen.active_binding(), Some(first));
    assert!(h
        .events()
        .contains(&UiEvent::Notify("Switched to camera ID: 1".to_string())));
}

#[test]
fn test_unknown_selection_keeps_current_camera() {
    let mut h = Harness::new(Setup::default());
    h.start();

    h.screen.update(Message::Input("select Camera ID 7".to_string()));

    assert_eq!(h.screen.selected_camera(), Some("0"));
    assert_eq!(h.log(), vec!["open:0"]);
    assert_eq!(
        h.events().last(),
        Some(&UiEvent::Notify("Unknown camera: Camera ID 7".to_string()))
    );
}

#[test]
fn test_results_from_previous_binding_are_ignored() {
    let mut h = Harness::new(Setup {
        cameras: vec![camera("0"), camera("1")],
        ..Setup::default()
    });
    h.start();
    let stale = h.routed("upi://pay?pa=old@bank");

    h.screen.update(Message::SelectCamera("1".to_string()));
    h.screen.update(stale);

    assert!(h.launched().is_empty());
}

#[test]
fn test_repeated_payload_is_suppressed() {
    let mut h = Harness::new(Setup::default());
    h.start();

    let first = h.routed("upi://pay?pa=a@b");
    h.screen.update(first.clone());
    h.screen.update(first);
    let second = h.routed("upi://pay?pa=c@d");
    h.screen.update(second);

    assert_eq!(h.launched(), vec!["upi://pay?pa=a@b", "upi://pay?pa=c@d"]);
}

#[test]
fn test_repeats_allowed_without_suppression() {
    let mut h = Harness::new(Setup {
        settings: ScreenSettings {
            repeat_suppression: None,
            default_camera: None,
        },
        ..Setup::default()
    });
    h.start();

    let routed = h.routed("upi://pay?pa=a@b");
    h.screen.update(routed.clone());
    h.screen.update(routed);

    assert_eq!(h.launched().len(), 2);
}

#[test]
fn test_pause_unbinds_and_resume_rebinds() {
    let mut h = Harness::new(Setup::default());
    h.start();

    h.screen.update(Message::Paused);
    assert!(!h.screen.is_bound());
    assert_eq!(h.events().last(), Some(&UiEvent::Preview(false)));

    h.screen.update(Message::Resumed);
    assert!(h.screen.is_bound());
    assert_eq!(h.log(), vec!["open:0", "stop:0", "open:0"]);
}

#[test]
fn test_resume_while_bound_rebinds() {
    let mut h = Harness::new(Setup::default());
    h.start();
    let first = h.screen.active_binding().unwrap();
    let stale = h.routed("upi://pay?pa=old@bank");

    h.screen.update(Message::Resumed);

    assert!(h.screen.is_bound());
    assert_eq!(h.log(), vec!["open:0", "stop:0", "open:0"]);
    let second = h.screen.active_binding().unwrap();
    assert_ne!(first, second);
    assert_eq!(h.screen.analyzer().current_binding(), Some(second));

    // Results of the replaced binding no longer act
    h.screen.update(stale);
    assert!(h.launched().is_empty());
}

#[test]
fn test_default_camera_is_preselected() {
    let mut h = Harness::new(Setup {
        cameras: vec![camera("0"), camera("1")],
        settings: ScreenSettings {
            repeat_suppression: None,
            default_camera: Some("Camera ID 1".to_string()),
        },
        ..Setup::default()
    });
    h.start();

    assert_eq!(h.screen.selected_camera(), Some("1"));
    assert_eq!(h.log(), vec!["open:1"]);
}

#[test]
fn test_bind_failure_leaves_preview_inactive() {
    let mut h = Harness::new(Setup {
        fail_open: true,
        ..Setup::default()
    });
    h.start();

    assert!(!h.screen.is_bound());
    assert_eq!(h.screen.analyzer().current_binding(), None);
    assert_eq!(h.events().last(), Some(&UiEvent::Preview(false)));
}

#[test]
fn test_destroy_unbinds_and_stops_analyzer() {
    let mut h = Harness::new(Setup::default());
    h.start();

    assert_eq!(h.screen.update(Message::Input("quit".to_string())), Flow::Exit);
    assert!(h.screen.is_destroyed());
    assert!(!h.screen.is_bound());
    assert!(!h.screen.analyzer().is_running());
    assert_eq!(h.log(), vec!["open:0", "stop:0"]);

    // Nothing happens after teardown
    assert_eq!(h.screen.update(Message::Resumed), Flow::Exit);
    assert_eq!(h.log(), vec!["open:0", "stop:0"]);
}
