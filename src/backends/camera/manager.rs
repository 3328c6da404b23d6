// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend binding manager
//!
//! The manager owns the backend and the single active stream. Binding a new
//! camera always tears the previous stream down first, so at most one
//! pipeline exists at any time.

use super::types::*;
use super::{BackendOptions, CameraBackend, CameraStream, FrameSink, get_backend_for_type};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

struct ManagerState {
    backend: Box<dyn CameraBackend>,
    active: Option<Box<dyn CameraStream>>,
    /// Number of successful binds since creation
    bind_count: u64,
}

/// Camera backend manager
///
/// Cheap to clone; clones share the same backend and binding.
#[derive(Clone)]
pub struct CameraBackendManager {
    state: Arc<Mutex<ManagerState>>,
}

impl CameraBackendManager {
    /// Wrap an existing backend
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        info!(backend = %backend.backend_type(), "Creating camera backend manager");
        Self {
            state: Arc::new(Mutex::new(ManagerState {
                backend,
                active: None,
                bind_count: 0,
            })),
        }
    }

    /// Create a manager for a backend type
    pub fn for_type(
        backend_type: CameraBackendType,
        options: &BackendOptions,
    ) -> BackendResult<Self> {
        Ok(Self::new(get_backend_for_type(backend_type, options)?))
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the backend type
    pub fn backend_type(&self) -> CameraBackendType {
        self.state().backend.backend_type()
    }

    /// Check if the backend is available on this system
    pub fn is_available(&self) -> bool {
        self.state().backend.is_available()
    }

    /// Every camera the backend reports, with or without an identifier
    pub fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.state().backend.enumerate_cameras()
    }

    /// Cameras that have an identifier and can therefore be selected
    pub fn selectable_cameras(&self) -> Vec<CameraDevice> {
        let all = self.enumerate_cameras();
        let total = all.len();
        let selectable: Vec<CameraDevice> = all
            .into_iter()
            .filter(|device| device.camera_id().is_some())
            .collect();

        if selectable.len() != total {
            info!(
                total,
                selectable = selectable.len(),
                "Some cameras have no identifier and were excluded"
            );
        }
        selectable
    }

    /// Tear down the active stream, if any
    ///
    /// Returns the device that was unbound.
    pub fn unbind_all(&self) -> Option<CameraDevice> {
        let mut state = self.state();
        let mut stream = state.active.take()?;
        let device = stream.device().clone();

        info!(device = %device.name, "Unbinding camera");
        if let Err(e) = stream.stop() {
            warn!(device = %device.name, error = %e, "Camera stream did not stop cleanly");
        }
        Some(device)
    }

    /// Bind `device` so its frames flow into `sink`
    ///
    /// Any previous binding is torn down before the new stream is opened. On
    /// failure the manager is left unbound.
    pub fn bind(&self, device: &CameraDevice, sink: FrameSink) -> BackendResult<()> {
        self.unbind_all();

        let mut state = self.state();
        info!(device = %device.name, id = ?device.camera_id(), "Binding camera");

        let stream = state.backend.open_stream(device, sink)?;
        state.active = Some(stream);
        state.bind_count += 1;
        Ok(())
    }

    /// Check if a stream is bound
    pub fn is_bound(&self) -> bool {
        self.state().active.is_some()
    }

    /// Device of the active stream
    pub fn bound_device(&self) -> Option<CameraDevice> {
        self.state()
            .active
            .as_ref()
            .map(|stream| stream.device().clone())
    }

    /// Number of successful binds so far
    pub fn bind_count(&self) -> u64 {
        self.state().bind_count
    }
}

impl std::fmt::Debug for CameraBackendManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("CameraBackendManager")
            .field("backend_type", &state.backend.backend_type())
            .field("bound", &state.active.is_some())
            .field("bind_count", &state.bind_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type EventLog = Arc<Mutex<Vec<String>>>;

    struct RecordingBackend {
        cameras: Vec<CameraDevice>,
        events: EventLog,
        fail_open: bool,
    }

    struct RecordingStream {
        device: CameraDevice,
        events: EventLog,
        running: bool,
    }

    impl CameraStream for RecordingStream {
        fn device(&self) -> &CameraDevice {
            &self.device
        }

        fn stop(&mut self) -> BackendResult<()> {
            if self.running {
                self.running = false;
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("stop:{}", self.device.path));
            }
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    impl CameraBackend for RecordingBackend {
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
            _sink: FrameSink,
        ) -> BackendResult<Box<dyn CameraStream>> {
            if self.fail_open {
                return Err(BackendError::Busy(device.path.clone()));
            }
            self.events
                .lock()
                .unwrap()
                .push(format!("open:{}", device.path));
            Ok(Box::new(RecordingStream {
                device: device.clone(),
                events: Arc::clone(&self.events),
                running: true,
            }))
        }
    }

    fn manager(fail_open: bool) -> (CameraBackendManager, EventLog) {
        let events: EventLog = Arc::default();
        let backend = RecordingBackend {
            cameras: vec![
                CameraDevice::new("0", "Back", "a"),
                CameraDevice::without_id("Hidden", "h"),
                CameraDevice::new("1", "Front", "b"),
            ],
            events: Arc::clone(&events),
            fail_open,
        };
        (CameraBackendManager::new(Box::new(backend)), events)
    }

    #[test]
    fn test_selectable_cameras_exclude_missing_ids() {
        let (manager, _) = manager(false);
        let ids: Vec<_> = manager
            .selectable_cameras()
            .iter()
            .filter_map(|d| d.camera_id().map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(manager.enumerate_cameras().len(), 3);
    }

    #[test]
    fn test_rebind_stops_previous_stream_first() {
        let (manager, events) = manager(false);
        let cameras = manager.selectable_cameras();

        manager.bind(&cameras[0], FrameSink::discard()).unwrap();
        manager.bind(&cameras[1], FrameSink::discard()).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["open:a", "stop:a", "open:b"]
        );
        assert_eq!(manager.bound_device().map(|d| d.path), Some("b".to_string()));
        assert_eq!(manager.bind_count(), 2);
    }

    #[test]
    fn test_failed_bind_leaves_manager_unbound() {
        let (manager, _) = manager(true);
        let cameras = manager.selectable_cameras();

        let result = manager.bind(&cameras[0], FrameSink::discard());
        assert!(matches!(result, Err(BackendError::Busy(_))));
        assert!(!manager.is_bound());
        assert_eq!(manager.bind_count(), 0);
    }

    #[test]
    fn test_unbind_all_is_idempotent() {
        let (manager, events) = manager(false);
        let cameras = manager.selectable_cameras();
        manager.bind(&cameras[0], FrameSink::discard()).unwrap();

        assert_eq!(manager.unbind_all().map(|d| d.path), Some("a".to_string()));
        assert_eq!(manager.unbind_all(), None);
        assert_eq!(*events.lock().unwrap(), vec!["open:a", "stop:a"]);
    }
}
