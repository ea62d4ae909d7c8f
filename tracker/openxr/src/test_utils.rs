use crate::runtime::{
    SpaceLocation, SuggestedBinding, TrackerPathEnumerator, TrackerPaths, TrackerRuntime,
};
use openxr::{self as xr, sys};
use std::{
    cell::{Cell, RefCell},
    sync::{Arc, Once},
    thread::{self, ThreadId},
};
use tracker_common::{once_cell::sync::Lazy, parking_lot::Mutex};

pub fn instance() -> sys::Instance {
    sys::Instance::from_raw(0x1)
}

pub fn session() -> sys::Session {
    sys::Session::from_raw(0x2)
}

pub fn other_session() -> sys::Session {
    sys::Session::from_raw(0x3)
}

pub fn base_space() -> sys::Space {
    sys::Space::from_raw(0x4)
}

pub fn tracked_location(x: f32, y: f32, z: f32) -> SpaceLocation {
    SpaceLocation {
        location_flags: xr::SpaceLocationFlags::ORIENTATION_VALID
            | xr::SpaceLocationFlags::POSITION_VALID,
        pose: xr::Posef {
            orientation: xr::Posef::IDENTITY.orientation,
            position: xr::Vector3f { x, y, z },
        },
    }
}

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, log::Level, String)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records.lock().push((
            thread::current().id(),
            record.level(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: Lazy<CaptureLogger> = Lazy::new(|| CaptureLogger {
    records: Mutex::new(vec![]),
});

/// Records emitted on the calling thread from now on. Tests run on separate threads, so captures
/// do not see each other's output.
pub struct LogCapture {
    thread: ThreadId,
    start: usize,
}

impl LogCapture {
    fn messages(&self, level: Option<log::Level>) -> Vec<String> {
        LOGGER.records.lock()[self.start..]
            .iter()
            .filter(|(thread, record_level, _)| {
                *thread == self.thread && level.is_none_or(|level| level == *record_level)
            })
            .map(|(_, _, message)| message.clone())
            .collect()
    }

    pub fn count(&self, level: log::Level) -> usize {
        self.messages(Some(level)).len()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages(None)
            .iter()
            .any(|message| message.contains(needle))
    }
}

pub fn capture_logs() -> LogCapture {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&*LOGGER).ok();
        log::set_max_level(log::LevelFilter::Trace);
    });

    LogCapture {
        thread: thread::current().id(),
        start: LOGGER.records.lock().len(),
    }
}

struct MockAction {
    handle: sys::Action,
    name: String,
    live: bool,
}

struct MockSpace {
    handle: sys::Space,
    action: sys::Action,
    session: sys::Session,
    live: bool,
}

struct MockEnumerator {
    trackers: Arc<Mutex<Vec<TrackerPaths>>>,
}

impl TrackerPathEnumerator for MockEnumerator {
    fn enumerate(&self, paths: &mut [TrackerPaths]) -> xr::Result<u32> {
        let trackers = self.trackers.lock();
        if paths.is_empty() {
            return Ok(trackers.len() as u32);
        }

        if paths.len() < trackers.len() {
            return Err(sys::Result::ERROR_SIZE_INSUFFICIENT);
        }
        paths[..trackers.len()].copy_from_slice(&trackers);

        Ok(trackers.len() as u32)
    }
}

/// Runtime double that hands out sequential handles, records every call and fails on request.
#[derive(Default)]
pub struct MockRuntime {
    next_handle: Cell<u64>,
    paths: RefCell<Vec<String>>,
    action_sets: Vec<(sys::ActionSet, String, String, u32, bool)>,
    actions: Vec<MockAction>,
    spaces: Vec<MockSpace>,
    trackers: Arc<Mutex<Vec<TrackerPaths>>>,
    pub created_actions: usize,
    pub suggested_batches: Vec<(xr::Path, Vec<SuggestedBinding>)>,
    pub locate_calls: RefCell<Vec<sys::Space>>,
    locations: Vec<(String, xr::Result<SpaceLocation>)>,
    failing_actions: Vec<String>,
    failing_spaces: Vec<String>,
    failing_paths: Vec<String>,
    fail_action_set: bool,
    fail_suggest: bool,
    without_enumerator: bool,
}

impl MockRuntime {
    pub fn fail_action(mut self, name: &str) -> Self {
        self.failing_actions.push(name.into());
        self
    }

    pub fn fail_space(mut self, action_name: &str) -> Self {
        self.failing_spaces.push(action_name.into());
        self
    }

    pub fn fail_path(mut self, path: &str) -> Self {
        self.failing_paths.push(path.into());
        self
    }

    pub fn fail_action_set(mut self) -> Self {
        self.fail_action_set = true;
        self
    }

    pub fn fail_suggest(mut self) -> Self {
        self.fail_suggest = true;
        self
    }

    pub fn without_enumerator(mut self) -> Self {
        self.without_enumerator = true;
        self
    }

    pub fn with_location(mut self, action_name: &str, location: xr::Result<SpaceLocation>) -> Self {
        self.set_location(action_name, location);
        self
    }

    pub fn set_location(&mut self, action_name: &str, location: xr::Result<SpaceLocation>) {
        self.locations.retain(|(name, _)| name != action_name);
        self.locations.push((action_name.into(), location));
    }

    // Registers a tracker with the runtime and returns the paths a connected event would carry
    pub fn connect_tracker(&self, persistent_path: &str, role_path: Option<&str>) -> TrackerPaths {
        let paths = TrackerPaths {
            persistent_path: self.intern(persistent_path),
            role_path: role_path.map_or(xr::Path::NULL, |path| self.intern(path)),
        };
        self.trackers.lock().push(paths);

        paths
    }

    pub fn action_set(&mut self) -> sys::ActionSet {
        self.create_action_set(instance(), "tracker_actionset", "Tracker actions", 0)
            .unwrap()
    }

    pub fn action_set_info(&self, action_set: sys::ActionSet) -> Option<(&str, &str, u32)> {
        self.action_sets
            .iter()
            .find(|(handle, ..)| *handle == action_set)
            .map(|(_, name, localized_name, priority, _)| {
                (name.as_str(), localized_name.as_str(), *priority)
            })
    }

    pub fn live_action_sets(&self) -> Vec<sys::ActionSet> {
        self.action_sets
            .iter()
            .filter(|(.., live)| *live)
            .map(|(handle, ..)| *handle)
            .collect()
    }

    pub fn live_actions(&self) -> Vec<sys::Action> {
        self.actions
            .iter()
            .filter(|action| action.live)
            .map(|action| action.handle)
            .collect()
    }

    pub fn live_spaces(&self) -> Vec<sys::Space> {
        self.spaces
            .iter()
            .filter(|space| space.live)
            .map(|space| space.handle)
            .collect()
    }

    pub fn action_name(&self, action: sys::Action) -> Option<&str> {
        self.actions
            .iter()
            .find(|mock| mock.handle == action)
            .map(|mock| mock.name.as_str())
    }

    pub fn space_session(&self, space: sys::Space) -> Option<sys::Session> {
        self.spaces
            .iter()
            .find(|mock| mock.handle == space)
            .map(|mock| mock.session)
    }

    pub fn path_string(&self, path: xr::Path) -> Option<String> {
        self.path_to_string(instance(), path).ok()
    }

    fn handle(&self) -> u64 {
        let handle = self.next_handle.get() + 0x100;
        self.next_handle.set(handle);

        handle
    }

    fn intern(&self, path: &str) -> xr::Path {
        let mut paths = self.paths.borrow_mut();
        let idx = match paths.iter().position(|p| p == path) {
            Some(idx) => idx,
            None => {
                paths.push(path.into());
                paths.len() - 1
            }
        };

        xr::Path::from_raw(idx as u64 + 1)
    }
}

impl TrackerRuntime for MockRuntime {
    fn create_action_set(
        &mut self,
        _: sys::Instance,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> xr::Result<sys::ActionSet> {
        if self.fail_action_set {
            return Err(sys::Result::ERROR_NAME_DUPLICATED);
        }

        let handle = sys::ActionSet::from_raw(self.handle());
        self.action_sets
            .push((handle, name.into(), localized_name.into(), priority, true));

        Ok(handle)
    }

    fn destroy_action_set(&mut self, action_set: sys::ActionSet) -> xr::Result<()> {
        let entry = self
            .action_sets
            .iter_mut()
            .find(|(handle, .., live)| *handle == action_set && *live)
            .ok_or(sys::Result::ERROR_HANDLE_INVALID)?;
        entry.4 = false;

        Ok(())
    }

    fn create_pose_action(
        &mut self,
        _: sys::ActionSet,
        name: &str,
        _: &str,
    ) -> xr::Result<sys::Action> {
        if self.failing_actions.iter().any(|n| n == name) {
            return Err(sys::Result::ERROR_RUNTIME_FAILURE);
        }

        let handle = sys::Action::from_raw(self.handle());
        self.actions.push(MockAction {
            handle,
            name: name.into(),
            live: true,
        });
        self.created_actions += 1;

        Ok(handle)
    }

    fn destroy_action(&mut self, action: sys::Action) -> xr::Result<()> {
        let mock = self
            .actions
            .iter_mut()
            .find(|mock| mock.handle == action && mock.live)
            .ok_or(sys::Result::ERROR_HANDLE_INVALID)?;
        mock.live = false;

        Ok(())
    }

    fn create_action_space(
        &mut self,
        session: sys::Session,
        action: sys::Action,
        _: xr::Posef,
    ) -> xr::Result<sys::Space> {
        let name = self
            .action_name(action)
            .ok_or(sys::Result::ERROR_HANDLE_INVALID)?;
        if self.failing_spaces.iter().any(|n| n == name) {
            return Err(sys::Result::ERROR_OUT_OF_MEMORY);
        }

        let handle = sys::Space::from_raw(self.handle());
        self.spaces.push(MockSpace {
            handle,
            action,
            session,
            live: true,
        });

        Ok(handle)
    }

    fn destroy_space(&mut self, space: sys::Space) -> xr::Result<()> {
        let mock = self
            .spaces
            .iter_mut()
            .find(|mock| mock.handle == space && mock.live)
            .ok_or(sys::Result::ERROR_HANDLE_INVALID)?;
        mock.live = false;

        Ok(())
    }

    fn string_to_path(&self, _: sys::Instance, path: &str) -> xr::Result<xr::Path> {
        if self.failing_paths.iter().any(|p| p == path) {
            return Err(sys::Result::ERROR_PATH_FORMAT_INVALID);
        }

        Ok(self.intern(path))
    }

    fn path_to_string(&self, _: sys::Instance, path: xr::Path) -> xr::Result<String> {
        let idx = (path.into_raw() as usize)
            .checked_sub(1)
            .ok_or(sys::Result::ERROR_PATH_INVALID)?;

        self.paths
            .borrow()
            .get(idx)
            .cloned()
            .ok_or(sys::Result::ERROR_PATH_INVALID)
    }

    fn suggest_interaction_profile_bindings(
        &mut self,
        _: sys::Instance,
        interaction_profile: xr::Path,
        bindings: &[SuggestedBinding],
    ) -> xr::Result<()> {
        if self.fail_suggest {
            return Err(sys::Result::ERROR_PATH_UNSUPPORTED);
        }

        self.suggested_batches
            .push((interaction_profile, bindings.to_vec()));

        Ok(())
    }

    fn locate_space(
        &self,
        space: sys::Space,
        _: sys::Space,
        _: xr::Time,
    ) -> xr::Result<SpaceLocation> {
        self.locate_calls.borrow_mut().push(space);

        let mock = self
            .spaces
            .iter()
            .find(|mock| mock.handle == space && mock.live)
            .ok_or(sys::Result::ERROR_HANDLE_INVALID)?;
        let name = self
            .action_name(mock.action)
            .ok_or(sys::Result::ERROR_HANDLE_INVALID)?;

        self.locations
            .iter()
            .find(|(action_name, _)| action_name == name)
            .map(|(_, location)| *location)
            .unwrap_or(Ok(SpaceLocation {
                location_flags: xr::SpaceLocationFlags::EMPTY,
                pose: xr::Posef::IDENTITY,
            }))
    }

    fn resolve_tracker_path_enumerator(
        &self,
        _: sys::Instance,
    ) -> Option<Box<dyn TrackerPathEnumerator>> {
        if self.without_enumerator {
            return None;
        }

        Some(Box::new(MockEnumerator {
            trackers: Arc::clone(&self.trackers),
        }))
    }
}
