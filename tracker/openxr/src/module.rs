use crate::{
    VIVE_TRACKER_EXTENSION_NAME,
    actions::{self, PoseAction, TrackerActions},
    bindings,
    events::{self, ConnectedTracker, TrackerEvent},
    poses,
    roles::{PoseTable, PoseTableReader, TrackerRole},
    runtime::{SuggestedBinding, TrackerPathEnumerator, TrackerRuntime},
};
use openxr::{self as xr, sys};
use std::mem;
use tracker_common::*;
use tracker_session::{SessionRecreationPolicy, TrackerSettings};

/// Position of the module in the host lifecycle. Each host hook moves it at most one step
/// forward; `SyncLoop` lasts until shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackerPhase {
    Uninitialized,
    InstanceCreated,
    SessionCreated,
    ActionsGenerated,
    BindingsSuggested,
    SyncLoop,
}

struct InstanceContext {
    instance: sys::Instance,
    action_set: Option<sys::ActionSet>,
    session_state: xr::SessionState,
    tracker_path_enumerator: Option<Box<dyn TrackerPathEnumerator>>,
    connected_trackers: Vec<ConnectedTracker>,
    actions: TrackerActions,
    pending_bindings: Vec<SuggestedBinding>,
    actions_generated: bool,
    bindings_suggested: bool,
}

struct SessionContext {
    session: sys::Session,
    synced: bool,
}

struct FrameContext {
    base_space: sys::Space,
    predicted_display_time: xr::Time,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            base_space: sys::Space::NULL,
            predicted_display_time: xr::Time::from_nanos(0),
        }
    }
}

/// Tracker extension module. The host calls the hooks in lifecycle order: `post_create_instance`,
/// `post_create_session`, then once per frame `update_device_locations`, `add_action_sets` and
/// `post_sync_actions`. Events may arrive at any time through `on_event`.
///
/// Every hook logs and absorbs runtime failures; a role whose action could not be set up simply
/// keeps its last published transform.
pub struct TrackerModule<R: TrackerRuntime> {
    runtime: R,
    settings: TrackerSettings,
    pose_table: PoseTable,
    instance: Option<InstanceContext>,
    session: Option<SessionContext>,
    frame: FrameContext,
    shut_down: bool,
}

impl<R: TrackerRuntime> TrackerModule<R> {
    pub const REQUIRED_EXTENSIONS: &'static [&'static str] = &[VIVE_TRACKER_EXTENSION_NAME];

    pub fn new(runtime: R, settings: TrackerSettings) -> Self {
        info!("Plugin started. OpenXR extension {VIVE_TRACKER_EXTENSION_NAME} will be enabled.");

        Self {
            runtime,
            settings,
            pose_table: PoseTable::new(),
            instance: None,
            session: None,
            frame: FrameContext::default(),
            shut_down: false,
        }
    }

    pub fn required_extensions(&self) -> &'static [&'static str] {
        Self::REQUIRED_EXTENSIONS
    }

    pub fn post_create_instance(&mut self, instance: sys::Instance) {
        if self.instance.is_some() {
            warn!("A new OpenXR instance was created, releasing tracker handles of the previous one");
            self.release_handles();
        }
        self.shut_down = false;

        let action_set = match self.runtime.create_action_set(
            instance,
            &self.settings.action_set_name,
            &self.settings.action_set_localized_name,
            self.settings.action_set_priority,
        ) {
            Ok(action_set) => {
                info!(
                    "Created action set for trackers [{}]",
                    self.settings.action_set_name
                );
                Some(action_set)
            }
            Err(e) => {
                error!(
                    "Unable to create action set. Runtime returned error {e} ({})",
                    e.into_raw()
                );
                None
            }
        };

        let tracker_path_enumerator = self.runtime.resolve_tracker_path_enumerator(instance);
        if tracker_path_enumerator.is_none() {
            debug!("Runtime does not expose xrEnumerateViveTrackerPathsHTCX");
        }

        self.instance = Some(InstanceContext {
            instance,
            action_set,
            session_state: xr::SessionState::UNKNOWN,
            tracker_path_enumerator,
            connected_trackers: vec![],
            actions: TrackerActions::default(),
            pending_bindings: vec![],
            actions_generated: false,
            bindings_suggested: false,
        });
    }

    pub fn post_create_session(&mut self, session: sys::Session) {
        let Some(instance_ctx) = &mut self.instance else {
            warn!("Session created without an instance, tracker actions will not be created");
            return;
        };

        if instance_ctx.actions_generated {
            if self.session.as_ref().is_some_and(|ctx| ctx.session == session) {
                return;
            }

            match self.settings.session_recreation {
                SessionRecreationPolicy::Ignore => {
                    info!("New session created, tracker action spaces are kept as they are");
                }
                SessionRecreationPolicy::RebuildSpaces => {
                    let rebuilt = instance_ctx
                        .actions
                        .rebuild_spaces(&mut self.runtime, session);
                    info!("New session created, rebuilt {rebuilt} tracker action spaces");
                }
            }

            self.session = Some(SessionContext {
                session,
                synced: false,
            });
            self.frame = FrameContext::default();

            return;
        }

        self.session = Some(SessionContext {
            session,
            synced: false,
        });

        for role in TrackerRole::ASSIGNABLE {
            let Some(action_name) = role.action_name() else {
                continue;
            };
            let pose_action = self.create_pose_action(action_name);
            self.create_tracker_binding(role, pose_action);
        }

        let Some(instance_ctx) = &mut self.instance else {
            return;
        };
        instance_ctx.actions_generated = true;

        let pending_bindings = mem::take(&mut instance_ctx.pending_bindings);
        instance_ctx.bindings_suggested = bindings::suggest_bindings(
            &mut self.runtime,
            instance_ctx.instance,
            &self.settings.interaction_profile,
            &pending_bindings,
        );
    }

    /// Creates a pose action named `name` and its action space in the current session. Returns
    /// None once actions have been generated, or without a session or action set.
    pub fn create_pose_action(&mut self, name: &str) -> Option<PoseAction> {
        let session = self.session.as_ref()?.session;
        let instance_ctx = self.instance.as_ref()?;
        if instance_ctx.actions_generated {
            return None;
        }
        let action_set = instance_ctx.action_set?;

        actions::create_pose_action(&mut self.runtime, action_set, session, name)
    }

    /// Binds a freshly created pose action to `role`. Bindings are queued and submitted together
    /// when the session hook completes.
    pub fn create_tracker_binding(
        &mut self,
        role: TrackerRole,
        pose_action: Option<PoseAction>,
    ) -> bool {
        let Some(pose_action) = pose_action else {
            return false;
        };
        let Some(instance_ctx) = &mut self.instance else {
            return false;
        };
        if instance_ctx.actions_generated {
            return false;
        }

        bindings::create_tracker_binding(
            &mut self.runtime,
            instance_ctx.instance,
            role,
            pose_action,
            &mut instance_ctx.actions,
            &mut instance_ctx.pending_bindings,
        )
    }

    pub fn update_device_locations(
        &mut self,
        _: sys::Session,
        predicted_display_time: xr::Time,
        base_space: sys::Space,
    ) {
        self.frame = FrameContext {
            base_space,
            predicted_display_time,
        };
    }

    pub fn on_event(&mut self, _: sys::Session, event: &TrackerEvent) {
        let Some(instance_ctx) = &mut self.instance else {
            return;
        };

        match event {
            TrackerEvent::SessionStateChanged(state) => {
                debug!("Session state changed to {state:?}");
                instance_ctx.session_state = *state;
            }
            TrackerEvent::ViveTrackerConnected(paths) => {
                let tracker = events::describe_tracker(&self.runtime, instance_ctx.instance, *paths);
                info!(
                    "Tracker connected event received for [{}] with role [{}]",
                    tracker.persistent_path,
                    tracker.role_path.as_deref().unwrap_or_default()
                );

                if let Some(connected_trackers) = events::enumerate_connected_trackers(
                    &self.runtime,
                    instance_ctx.instance,
                    instance_ctx.tracker_path_enumerator.as_deref(),
                ) {
                    instance_ctx.connected_trackers = connected_trackers;
                }
            }
            TrackerEvent::Other(_) => (),
        }
    }

    pub fn add_action_sets(&self, action_sets: &mut Vec<sys::ActiveActionSet>) {
        if let Some(action_set) = self.instance.as_ref().and_then(|ctx| ctx.action_set) {
            action_sets.push(sys::ActiveActionSet {
                action_set,
                subaction_path: xr::Path::NULL,
            });
        }
    }

    pub fn post_sync_actions(&mut self, _: sys::Session) {
        let (Some(instance_ctx), Some(session_ctx)) = (&self.instance, &mut self.session) else {
            return;
        };
        session_ctx.synced = true;

        poses::resolve_poses(
            &self.runtime,
            &instance_ctx.actions,
            &self.pose_table,
            self.frame.base_space,
            self.frame.predicted_display_time,
            self.settings.world_to_meters,
        );
    }

    pub fn get_tracker_transform(&self, role: TrackerRole) -> Transform {
        self.pose_table.get_tracker_transform(role)
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }

        self.release_handles();
        self.shut_down = true;

        info!("Plugin shut down");
    }

    // Spaces go first, then the actions they were created from, then the action set
    fn release_handles(&mut self) {
        if let Some(mut instance_ctx) = self.instance.take() {
            let pose_actions = instance_ctx.actions.take_all();
            for (_, pose_action) in &pose_actions {
                show_err(self.runtime.destroy_space(pose_action.space));
            }
            for (_, pose_action) in &pose_actions {
                show_err(self.runtime.destroy_action(pose_action.action));
            }
            if let Some(action_set) = instance_ctx.action_set {
                show_err(self.runtime.destroy_action_set(action_set));
            }
        }

        self.session = None;
        self.frame = FrameContext::default();
    }

    pub fn phase(&self) -> TrackerPhase {
        let Some(instance_ctx) = &self.instance else {
            return TrackerPhase::Uninitialized;
        };
        let Some(session_ctx) = &self.session else {
            return TrackerPhase::InstanceCreated;
        };

        if !instance_ctx.actions_generated {
            TrackerPhase::SessionCreated
        } else if !instance_ctx.bindings_suggested {
            TrackerPhase::ActionsGenerated
        } else if !session_ctx.synced {
            TrackerPhase::BindingsSuggested
        } else {
            TrackerPhase::SyncLoop
        }
    }

    pub fn is_actions_generated(&self) -> bool {
        self.instance
            .as_ref()
            .is_some_and(|ctx| ctx.actions_generated)
    }

    pub fn pose_actions(&self) -> Vec<sys::Action> {
        self.instance
            .as_ref()
            .map(|ctx| ctx.actions.actions())
            .unwrap_or_default()
    }

    pub fn action_space(&self, action: sys::Action) -> Option<sys::Space> {
        self.instance.as_ref()?.actions.space_of(action)
    }

    pub fn role_of(&self, action: sys::Action) -> Option<TrackerRole> {
        self.instance.as_ref()?.actions.role_of(action)
    }

    pub fn action_set(&self) -> Option<sys::ActionSet> {
        self.instance.as_ref()?.action_set
    }

    pub fn instance(&self) -> Option<sys::Instance> {
        self.instance.as_ref().map(|ctx| ctx.instance)
    }

    pub fn session(&self) -> Option<sys::Session> {
        self.session.as_ref().map(|ctx| ctx.session)
    }

    pub fn session_state(&self) -> xr::SessionState {
        self.instance
            .as_ref()
            .map_or(xr::SessionState::UNKNOWN, |ctx| ctx.session_state)
    }

    pub fn predicted_display_time(&self) -> xr::Time {
        self.frame.predicted_display_time
    }

    pub fn base_space(&self) -> sys::Space {
        self.frame.base_space
    }

    pub fn connected_trackers(&self) -> &[ConnectedTracker] {
        self.instance
            .as_ref()
            .map_or(&[], |ctx| &ctx.connected_trackers)
    }

    pub fn pose_table(&self) -> &PoseTable {
        &self.pose_table
    }

    pub fn pose_table_reader(&self) -> PoseTableReader {
        self.pose_table.reader()
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}
