use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracker_common::logging::LogSeverity;

pub const DEFAULT_WORLD_TO_METERS: f32 = 100.0;
pub const VIVE_TRACKER_PROFILE_PATH: &str = "/interaction_profiles/htc/vive_tracker_htcx";

/// What happens to tracker handles when the host creates a second session on the same instance,
/// for example after a runtime reconnect.
///
/// Actions and their suggested bindings belong to the instance and cannot be suggested again once
/// an action set has been attached, so they are never regenerated. Action spaces, on the other
/// hand, are owned by the session that created them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionRecreationPolicy {
    /// Keep every handle from the first session, nothing is recreated.
    #[default]
    Ignore,
    /// Destroy the action spaces of the previous session and create new ones for the same actions.
    RebuildSpaces,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: LogSeverity,
    pub log_to_disk: bool,
    // Used only when log_to_disk is set. Relative paths are resolved against the working directory
    pub log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogSeverity::Info,
            log_to_disk: false,
            log_path: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerSettings {
    /// Application units per meter. Tracker positions reported by the runtime are multiplied by
    /// this factor before being published.
    pub world_to_meters: f32,
    pub action_set_name: String,
    pub action_set_localized_name: String,
    pub action_set_priority: u32,
    pub interaction_profile: String,
    pub session_recreation: SessionRecreationPolicy,
    pub logging: LoggingConfig,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            world_to_meters: DEFAULT_WORLD_TO_METERS,
            action_set_name: "tracker_actionset".into(),
            action_set_localized_name: "Actionset for vive tracker actions".into(),
            action_set_priority: 0,
            interaction_profile: VIVE_TRACKER_PROFILE_PATH.into(),
            session_recreation: SessionRecreationPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}
