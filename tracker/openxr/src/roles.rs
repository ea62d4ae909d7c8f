use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracker_common::{Transform, parking_lot::RwLock, *};

pub const ASSIGNABLE_ROLE_COUNT: usize = 12;

const TRACKER_ROLE_PATH_PREFIX: &str = "/user/vive_tracker_htcx/role/";

macro_rules! tracker_roles {
    ($(($variant:ident, $segment:literal, $action_name:literal, $display_name:literal),)*) => {
        /// Body location a tracker has been assigned to in the runtime's tracker settings.
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum TrackerRole {
            $($variant,)*
            Unassigned,
        }

        impl TrackerRole {
            /// Every role that can be bound, in declaration order.
            pub const ASSIGNABLE: [TrackerRole; ASSIGNABLE_ROLE_COUNT] = [$(TrackerRole::$variant,)*];

            pub fn display_name(self) -> &'static str {
                match self {
                    $(TrackerRole::$variant => $display_name,)*
                    TrackerRole::Unassigned => "Unassigned",
                }
            }

            pub fn action_name(self) -> Option<&'static str> {
                match self {
                    $(TrackerRole::$variant => Some($action_name),)*
                    TrackerRole::Unassigned => None,
                }
            }

            /// Top level user path of the role, as reported in tracker connected events.
            pub fn role_path(self) -> Option<&'static str> {
                match self {
                    $(TrackerRole::$variant => Some(concat!("/user/vive_tracker_htcx/role/", $segment)),)*
                    TrackerRole::Unassigned => None,
                }
            }

            /// Grip pose input of the role in the tracker interaction profile.
            pub fn input_path(self) -> Option<&'static str> {
                match self {
                    $(TrackerRole::$variant => Some(concat!(
                        "/user/vive_tracker_htcx/role/", $segment, "/input/grip/pose"
                    )),)*
                    TrackerRole::Unassigned => None,
                }
            }

            pub fn from_role_path(path: &str) -> Option<Self> {
                match path.strip_prefix(TRACKER_ROLE_PATH_PREFIX)? {
                    $($segment => Some(TrackerRole::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

tracker_roles! {
    (FootLeft, "left_foot", "tracker_foot_l", "Foot (L)"),
    (FootRight, "right_foot", "tracker_foot_r", "Foot (R)"),
    (ShoulderLeft, "left_shoulder", "tracker_shoulder_l", "Shoulder (L)"),
    (ShoulderRight, "right_shoulder", "tracker_shoulder_r", "Shoulder (R)"),
    (ElbowLeft, "left_elbow", "tracker_elbow_l", "Elbow (L)"),
    (ElbowRight, "right_elbow", "tracker_elbow_r", "Elbow (R)"),
    (KneeLeft, "left_knee", "tracker_knee_l", "Knee (L)"),
    (KneeRight, "right_knee", "tracker_knee_r", "Knee (R)"),
    (Waist, "waist", "tracker_waist", "Waist"),
    (Chest, "chest", "tracker_chest", "Chest"),
    (Camera, "camera", "tracker_camera", "Camera"),
    (Keyboard, "keyboard", "tracker_keyboard", "Keyboard"),
}

impl TrackerRole {
    // Position in ASSIGNABLE, None for Unassigned
    pub fn index(self) -> Option<usize> {
        (self != TrackerRole::Unassigned).then_some(self as usize)
    }

    // Inverse of the `repr(u32)` discriminant, used at the C boundary
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal as usize {
            idx if idx < ASSIGNABLE_ROLE_COUNT => Some(Self::ASSIGNABLE[idx]),
            ASSIGNABLE_ROLE_COUNT => Some(TrackerRole::Unassigned),
            _ => None,
        }
    }
}

/// Last known transform of every tracker role.
///
/// The table is filled with identity transforms when created and entries are only ever
/// overwritten, never added or removed. The writer side is owned by the tracker module; consumers
/// that live on another thread hold a [`PoseTableReader`].
pub struct PoseTable {
    transforms: Arc<RwLock<HashMap<TrackerRole, Transform>>>,
}

impl PoseTable {
    pub fn new() -> Self {
        Self::with_roles(TrackerRole::ASSIGNABLE)
    }

    pub(crate) fn with_roles(roles: impl IntoIterator<Item = TrackerRole>) -> Self {
        Self {
            transforms: Arc::new(RwLock::new(
                roles
                    .into_iter()
                    .filter(|role| *role != TrackerRole::Unassigned)
                    .map(|role| (role, Transform::IDENTITY))
                    .collect(),
            )),
        }
    }

    pub fn reader(&self) -> PoseTableReader {
        PoseTableReader {
            transforms: Arc::clone(&self.transforms),
        }
    }

    pub fn get_tracker_transform(&self, role: TrackerRole) -> Transform {
        lookup_transform(&self.transforms.read(), role)
    }

    // Returns false if the role has no entry. The table never grows.
    pub(crate) fn update(&self, role: TrackerRole, transform: Transform) -> bool {
        if let Some(entry) = self.transforms.write().get_mut(&role) {
            *entry = transform;
            true
        } else {
            false
        }
    }
}

impl Default for PoseTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle to a [`PoseTable`], cheap to clone and safe to move to another thread.
#[derive(Clone)]
pub struct PoseTableReader {
    transforms: Arc<RwLock<HashMap<TrackerRole, Transform>>>,
}

impl PoseTableReader {
    pub fn get_tracker_transform(&self, role: TrackerRole) -> Transform {
        lookup_transform(&self.transforms.read(), role)
    }
}

fn lookup_transform(transforms: &HashMap<TrackerRole, Transform>, role: TrackerRole) -> Transform {
    if role == TrackerRole::Unassigned {
        return Transform::IDENTITY;
    }

    if let Some(transform) = transforms.get(&role) {
        *transform
    } else {
        warn!(
            "Unable to obtain tracker pose - Unknown tracker role {}",
            role.display_name()
        );
        Transform::IDENTITY
    }
}
