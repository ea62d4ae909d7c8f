mod settings;

pub use settings::*;

use serde_json as json;
use std::{fs, path::Path};
use tracker_common::{
    anyhow::{Context, Result, anyhow},
    *,
};

pub fn load_settings(path: &Path) -> Result<TrackerSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tracker settings at {}", path.display()))?;
    let json_value = json::from_str::<json::Value>(&contents)
        .with_context(|| format!("Tracker settings at {} are not valid JSON", path.display()))?;

    let mut settings = TrackerSettings::default();
    settings.merge_from_json(&json_value)?;

    Ok(settings)
}

pub fn save_settings(settings: &TrackerSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, json::to_string_pretty(settings)?)
        .with_context(|| format!("Failed to write tracker settings at {}", path.display()))
}

// A missing file is the normal first-run case. Anything else is reported, and whatever could be
// salvaged from the file is kept.
pub fn load_or_default(path: &Path) -> TrackerSettings {
    if !path.exists() {
        info!(
            "No tracker settings found at {}, using defaults",
            path.display()
        );
        return TrackerSettings::default();
    }

    match fs::read_to_string(path)
        .to_any()
        .and_then(|contents| json::from_str::<json::Value>(&contents).to_any())
    {
        Ok(json_value) => {
            let mut settings = TrackerSettings::default();
            show_warn(settings.merge_from_json(&json_value));
            settings
        }
        Err(e) => {
            error!("Cannot load tracker settings, using defaults: {e}");
            TrackerSettings::default()
        }
    }
}

impl TrackerSettings {
    // Fields missing from `json_value` or holding a value of the wrong type keep their current
    // value. Unknown fields are ignored. If the merged result still does not deserialize, fields
    // are applied one at a time and the ones that break deserialization are dropped; in that case
    // the settings are updated with what could be applied and an error is returned.
    pub fn merge_from_json(&mut self, json_value: &json::Value) -> Result<()> {
        let old_json = json::to_value(&*self)?;
        let merged_json = extrapolate_settings(&old_json, json_value);

        let result = match json::from_value::<TrackerSettings>(merged_json.clone()) {
            Ok(settings) => {
                *self = settings;
                Ok(())
            }
            Err(e) => {
                let mut accepted_json = old_json;
                if let Some(fields) = merged_json.as_object() {
                    for (name, value) in fields {
                        let mut candidate_json = accepted_json.clone();
                        candidate_json[name.as_str()] = value.clone();

                        if json::from_value::<TrackerSettings>(candidate_json.clone()).is_ok() {
                            accepted_json = candidate_json;
                        }
                    }
                }
                *self = json::from_value(accepted_json)?;

                Err(anyhow!("Some tracker settings could not be applied: {e}"))
            }
        };

        self.sanitize();

        result
    }

    fn sanitize(&mut self) {
        if !self.world_to_meters.is_finite() || self.world_to_meters <= 0.0 {
            warn!(
                "Invalid worldToMeters value {}, falling back to {DEFAULT_WORLD_TO_METERS}",
                self.world_to_meters
            );
            self.world_to_meters = DEFAULT_WORLD_TO_METERS;
        }
    }
}

// Match both field name and value type. Objects are merged recursively, a `null` in the old value
// (an unset option) accepts anything.
fn extrapolate_settings(old_value: &json::Value, new_value: &json::Value) -> json::Value {
    match old_value {
        json::Value::Object(old_fields) => {
            let Some(new_fields) = new_value.as_object() else {
                return old_value.clone();
            };

            json::Value::Object(
                old_fields
                    .iter()
                    .map(|(name, old_field)| {
                        let field = new_fields
                            .get(name)
                            .map(|new_field| extrapolate_settings(old_field, new_field))
                            .unwrap_or_else(|| old_field.clone());
                        (name.clone(), field)
                    })
                    .collect(),
            )
        }
        json::Value::Bool(_) if new_value.is_boolean() => new_value.clone(),
        json::Value::Number(old_number) if old_number.is_u64() && new_value.is_u64() => {
            new_value.clone()
        }
        json::Value::Number(old_number) if !old_number.is_u64() && new_value.is_number() => {
            new_value.clone()
        }
        json::Value::String(_) if new_value.is_string() => new_value.clone(),
        json::Value::Array(_) if new_value.is_array() => new_value.clone(),
        json::Value::Null => new_value.clone(),
        _ => old_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tracker_common::logging::LogSeverity;

    #[test]
    fn test_default_roundtrip_json() {
        let mut settings = TrackerSettings::default();
        settings
            .merge_from_json(&json::to_value(TrackerSettings::default()).unwrap())
            .unwrap();

        assert_eq!(settings, TrackerSettings::default());
    }

    #[test]
    fn test_partial_merge() {
        let input_json_string = r#"{
            "worldToMeters": 1.0,
            "sessionRecreation": "RebuildSpaces",
            "unknownField": 42,
            "logging": {
                "logToDisk": true,
                "logPath": "logs/tracker.log"
            }
        }"#;

        let mut settings = TrackerSettings::default();
        settings
            .merge_from_json(&json::from_str(input_json_string).unwrap())
            .unwrap();

        assert_eq!(settings.world_to_meters, 1.0);
        assert_eq!(
            settings.session_recreation,
            SessionRecreationPolicy::RebuildSpaces
        );
        assert!(settings.logging.log_to_disk);
        assert_eq!(
            settings.logging.log_path,
            Some(PathBuf::from("logs/tracker.log"))
        );
        assert_eq!(settings.logging.level, LogSeverity::Info);
        assert_eq!(settings.interaction_profile, VIVE_TRACKER_PROFILE_PATH);
    }

    #[test]
    fn test_wrong_types_keep_previous_values() {
        let input_json_string = r#"{
            "worldToMeters": "a lot",
            "actionSetPriority": -1,
            "actionSetName": "custom_set"
        }"#;

        let mut settings = TrackerSettings::default();
        settings
            .merge_from_json(&json::from_str(input_json_string).unwrap())
            .unwrap();

        assert_eq!(settings.world_to_meters, DEFAULT_WORLD_TO_METERS);
        assert_eq!(settings.action_set_priority, 0);
        assert_eq!(settings.action_set_name, "custom_set");
    }

    #[test]
    fn test_invalid_variant_is_dropped() {
        let input_json_string = r#"{
            "sessionRecreation": "Sometimes",
            "actionSetPriority": 3
        }"#;

        let mut settings = TrackerSettings::default();
        let res = settings.merge_from_json(&json::from_str(input_json_string).unwrap());

        assert!(res.is_err());
        assert_eq!(settings.session_recreation, SessionRecreationPolicy::Ignore);
        assert_eq!(settings.action_set_priority, 3);
    }

    #[test]
    fn test_non_positive_scale_is_rejected() {
        let mut settings = TrackerSettings::default();
        settings
            .merge_from_json(&json::json!({ "worldToMeters": 0.0 }))
            .unwrap();

        assert_eq!(settings.world_to_meters, DEFAULT_WORLD_TO_METERS);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("tracker_settings.json");

        let settings = TrackerSettings {
            world_to_meters: 1.0,
            session_recreation: SessionRecreationPolicy::RebuildSpaces,
            ..Default::default()
        };
        save_settings(&settings, &path).unwrap();

        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert_eq!(load_or_default(&missing), TrackerSettings::default());

        let corrupted = dir.path().join("corrupted.json");
        fs::write(&corrupted, "{ not json").unwrap();
        assert_eq!(load_or_default(&corrupted), TrackerSettings::default());
        assert!(load_settings(&corrupted).is_err());
    }
}
