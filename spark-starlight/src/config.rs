use crate::detect::property::detection::RawDetection;
use crate::detect::property::hazard::{PriorityTable, MAX_PRIORITY, MIN_PRIORITY};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hardware presets. Everything except `Standard` runs on a battery and
/// trades responsiveness for power: lower resolution, frame skipping and a
/// longer announcement cooldown.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceProfile {
    #[default]
    Standard,
    SmartGlasses,
    BodyCamera,
    Headset,
    RaspberryPi,
}

impl DeviceProfile {
    pub fn is_battery_constrained(&self) -> bool {
        !matches!(self, DeviceProfile::Standard)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub fps_target: u32,
    /// Only every n-th frame is analyzed.
    pub frame_skip: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps_target: 30,
            frame_skip: 1,
        }
    }
}

/// Parameters of the classifier call, plus the fusion overlap threshold.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub fusion_iou_threshold: f32,
    pub secondary_enabled: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.45,
            iou_threshold: 0.45,
            max_detections: 10,
            fusion_iou_threshold: 0.3,
            secondary_enabled: true,
        }
    }
}

impl DetectionConfig {
    /// Applies the confidence floor and the per-frame cap, keeping the most
    /// confident detections.
    pub fn admit(&self, raw: &[RawDetection]) -> Vec<RawDetection> {
        let mut admitted = raw
            .iter()
            .filter(|d| d.confidence >= self.confidence_threshold)
            .cloned()
            .collect::<Vec<_>>();
        admitted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        admitted.truncate(self.max_detections);
        admitted
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct DistanceBand {
    pub height_ratio: f32,
    pub bottom_ratio: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DistanceBands {
    pub immediate: DistanceBand,
    pub near: DistanceBand,
}

impl Default for DistanceBands {
    fn default() -> Self {
        Self {
            immediate: DistanceBand {
                height_ratio: 0.3,
                bottom_ratio: 0.8,
            },
            near: DistanceBand {
                height_ratio: 0.15,
                bottom_ratio: 0.6,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    pub cooldown_secs: f32,
    pub min_priority_for_audio: u8,
    /// Consecutive clear frames required before "path clear" is spoken.
    pub clear_frames_threshold: u32,
    /// Threat increase that makes the same hazard worth repeating.
    pub escalation_margin: u8,
    pub audio_enabled: bool,
    pub haptic_enabled: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 3.0,
            min_priority_for_audio: 2,
            clear_frames_threshold: 30,
            escalation_margin: 10,
            audio_enabled: true,
            haptic_enabled: false,
        }
    }
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f32(self.cooldown_secs).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathConfig {
    pub corridor_width_ratio: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            corridor_width_ratio: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub enabled: bool,
    pub warning_distance_ratio: f32,
    /// Minimum absolute horizontal Sobel response for an edge pixel.
    pub gradient_threshold: u16,
    /// Share of ROI rows that must be edge pixels for a column to vote.
    pub column_density_ratio: f32,
    pub min_votes: usize,
    /// Walkable-surface color mask, OpenCV HSV scale.
    pub max_saturation: u8,
    pub min_value: u8,
    pub morphology_kernel: usize,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_distance_ratio: 0.2,
            gradient_threshold: 50,
            column_density_ratio: 0.3,
            min_votes: 3,
            max_saturation: 50,
            min_value: 80,
            morphology_kernel: 5,
        }
    }
}

/// Optional JSON-lines log of the most critical detection of every frame.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordConfig {
    pub enabled: bool,
    pub path: PathBuf,
    /// Records are buffered and appended in batches of this size.
    pub flush_every: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/detections.jsonl"),
            flush_every: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StarlightConfig {
    pub profile: DeviceProfile,
    pub log_level: String,
    pub frame: FrameConfig,
    pub detection: DetectionConfig,
    pub priorities: PriorityTable,
    pub distance: DistanceBands,
    pub alert: AlertConfig,
    pub path: PathConfig,
    pub edge: EdgeConfig,
    pub record: RecordConfig,
}

impl Default for StarlightConfig {
    fn default() -> Self {
        Self::for_profile(DeviceProfile::Standard)
    }
}

impl StarlightConfig {
    pub fn for_profile(profile: DeviceProfile) -> Self {
        let ((width, height), fps_target, confidence, secondary_enabled, haptic_enabled) =
            match profile {
                DeviceProfile::Standard => ((1280, 720), 30, 0.45, true, false),
                DeviceProfile::SmartGlasses => ((320, 240), 10, 0.5, false, true),
                DeviceProfile::BodyCamera => ((416, 416), 15, 0.45, true, false),
                DeviceProfile::Headset => ((640, 480), 20, 0.45, true, true),
                DeviceProfile::RaspberryPi => ((320, 240), 5, 0.5, false, true),
            };

        let (frame_skip, cooldown_secs) = if profile.is_battery_constrained() {
            (if fps_target > 10 { 2 } else { 1 }, 4.0)
        } else {
            (1, 3.0)
        };

        Self {
            profile,
            log_level: "info".to_string(),
            frame: FrameConfig {
                width,
                height,
                fps_target,
                frame_skip,
            },
            detection: DetectionConfig {
                confidence_threshold: confidence,
                secondary_enabled,
                ..DetectionConfig::default()
            },
            priorities: PriorityTable::default(),
            distance: DistanceBands::default(),
            alert: AlertConfig {
                cooldown_secs,
                haptic_enabled,
                ..AlertConfig::default()
            },
            path: PathConfig::default(),
            edge: EdgeConfig::default(),
            record: RecordConfig::default(),
        }
    }

    /// Parses a TOML document. A `profile` key selects the preset the rest of
    /// the document is layered over.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let overrides: toml::Table = toml::from_str(text)?;
        let profile = match overrides.get("profile") {
            Some(value) => value.clone().try_into::<DeviceProfile>()?,
            None => DeviceProfile::Standard,
        };

        let mut merged = match toml::Value::try_from(Self::for_profile(profile))? {
            toml::Value::Table(table) => table,
            _ => return Err(anyhow!("configuration did not serialize to a table")),
        };
        merge_tables(&mut merged, overrides);

        let config: StarlightConfig = toml::Value::Table(merged).try_into()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading config from {:?}", path);
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        let config =
            Self::from_toml_str(&text).with_context(|| format!("invalid config {:?}", path))?;
        info!("Loaded config from {:?} (profile {:?})", path, config.profile);
        Ok(config)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(anyhow!(
                "frame size must be non-zero, got {}x{}",
                self.frame.width,
                self.frame.height
            ));
        }
        if self.frame.frame_skip == 0 {
            return Err(anyhow!("frame_skip must be at least 1"));
        }

        let ratios = [
            ("detection.confidence_threshold", self.detection.confidence_threshold),
            ("detection.iou_threshold", self.detection.iou_threshold),
            ("detection.fusion_iou_threshold", self.detection.fusion_iou_threshold),
            ("distance.immediate.height_ratio", self.distance.immediate.height_ratio),
            ("distance.immediate.bottom_ratio", self.distance.immediate.bottom_ratio),
            ("distance.near.height_ratio", self.distance.near.height_ratio),
            ("distance.near.bottom_ratio", self.distance.near.bottom_ratio),
            ("path.corridor_width_ratio", self.path.corridor_width_ratio),
            ("edge.warning_distance_ratio", self.edge.warning_distance_ratio),
            ("edge.column_density_ratio", self.edge.column_density_ratio),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(anyhow!("{} must be within (0, 1], got {}", name, value));
            }
        }

        if !(self.alert.cooldown_secs > 0.0 && self.alert.cooldown_secs.is_finite()) {
            return Err(anyhow!(
                "alert.cooldown_secs must be positive, got {}",
                self.alert.cooldown_secs
            ));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.alert.min_priority_for_audio) {
            return Err(anyhow!(
                "alert.min_priority_for_audio must be within {}..={}",
                MIN_PRIORITY,
                MAX_PRIORITY
            ));
        }
        if self.edge.min_votes == 0 {
            return Err(anyhow!("edge.min_votes must be at least 1"));
        }
        if self.edge.morphology_kernel == 0 || self.edge.morphology_kernel % 2 == 0 {
            return Err(anyhow!(
                "edge.morphology_kernel must be odd, got {}",
                self.edge.morphology_kernel
            ));
        }
        if self.record.flush_every == 0 {
            return Err(anyhow!("record.flush_every must be at least 1"));
        }
        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            if let toml::Value::Table(incoming) = value {
                merge_tables(existing, incoming);
                continue;
            }
        }
        base.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::property::hazard::HazardKind;

    #[test]
    fn defaults_match_standard_profile() {
        let config = StarlightConfig::default();
        assert_eq!(config.frame.width, 1280);
        assert_eq!(config.alert.cooldown(), Duration::from_secs(3));
        assert_eq!(config.alert.min_priority_for_audio, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn wearable_profiles_cool_down_longer() {
        for profile in [
            DeviceProfile::SmartGlasses,
            DeviceProfile::BodyCamera,
            DeviceProfile::Headset,
            DeviceProfile::RaspberryPi,
        ] {
            let config = StarlightConfig::for_profile(profile);
            assert_eq!(config.alert.cooldown_secs, 4.0, "{:?}", profile);
        }
        assert_eq!(StarlightConfig::for_profile(DeviceProfile::Headset).frame.frame_skip, 2);
        assert_eq!(StarlightConfig::for_profile(DeviceProfile::SmartGlasses).frame.frame_skip, 1);
    }

    #[test]
    fn toml_layers_over_profile() -> Result<()> {
        let config = StarlightConfig::from_toml_str(
            r#"
            profile = "headset"

            [alert]
            min_priority_for_audio = 3

            [priorities]
            person = 4
            scooter = 3
            "#,
        )?;
        assert_eq!(config.profile, DeviceProfile::Headset);
        assert_eq!(config.frame.width, 640);
        assert_eq!(config.alert.cooldown_secs, 4.0);
        assert_eq!(config.alert.min_priority_for_audio, 3);
        assert_eq!(config.priorities.priority(&HazardKind::Person), 4);
        assert_eq!(config.priorities.priority(&HazardKind::Pothole), 5);
        assert_eq!(
            config
                .priorities
                .priority(&HazardKind::Unclassified("scooter".into())),
            3
        );
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(StarlightConfig::from_toml_str("[path]\ncorridor_width_ratio = 1.5").is_err());
        assert!(StarlightConfig::from_toml_str("[frame]\nwidth = 0").is_err());
        assert!(StarlightConfig::from_toml_str("[alert]\ncooldown_secs = 0.0").is_err());
        assert!(StarlightConfig::from_toml_str("[priorities]\npothole = 9").is_err());
        assert!(StarlightConfig::from_toml_str("profile = \"toaster\"").is_err());
        assert!(StarlightConfig::from_toml_str("[record]\nflush_every = 0").is_err());
    }

    #[test]
    fn admit_applies_confidence_floor_and_cap() {
        let raw = |confidence: f32| RawDetection {
            kind: "person".into(),
            confidence,
            bbox: [0, 0, 10, 10].into(),
        };
        let config = DetectionConfig {
            max_detections: 2,
            ..DetectionConfig::default()
        };
        let admitted = config.admit(&[raw(0.5), raw(0.2), raw(0.9), raw(0.7)]);
        let confidences: Vec<f32> = admitted.iter().map(|d| d.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7]);
    }
}
