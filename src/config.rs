// config.rs — 启动参数
//
// 读取顺序：默认值 → JSON 配置文件（--config <path> 或环境变量 PANORAMA_CONFIG）→ 命令行覆盖。
//
// 命令行：
// - --config <path>
// - --projection <cylindrical|spherical>
// - --control <touch|motion|combo>
// - --image <path>
// - --motion <none|sweep|replay:path>

use crate::error::ConfigError;
use crate::gesture::DEFAULT_PAN_SPEED;
use crate::panorama::{ControlMode, ProjectionMode};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_ENV: &str = "PANORAMA_CONFIG";

/// Which simulated motion source the desktop viewer should attach.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionSetting {
    #[default]
    None,
    Sweep,
    Replay(PathBuf),
}

impl FromStr for MotionSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(MotionSetting::None),
            "sweep" => Ok(MotionSetting::Sweep),
            _ => match s.strip_prefix("replay:") {
                Some(path) if !path.is_empty() => Ok(MotionSetting::Replay(PathBuf::from(path))),
                _ => Err(ConfigError::UnknownValue {
                    key: "motion",
                    value: s.to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub projection: ProjectionMode,
    pub control: ControlMode,
    /// Radians per point of drag, [x, y].
    pub pan_speed: [f32; 2],
    /// Radians, [x, y, z].
    pub initial_offset: [f32; 3],
    pub vertical_fov_deg: f32,
    pub motion_interval_ms: u64,
    pub deceleration: bool,
    pub image: Option<PathBuf>,
    pub motion: MotionSetting,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::default(),
            control: ControlMode::default(),
            pan_speed: DEFAULT_PAN_SPEED.to_array(),
            initial_offset: [0.0; 3],
            vertical_fov_deg: 70.0,
            motion_interval_ms: 15,
            deceleration: true,
            image: None,
            motion: MotionSetting::None,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the configuration from process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let env_path = std::env::var(CONFIG_ENV).ok().filter(|v| !v.trim().is_empty());
        Self::resolve(&args, env_path)
    }

    /// `args` excludes the program name.
    pub fn resolve(args: &[String], env_path: Option<String>) -> Result<Self, ConfigError> {
        let mut config_path = env_path.map(PathBuf::from);
        let mut overrides: Vec<(&str, &str)> = Vec::new();

        let mut it = args.iter();
        while let Some(a) = it.next() {
            let key = a.as_str();
            match key {
                "--config" | "--projection" | "--control" | "--image" | "--motion" => {
                    let Some(value) = it.next() else {
                        return Err(ConfigError::UnknownValue {
                            key: "argument",
                            value: format!("{key} needs a value"),
                        });
                    };
                    if key == "--config" {
                        config_path = Some(PathBuf::from(value));
                    } else {
                        overrides.push((key, value.as_str()));
                    }
                }
                _ => log::warn!("ignoring unknown argument {a:?}"),
            }
        }

        let mut config = match config_path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        for (key, value) in overrides {
            match key {
                "--projection" => config.projection = value.parse()?,
                "--control" => config.control = value.parse()?,
                "--image" => config.image = Some(PathBuf::from(value)),
                "--motion" => config.motion = value.parse()?,
                _ => {}
            }
        }
        Ok(config)
    }

    /// Problems worth telling the user about; none of them are fatal.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.control.is_supported_with(self.projection) {
            warnings.push(format!(
                "{:?} control is not supported for {:?} panoramas; touch input will be ignored",
                self.control, self.projection
            ));
        }
        if self.motion_interval_ms == 0 {
            warnings.push("motion_interval_ms is 0; using 1 ms".to_string());
        }
        if !(1.0..179.0).contains(&self.vertical_fov_deg) {
            warnings.push(format!(
                "vertical_fov_deg {} is outside 1..179",
                self.vertical_fov_deg
            ));
        }
        warnings
    }

    pub fn pan_speed(&self) -> Vec2 {
        Vec2::from_array(self.pan_speed)
    }

    pub fn initial_offset(&self) -> Vec3 {
        Vec3::from_array(self.initial_offset)
    }

    pub fn motion_interval(&self) -> Duration {
        Duration::from_millis(self.motion_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::resolve(&[], None).unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.motion_interval(), Duration::from_millis(15));
        assert_eq!(config.pan_speed(), DEFAULT_PAN_SPEED);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_file_then_cli_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "projection": "spherical", "control": "motion", "initial_offset": [0.0, 1.5, 0.0] }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = ViewerConfig::resolve(
            &args(&["--config", &path, "--control", "touch", "--motion", "replay:rec.json"]),
            None,
        )
        .unwrap();
        assert_eq!(config.projection, ProjectionMode::Spherical);
        assert_eq!(config.control, ControlMode::Touch);
        assert_eq!(config.initial_offset(), Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(config.motion, MotionSetting::Replay(PathBuf::from("rec.json")));
    }

    #[test]
    fn test_env_path_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "deceleration": false }}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();
        let config = ViewerConfig::resolve(&[], Some(path)).unwrap();
        assert!(!config.deceleration);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "zoom": 2 }}"#).unwrap();
        let err = ViewerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ViewerConfig::load(Path::new("/nonexistent/panorama.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bad_values() {
        assert!(ViewerConfig::resolve(&args(&["--projection", "cubic"]), None).is_err());
        assert!(ViewerConfig::resolve(&args(&["--motion", "replay:"]), None).is_err());
        assert!(ViewerConfig::resolve(&args(&["--control"]), None).is_err());
    }

    #[test]
    fn test_spherical_combo_warns() {
        let config = ViewerConfig {
            projection: ProjectionMode::Spherical,
            control: ControlMode::Combo,
            ..ViewerConfig::default()
        };
        assert_eq!(config.validate().len(), 1);
    }
}
