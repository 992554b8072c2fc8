use crate::config::ViewerConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    fly: Option<bool>,
    speed: Option<f32>,
    scene: Option<PathBuf>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // program name
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "fly" => overrides.fly = Some(parse_bool_flag("fly", &value)?),
                "speed" => {
                    let speed = value.parse::<f32>().with_context(|| format!("Invalid speed '{value}'"))?;
                    if !speed.is_finite() {
                        bail!("Invalid speed '{value}'. Use a finite number of units per second.");
                    }
                    overrides.speed = Some(speed);
                }
                "scene" => overrides.scene = Some(PathBuf::from(value)),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --width, --height, --fly, --speed, --scene."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn into_config_overrides(self) -> ViewerConfigOverrides {
        ViewerConfigOverrides {
            config_path: self.config,
            width: self.width,
            height: self.height,
            fly_mode: self.fly,
            speed: self.speed,
            scene_path: self.scene,
        }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_and_navigation_flags() {
        let args = ["walker", "--width", "1600", "--height", "900", "--fly", "on", "--speed", "4.5"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.width, Some(1600));
        assert_eq!(overrides.height, Some(900));
        assert_eq!(overrides.fly_mode, Some(true));
        assert_eq!(overrides.speed, Some(4.5));
        assert!(overrides.scene_path.is_none());
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["walker", "--fly", "yes", "--scene", "a.glb", "--fly", "off", "--scene", "b.glb"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.fly_mode, Some(false));
        assert_eq!(overrides.scene_path, Some(PathBuf::from("b.glb")));
    }

    #[test]
    fn config_path_is_carried_through() {
        let overrides =
            CliOverrides::parse(["walker", "--config", "alt/viewer.json"]).expect("parse").into_config_overrides();
        assert_eq!(overrides.config_path(), std::path::Path::new("alt/viewer.json"));
        assert!(overrides.applied_fields().is_empty());
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["walker", "--speed"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_values() {
        let err = CliOverrides::parse(["walker", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        let err = CliOverrides::parse(["walker", "--fly", "sometimes"]).unwrap_err();
        assert!(err.to_string().contains("Invalid fly value"));
        assert!(CliOverrides::parse(["walker", "--speed", "NaN"]).is_err());
    }
}
