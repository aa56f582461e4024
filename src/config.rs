use std::path::PathBuf;

use log::{debug, info};
use serde::Deserialize;

use crate::backend::BackendKind;
use crate::fit::{BASE_DPI, FitMode, FitOptions};

// ---------------------------------------------------------------------------
// ConfigFile: deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub fit: Option<FitMode>,
    pub resolution: Option<f32>,
    pub rotation: Option<f32>,
    pub ignore_errors: Option<bool>,
    pub strict_ranges: Option<bool>,
    pub background: Option<[u8; 3]>,
    pub backend: Option<BackendKind>,
    #[serde(default)]
    pub window: WindowConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct WindowConfigFile {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub title_bar: Option<u32>,
    pub border: Option<u32>,
}

// ---------------------------------------------------------------------------
// Config: resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub fit: FitOptions,
    pub ignore_errors: bool,
    pub strict_ranges: bool,
    pub background: [u8; 3],
    pub backend: BackendKind,
    pub window: WindowConfig,
}

pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    /// Compositor chrome: title bar height and border width in pixels.
    pub title_bar: u32,
    pub border: u32,
}

/// Values given on the command line; `None`/`false` leaves the config file in charge.
#[derive(Default)]
pub struct CliOverrides {
    pub stretch: bool,
    pub resolution: Option<f32>,
    pub rotation: Option<f32>,
    pub ignore_errors: bool,
    pub strict_ranges: bool,
    pub backend: Option<BackendKind>,
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, cli: &CliOverrides) {
        if cli.stretch {
            debug!("config: CLI override fit=stretch");
            self.fit = Some(FitMode::Stretch);
        }
        if let Some(v) = cli.resolution {
            debug!("config: CLI override resolution={v}");
            self.resolution = Some(v);
        }
        if let Some(v) = cli.rotation {
            debug!("config: CLI override rotation={v}");
            self.rotation = Some(v);
        }
        if cli.ignore_errors {
            debug!("config: CLI override ignore_errors=true");
            self.ignore_errors = Some(true);
        }
        if cli.strict_ranges {
            debug!("config: CLI override strict_ranges=true");
            self.strict_ranges = Some(true);
        }
        if let Some(v) = cli.backend {
            debug!("config: CLI override backend={v:?}");
            self.backend = Some(v);
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    ///
    /// Any configured resolution counts as explicit: it then takes precedence
    /// over fitting for pages that already fit the viewport.
    pub fn resolve(self) -> Config {
        let config = Config {
            fit: FitOptions {
                mode: self.fit.unwrap_or_default(),
                resolution: self.resolution.unwrap_or(BASE_DPI),
                rotation: self.rotation.unwrap_or(0.0),
                explicit_resolution: self.resolution.is_some(),
            },
            ignore_errors: self.ignore_errors.unwrap_or(false),
            strict_ranges: self.strict_ranges.unwrap_or(false),
            background: self.background.unwrap_or([0x77, 0x77, 0x77]),
            backend: self.backend.unwrap_or_default(),
            window: WindowConfig {
                width: self.window.width.unwrap_or(640),
                height: self.window.height.unwrap_or(480),
                min_width: self.window.min_width.unwrap_or(120),
                min_height: self.window.min_height.unwrap_or(120),
                title_bar: self.window.title_bar.unwrap_or(24),
                border: self.window.border.unwrap_or(1),
            },
        };
        info!(
            "config: resolved fit={:?}, resolution={} (explicit={}), rotation={}, \
             ignore_errors={}, strict_ranges={}, backend={:?}, window={}x{} (min {}x{})",
            config.fit.mode,
            config.fit.resolution,
            config.fit.explicit_resolution,
            config.fit.rotation,
            config.ignore_errors,
            config.strict_ranges,
            config.backend,
            config.window.width,
            config.window.height,
            config.window.min_width,
            config.window.min_height,
        );
        config
    }
}

/// Resolve the XDG config path for fitview.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("fitview").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        let resolved = cfg.resolve();
        assert_eq!(resolved.fit.mode, FitMode::Aspect);
        assert_eq!(resolved.fit.resolution, 72.0);
        assert!(!resolved.fit.explicit_resolution);
        assert!(!resolved.ignore_errors);
        assert_eq!(resolved.background, [0x77, 0x77, 0x77]);
        assert_eq!(resolved.backend, BackendKind::Terminal);
        assert_eq!(resolved.window.min_width, 120);
    }

    #[test]
    fn partial_toml() {
        let text = r#"
            fit = "stretch"
            background = [255, 255, 255]
            backend = "compositor"
            [window]
            width = 800
        "#;
        let cfg: ConfigFile = toml::from_str(text).unwrap();
        let resolved = cfg.resolve();
        assert_eq!(resolved.fit.mode, FitMode::Stretch);
        assert_eq!(resolved.background, [255, 255, 255]);
        assert_eq!(resolved.backend, BackendKind::Compositor);
        assert_eq!(resolved.window.width, 800);
        // Defaults for unspecified fields
        assert_eq!(resolved.window.height, 480);
        assert_eq!(resolved.fit.rotation, 0.0);
    }

    #[test]
    fn configured_resolution_is_explicit() {
        let cfg: ConfigFile = toml::from_str("resolution = 144.0").unwrap();
        let resolved = cfg.resolve();
        assert_eq!(resolved.fit.resolution, 144.0);
        assert!(resolved.fit.explicit_resolution);
    }

    #[test]
    fn invalid_toml() {
        let text = "this is not valid toml [[[";
        let result = toml::from_str::<ConfigFile>(text);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fit_mode_is_rejected() {
        assert!(toml::from_str::<ConfigFile>(r#"fit = "zoom""#).is_err());
    }

    #[test]
    fn cli_overrides() {
        let mut cfg: ConfigFile = toml::from_str("rotation = 90.0\nbackend = \"window\"").unwrap();
        cfg.merge_cli(&CliOverrides {
            stretch: true,
            rotation: Some(180.0),
            ignore_errors: true,
            ..CliOverrides::default()
        });
        let resolved = cfg.resolve();
        assert_eq!(resolved.fit.mode, FitMode::Stretch);
        assert_eq!(resolved.fit.rotation, 180.0); // CLI wins
        assert!(resolved.ignore_errors);
        assert_eq!(resolved.backend, BackendKind::Window); // config file, no CLI value
        assert!(!resolved.strict_ranges);
    }
}
