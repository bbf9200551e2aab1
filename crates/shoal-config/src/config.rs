use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "SHOAL_CONFIG";
pub const CONFIG_FILE: &str = "shoal.toml";
pub const MAX_FISH: usize = 256;

/// Top-level configuration loaded from `shoal.toml`. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShoalConfig {
    pub school: SchoolConfig,
    pub rig: RigConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// How many fish, and what colours they wear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchoolConfig {
    pub fish_count: usize,
    /// Fish ids below this draw a palette colour; the rest use `base_color`.
    pub colorful_count: usize,
    pub palette: Vec<u32>,
    pub base_color: u32,
    /// Fixed seed for reproducible runs. Entropy when unset.
    pub seed: Option<u64>,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            fish_count: 10,
            colorful_count: 3,
            palette: vec![
                0x01befe, 0xffdd00, 0xff7d00, 0xff006d, 0xadff02, 0x8f00ff, 0xff0000,
            ],
            base_color: 0x8fa3b8,
            seed: None,
        }
    }
}

/// Skeleton proportions and tail motion. Angles are degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigConfig {
    pub spine_bones: usize,
    pub fish_width: f64,
    pub fish_height: f64,
    pub tail_swing_max_bend: f64,
    pub tail_swing_follow_offset: f64,
    pub tail_speed_decay: f64,
    pub spine_blend_decay: f64,
    pub turn_pose_angle: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            spine_bones: 5,
            fish_width: 40.0,
            fish_height: 120.0,
            tail_swing_max_bend: 6.0,
            tail_swing_follow_offset: 50.0,
            tail_speed_decay: 1.5,
            spine_blend_decay: 3.0,
            turn_pose_angle: 13.0,
        }
    }
}

/// Terminal canvas glyph set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Braille,
    HalfBlock,
    Dot,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// World pixels covered by one terminal column.
    pub pixels_per_column: u32,
    /// World pixels covered by one terminal row.
    pub pixels_per_row: u32,
    pub frame_rate: u32,
    /// Overrides marker detection when set.
    pub marker: Option<MarkerKind>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            pixels_per_column: 8,
            pixels_per_row: 16,
            frame_rate: 60,
            marker: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub filter: String,
    pub retention_days: u64,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            retention_days: 7,
            directory: None,
        }
    }
}

impl ShoalConfig {
    /// Parse and validate config TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse shoal config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read shoal config at {}", path.display()))?;

        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid shoal config at {}", path.display()))
    }

    /// Load from `SHOAL_CONFIG`, else the user config dir, else defaults.
    pub fn load() -> Result<Self> {
        match config_path()? {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Validate ranges and cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let school = &self.school;
        if school.fish_count == 0 || school.fish_count > MAX_FISH {
            bail!("school.fish_count must be between 1 and {MAX_FISH}, got {}", school.fish_count);
        }
        if school.colorful_count > school.fish_count {
            bail!(
                "school.colorful_count ({}) exceeds school.fish_count ({})",
                school.colorful_count,
                school.fish_count
            );
        }
        if school.colorful_count > school.palette.len() {
            bail!(
                "school.colorful_count ({}) exceeds the {} palette colours",
                school.colorful_count,
                school.palette.len()
            );
        }
        validate_palette("school.palette", &school.palette)?;
        validate_color("school.base_color", school.base_color)?;

        let rig = &self.rig;
        if rig.spine_bones == 0 {
            bail!("rig.spine_bones must be at least 1");
        }
        validate_positive("rig.fish_width", rig.fish_width)?;
        validate_positive("rig.fish_height", rig.fish_height)?;
        validate_positive("rig.tail_speed_decay", rig.tail_speed_decay)?;
        validate_positive("rig.spine_blend_decay", rig.spine_blend_decay)?;
        validate_finite("rig.tail_swing_max_bend", rig.tail_swing_max_bend)?;
        validate_finite("rig.tail_swing_follow_offset", rig.tail_swing_follow_offset)?;
        validate_finite("rig.turn_pose_angle", rig.turn_pose_angle)?;

        let display = &self.display;
        if display.pixels_per_column == 0 || display.pixels_per_row == 0 {
            bail!("display.pixels_per_column and display.pixels_per_row must be non-zero");
        }
        if !(1..=240).contains(&display.frame_rate) {
            bail!("display.frame_rate must be between 1 and 240, got {}", display.frame_rate);
        }

        if self.logging.filter.trim().is_empty() {
            bail!("logging.filter must not be empty");
        }

        Ok(())
    }
}

/// Resolve which config file to read, if any.
///
/// A `SHOAL_CONFIG` path that does not exist is an error; a missing file in
/// the default location is not.
pub fn config_path() -> Result<Option<PathBuf>> {
    if let Ok(raw) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(raw);
        if !path.is_file() {
            bail!("{CONFIG_ENV} points at {}, which is not a file", path.display());
        }
        return Ok(Some(path));
    }
    Ok(dirs::config_dir()
        .map(|dir| dir.join("shoal").join(CONFIG_FILE))
        .filter(|path| path.is_file()))
}

fn validate_color(field: &str, value: u32) -> Result<()> {
    if value > 0xff_ffff {
        bail!("{field} must be a 24-bit 0xRRGGBB colour, got {value:#x}");
    }
    Ok(())
}

fn validate_palette(field: &str, values: &[u32]) -> Result<()> {
    let mut seen = BTreeSet::new();

    for &value in values {
        validate_color(field, value)?;
        if !seen.insert(value) {
            bail!("{field} contains duplicate entry {value:#08x}");
        }
    }

    Ok(())
}

fn validate_finite(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        bail!("{field} must be a finite number");
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> Result<()> {
    validate_finite(field, value)?;
    if value <= 0.0 {
        bail!("{field} must be greater than zero, got {value}");
    }
    Ok(())
}
