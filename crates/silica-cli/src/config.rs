use crate::error::{CliError, Result};
use serde::Deserialize;
use silica::engine::detectors::silicon_tracker::SiliconTrackerModel;
use silica::engine::error::EngineError;
use silica::engine::subsystem::{DetectorSubsystem, Subsystem};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level run description loaded from TOML.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunDescription {
    /// Default event count; `--events` on the command line overrides it.
    #[serde(default)]
    pub events: Option<u64>,

    #[serde(default, rename = "subsystem")]
    pub subsystems: Vec<SubsystemDescription>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct SubsystemDescription {
    pub name: String,

    #[serde(default)]
    pub active: bool,

    #[serde(rename = "overlap-check", default)]
    pub overlap_check: bool,

    /// Path to the geometry description TOML consumed by the detector builder.
    pub geometry: PathBuf,

    /// Placement in cm.
    #[serde(default)]
    pub place: [f64; 3],

    /// Rotation in deg.
    #[serde(default)]
    pub rotate: [f64; 3],

    /// Assembly volume names; mutually exclusive with `logical-volume`.
    #[serde(rename = "assembly-volumes", default)]
    pub assembly_volumes: Vec<String>,

    /// Single logical volume name; mutually exclusive with `assembly-volumes`.
    #[serde(rename = "logical-volume", default)]
    pub logical_volume: Option<String>,
}

pub fn load(path: &Path) -> Result<RunDescription> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let description: RunDescription =
        toml::from_str(&content).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
    if description.subsystems.is_empty() {
        return Err(CliError::Config(format!(
            "run description '{}' declares no subsystems",
            path.display()
        )));
    }
    debug!(
        subsystems = description.subsystems.len(),
        "loaded run description"
    );
    Ok(description)
}

/// Builds the configured subsystem.
///
/// Volume selection goes through the core selector, so an
/// assembly/logical conflict aborts with the core diagnostic.
pub fn build_subsystem(description: &SubsystemDescription) -> Result<Box<dyn Subsystem>> {
    let mut sub = DetectorSubsystem::new(&description.name, Box::new(SiliconTrackerModel))
        .map_err(CliError::Engine)?;

    sub.set_active(description.active)
        .map_err(EngineError::from)?;
    sub.set_overlap_check(description.overlap_check);

    let geometry = description.geometry.to_string_lossy();
    sub.set_string("gdml_path", &geometry)
        .map_err(EngineError::from)?;

    let [x, y, z] = description.place;
    sub.set_double("place_x", x)
        .map_err(EngineError::from)?;
    sub.set_double("place_y", y)
        .map_err(EngineError::from)?;
    sub.set_double("place_z", z)
        .map_err(EngineError::from)?;

    let [rx, ry, rz] = description.rotate;
    sub.set_double("rot_x", rx)
        .map_err(EngineError::from)?;
    sub.set_double("rot_y", ry)
        .map_err(EngineError::from)?;
    sub.set_double("rot_z", rz)
        .map_err(EngineError::from)?;

    for volume in &description.assembly_volumes {
        sub.add_assembly_volume(volume)
            .map_err(EngineError::from)?;
    }
    if let Some(logical) = &description.logical_volume {
        sub.use_logical_volume(logical)
            .map_err(EngineError::from)?;
    }

    Ok(Box::new(sub))
}
