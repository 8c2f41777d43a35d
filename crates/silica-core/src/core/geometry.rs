use super::volume::VolumeMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("failed to read geometry description '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse geometry description '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("volume '{0}' is not defined in the geometry description")]
    UnknownVolume(String),

    #[error("volumes '{first}' and '{second}' overlap on layer {layer}")]
    OverlappingVolumes {
        first: String,
        second: String,
        layer: u32,
    },
}

/// One named sensitive volume of a detector description.
///
/// Lengths are in cm, by the same convention as the placement parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSpec {
    pub name: String,
    pub layer: u32,
    #[serde(rename = "half-thickness-cm")]
    pub half_thickness_cm: f64,
}

/// A detector geometry description loaded from a TOML file.
///
/// This stands in for the geometry source a subsystem's `gdml_path` parameter
/// points at; the detector builder validates the subsystem's volume selection
/// against it at construction time.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryDescription {
    #[serde(default, rename = "volume")]
    pub volumes: Vec<VolumeSpec>,
}

impl GeometryDescription {
    pub fn load(path: &Path) -> Result<Self, GeometryError> {
        let content = std::fs::read_to_string(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| GeometryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn volume(&self, name: &str) -> Option<&VolumeSpec> {
        self.volumes.iter().find(|volume| volume.name == name)
    }

    /// Resolves a subsystem's volume selection against this description.
    ///
    /// `VolumeMode::None` selects every described volume; the other modes
    /// select by name and fail on names the description does not define.
    pub fn select(&self, mode: &VolumeMode) -> Result<Vec<VolumeSpec>, GeometryError> {
        match mode {
            VolumeMode::None => Ok(self.volumes.clone()),
            VolumeMode::Assembly(names) => names
                .iter()
                .map(|name| {
                    self.volume(name)
                        .cloned()
                        .ok_or_else(|| GeometryError::UnknownVolume(name.clone()))
                })
                .collect(),
            VolumeMode::Logical(name) => {
                let volume = self
                    .volume(name)
                    .cloned()
                    .ok_or_else(|| GeometryError::UnknownVolume(name.clone()))?;
                Ok(vec![volume])
            }
        }
    }

    /// Verifies that no two volumes claim the same layer index.
    ///
    /// Used by detector builders when overlap checking is requested.
    pub fn check_overlaps(volumes: &[VolumeSpec]) -> Result<(), GeometryError> {
        for (i, first) in volumes.iter().enumerate() {
            if let Some(second) = volumes[i + 1..].iter().find(|v| v.layer == first.layer) {
                return Err(GeometryError::OverlappingVolumes {
                    first: first.name.clone(),
                    second: second.name.clone(),
                    layer: first.layer,
                });
            }
        }
        Ok(())
    }
}
