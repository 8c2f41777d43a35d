use crate::core::geometry::{GeometryDescription, VolumeSpec};
use crate::core::hits::{Hit, hit_node_name};
use crate::core::params::{ParamError, ParameterStore};
use crate::core::tree::{NodeId, NodeKind, NodeTree};
use crate::engine::actions::{
    Detector, DetectorContext, DetectorModel, DisplayAction, SteppingAction,
};
use crate::engine::error::EngineError;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};
use std::any::Any;
use std::path::Path;
use tracing::{debug, info};

/// Mean energy loss of a minimum-ionizing particle in silicon, GeV per cm.
const MIP_EDEP_PER_CM_GEV: f64 = 3.87e-3;

/// Sentinel default for the geometry-description path parameter; detector
/// construction fails until a caller overrides it.
pub const INVALID_GEOMETRY_PATH: &str = "DefaultParameters-InvalidPath";

fn placement_from_params(params: &ParameterStore) -> Result<Isometry3<f64>, ParamError> {
    let translation = Translation3::new(
        params.get_double("place_x")?,
        params.get_double("place_y")?,
        params.get_double("place_z")?,
    );
    let rotation = UnitQuaternion::from_euler_angles(
        params.get_double("rot_x")?.to_radians(),
        params.get_double("rot_y")?.to_radians(),
        params.get_double("rot_z")?.to_radians(),
    );
    Ok(Isometry3::from_parts(translation, rotation))
}

/// Model for a layered silicon tracker described by a TOML geometry file.
///
/// Declares the `gdml_path` string parameter on top of the base subsystem
/// schema. At run initialization it loads the description, resolves the
/// subsystem's volume selection against it, and derives the detector
/// placement from the `place_*` (cm) and `rot_*` (deg) parameters.
pub struct SiliconTrackerModel;

impl DetectorModel for SiliconTrackerModel {
    fn register_defaults(&self, params: &mut ParameterStore) -> Result<(), ParamError> {
        params.set_default_string("gdml_path", INVALID_GEOMETRY_PATH)
    }

    fn build_detector(&self, ctx: &DetectorContext<'_>) -> Result<Box<dyn Detector>, EngineError> {
        let path = ctx.params.get_string("gdml_path")?;
        let description = GeometryDescription::load(Path::new(path))?;
        let volumes = description.select(ctx.volumes)?;
        if ctx.overlap_check {
            GeometryDescription::check_overlaps(&volumes)?;
        }
        let placement = placement_from_params(ctx.params)?;
        info!(
            subsystem = %ctx.subsystem_name,
            volumes = volumes.len(),
            "constructed silicon tracker geometry"
        );
        Ok(Box::new(SiliconTrackerDetector {
            name: ctx.subsystem_name.to_string(),
            volumes,
            placement,
        }))
    }

    fn build_stepping_action(
        &self,
        detector: &dyn Detector,
        _params: &ParameterStore,
    ) -> Result<Box<dyn SteppingAction>, EngineError> {
        let tracker = detector
            .as_any()
            .downcast_ref::<SiliconTrackerDetector>()
            .ok_or_else(|| EngineError::Stepping {
                name: detector.name().to_string(),
                message: "detector was not built by the silicon tracker model".to_string(),
            })?;
        let crossings = tracker
            .volumes
            .iter()
            .map(|volume| {
                let (entry, exit) = tracker.crossing(volume);
                let edep = 2.0 * volume.half_thickness_cm * MIP_EDEP_PER_CM_GEV;
                LayerCrossing {
                    layer: volume.layer,
                    entry,
                    exit,
                    edep,
                }
            })
            .collect();
        Ok(Box::new(SiliconTrackerStepping {
            subsystem: detector.name().to_string(),
            hit_node: hit_node_name(detector.name()),
            crossings,
            resolved: None,
        }))
    }

    fn build_display_action(&self, subsystem_name: &str) -> Box<dyn DisplayAction> {
        Box::new(SiliconTrackerDisplay {
            subsystem: subsystem_name.to_string(),
        })
    }
}

pub struct SiliconTrackerDetector {
    name: String,
    volumes: Vec<VolumeSpec>,
    placement: Isometry3<f64>,
}

impl SiliconTrackerDetector {
    pub fn volumes(&self) -> &[VolumeSpec] {
        &self.volumes
    }

    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }

    /// Entry and exit points of a straight normal crossing of one layer, in
    /// the placed frame.
    fn crossing(&self, volume: &VolumeSpec) -> (Point3<f64>, Point3<f64>) {
        let entry = Point3::new(0.0, 0.0, -volume.half_thickness_cm);
        let exit = Point3::new(0.0, 0.0, volume.half_thickness_cm);
        (self.placement * entry, self.placement * exit)
    }
}

impl Detector for SiliconTrackerDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn print(&self, what: &str) {
        if what == "ALL" || what == "GEO" {
            info!(detector = %self.name, "placement: {}", self.placement);
            for volume in &self.volumes {
                info!(
                    detector = %self.name,
                    volume = %volume.name,
                    layer = volume.layer,
                    half_thickness_cm = volume.half_thickness_cm,
                    "sensitive volume"
                );
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct LayerCrossing {
    layer: u32,
    entry: Point3<f64>,
    exit: Point3<f64>,
    edep: f64,
}

/// Records one crossing per selected volume per event.
///
/// The real stepping is driven by a transport engine outside this crate; this
/// hook stands in with a deterministic minimum-ionizing crossing so the hit
/// path is exercised end to end.
struct SiliconTrackerStepping {
    subsystem: String,
    hit_node: String,
    crossings: Vec<LayerCrossing>,
    resolved: Option<NodeId>,
}

impl SteppingAction for SiliconTrackerStepping {
    fn resolve_interfaces(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
        self.resolved = tree.find_first(NodeKind::Hits, &self.hit_node, tree.root());
        if self.resolved.is_none() {
            return Err(EngineError::Stepping {
                name: self.subsystem.clone(),
                message: format!("hit container '{}' not found in tree", self.hit_node),
            });
        }
        Ok(())
    }

    fn record_event(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
        let id = self.resolved.ok_or_else(|| EngineError::Stepping {
            name: self.subsystem.clone(),
            message: "interfaces were not resolved for this event".to_string(),
        })?;
        let container = tree.hits_mut(id).ok_or_else(|| EngineError::Stepping {
            name: self.subsystem.clone(),
            message: format!("node '{}' lost its hit payload", self.hit_node),
        })?;
        for crossing in &self.crossings {
            container.add_hit(Hit {
                hit_id: 0,
                track_id: 1,
                layer: crossing.layer,
                entry: crossing.entry,
                exit: crossing.exit,
                edep: crossing.edep,
            });
        }
        Ok(())
    }
}

struct SiliconTrackerDisplay {
    subsystem: String,
}

impl DisplayAction for SiliconTrackerDisplay {
    fn apply(&mut self) {
        debug!(subsystem = %self.subsystem, "applied display settings");
    }
}
