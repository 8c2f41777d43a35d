use nalgebra::Point3;

/// Fixed prefix of hit-container node names.
///
/// `"G4HIT_" + subsystem_name` is a wire contract: downstream evaluation
/// components discover hit data by this exact name.
pub const HIT_NODE_PREFIX: &str = "G4HIT_";

/// Returns the hit-container node name for a subsystem.
pub fn hit_node_name(subsystem: &str) -> String {
    format!("{HIT_NODE_PREFIX}{subsystem}")
}

/// One simulated interaction record.
///
/// Positions are in cm, energy deposit in GeV, matching the parameter
/// conventions of the detector builders.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub hit_id: u64,
    pub track_id: i64,
    pub layer: u32,
    pub entry: Point3<f64>,
    pub exit: Point3<f64>,
    pub edep: f64,
}

/// Per-subsystem collection of simulated interaction records.
///
/// Created at most once per run by the owning subsystem, written by its
/// stepping hook during event processing, and read by downstream evaluation
/// components that look the container up by its node name.
#[derive(Debug, Clone, Default)]
pub struct HitContainer {
    name: String,
    hits: Vec<Hit>,
    next_hit_id: u64,
}

impl HitContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a hit, assigning it the next container-unique id.
    ///
    /// Ids stay monotonic across [`reset`](Self::reset) so hits from
    /// different events are never confused.
    pub fn add_hit(&mut self, mut hit: Hit) -> u64 {
        let id = self.next_hit_id;
        hit.hit_id = id;
        self.next_hit_id += 1;
        self.hits.push(hit);
        id
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Total energy deposited across all currently held hits, in GeV.
    pub fn total_edep(&self) -> f64 {
        self.hits.iter().map(|hit| hit.edep).sum()
    }

    /// Clears the recorded hits between events. The id counter is preserved.
    pub fn reset(&mut self) {
        self.hits.clear();
    }
}
