//! Shader stages

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Vertex,
    TessCtrl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

/// Number of shader stages
pub const N_STAGES: usize = 6;

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; N_STAGES] = [Stage::Vertex, Stage::TessCtrl, Stage::TessEval, Stage::Geometry, Stage::Fragment, Stage::Compute];

    /// Position of the stage in [`Stage::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used for the stage in script section headers
    pub fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::TessCtrl => "tessellation control",
            Stage::TessEval => "tessellation evaluation",
            Stage::Geometry => "geometry",
            Stage::Fragment => "fragment",
            Stage::Compute => "compute",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = UnknownStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL.into_iter().find(|stage| stage.name() == s).ok_or_else(|| UnknownStageError(s.to_string()))
    }
}

/// A set of stages, such as the stages a script provides shaders for
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageSet(u8);

impl StageSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self(0)
    }

    /// Adds a stage to the set
    pub fn insert(&mut self, stage: Stage) {
        self.0 |= 1 << stage.index();
    }

    /// Returns true if the stage is in the set
    pub fn contains(&self, stage: Stage) -> bool {
        self.0 & (1 << stage.index()) != 0
    }

    /// Returns true if no stage is in the set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the stages in pipeline order
    pub fn iter(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ALL.into_iter().filter(|&stage| self.contains(stage))
    }
}

impl FromIterator<Stage> for StageSet {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        let mut set = StageSet::new();
        for stage in iter {
            set.insert(stage);
        }
        set
    }
}

/// Error returned when a stage name is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStageError(pub String);

impl fmt::Display for UnknownStageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown shader stage: {}", self.0)
    }
}

impl std::error::Error for UnknownStageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        assert_eq!(Stage::Compute.index(), N_STAGES - 1);
    }

    #[test]
    fn test_stage_set() {
        let set = [Stage::Fragment, Stage::Vertex, Stage::Fragment].into_iter().collect::<StageSet>();
        assert!(set.contains(Stage::Vertex));
        assert!(!set.contains(Stage::Compute));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Stage::Vertex, Stage::Fragment]);
        assert!(StageSet::new().is_empty());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!("tessellation control".parse::<Stage>().unwrap(), Stage::TessCtrl);
        assert_eq!("fragment".parse::<Stage>().unwrap(), Stage::Fragment);
        assert_eq!("pixel".parse::<Stage>().unwrap_err().to_string(), "Unknown shader stage: pixel");
    }
}
