//! Distinct pipelines of a script
//!
//! Scripts may declare the same state more than once. A [`PipelineSet`] keeps one
//! key per distinct pipeline so each is built only once, and maps every declared
//! key to the pipeline that serves it.

use crate::pipeline_key::{PipelineKey, PipelineKind};
use crate::script::Script;
use crate::stage::StageSet;

/// Deduplicated pipeline keys of one script
#[derive(Debug, Clone)]
pub struct PipelineSet {
    keys: Vec<PipelineKey>,
    indices: Vec<usize>,
    stages: StageSet,
}

impl PipelineSet {
    /// Collects the distinct keys of a script
    pub fn new(script: &Script) -> Self {
        Self::from_keys(script.pipeline_keys(), script.stages())
    }

    /// Collects the distinct keys among `requested`
    ///
    /// # Arguments
    /// * `requested` - Keys in declaration order
    /// * `stages` - Stages that have a shader
    pub fn from_keys(requested: &[PipelineKey], stages: StageSet) -> Self {
        let mut keys: Vec<PipelineKey> = Vec::new();
        let mut indices = Vec::with_capacity(requested.len());

        for key in requested {
            let index = match keys.iter().position(|existing| existing == key) {
                Some(index) => index,
                None => {
                    keys.push(key.clone());
                    keys.len() - 1
                }
            };
            indices.push(index);
        }

        tracing::debug!(requested = requested.len(), distinct = keys.len(), "collected pipeline keys");

        Self { keys, indices, stages }
    }

    /// Distinct keys, in order of first declaration
    pub fn keys(&self) -> &[PipelineKey] {
        &self.keys
    }

    /// Index into [`keys`](Self::keys) of the pipeline serving the `requested`-th declared key
    pub fn pipeline_index(&self, requested: usize) -> Option<usize> {
        self.indices.get(requested).copied()
    }

    /// Union of the stages that have a shader
    pub fn stages(&self) -> StageSet {
        self.stages
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of distinct graphics pipelines
    pub fn graphics_count(&self) -> usize {
        self.keys.iter().filter(|key| key.kind() == PipelineKind::Graphics).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptBuilder;
    use crate::stage::Stage;

    #[test]
    fn test_duplicate_keys_share_a_pipeline() {
        let script = ScriptBuilder::new()
            .pipeline([("cullMode", "BACK")])
            .unwrap()
            .pipeline([("lineWidth", "2")])
            .unwrap()
            .pipeline([("cullMode", "VK_CULL_MODE_BACK_BIT")])
            .unwrap()
            .shader(Stage::Vertex, vec![0x0723_0203])
            .shader(Stage::Fragment, vec![0x0723_0203])
            .build();

        let set = PipelineSet::new(&script);

        assert_eq!(set.len(), 2);
        assert_eq!(set.pipeline_index(0), Some(0));
        assert_eq!(set.pipeline_index(1), Some(1));
        assert_eq!(set.pipeline_index(2), Some(0));
        assert_eq!(set.pipeline_index(3), None);
        assert_eq!(set.stages().iter().collect::<Vec<_>>(), vec![Stage::Vertex, Stage::Fragment]);
        assert_eq!(set.graphics_count(), 2);
    }

    #[test]
    fn test_graphics_and_compute_keys_stay_distinct() {
        let mut compute = PipelineKey::new();
        compute.set_kind(PipelineKind::Compute);

        let set = PipelineSet::from_keys(&[PipelineKey::new(), compute.clone(), compute], StageSet::new());

        assert_eq!(set.len(), 2);
        assert_eq!(set.graphics_count(), 1);
        assert_eq!(set.pipeline_index(2), Some(1));
    }
}
