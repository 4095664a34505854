use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Steps of a `get_or_save` call, in order. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    RecordLookup,
    RawAcquire,
    OptimizeAcquire,
    RecordPersist,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::RecordLookup => "record_lookup",
            PipelineStage::RawAcquire => "raw_acquire",
            PipelineStage::OptimizeAcquire => "optimize_acquire",
            PipelineStage::RecordPersist => "record_persist",
        }
    }

    /// Emit the stage-entered event; the guard emits stage-exited when dropped.
    pub(crate) fn enter<'a>(self, site_id: &'a str, image_name: &'a str) -> StageGuard<'a> {
        debug!(stage = self.as_str(), site_id, image_name, "Pipeline stage entered");
        StageGuard {
            stage: self,
            site_id,
            image_name,
            started: Instant::now(),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct StageGuard<'a> {
    stage: PipelineStage,
    site_id: &'a str,
    image_name: &'a str,
    started: Instant,
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        debug!(
            stage = self.stage.as_str(),
            site_id = self.site_id,
            image_name = self.image_name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Pipeline stage exited"
        );
    }
}
