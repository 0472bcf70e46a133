use crate::aspect::Aspect;
use crate::model::CheckResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Execution,
    SurfaceForm,
    Deconstruction,
    ChartTypeAndData,
    Order,
    Readability,
}

#[derive(Debug, Clone, Copy)]
pub struct StageDescriptor {
    pub stage: Stage,
    /// Name used in the stage trace.
    pub label: &'static str,
    /// Aspects the stage may produce, in production order.
    pub aspects: &'static [Aspect],
}

/// Stage order. The pipeline walks this table and stops after the first
/// stage that does not pass.
pub const STAGES: [StageDescriptor; 6] = [
    StageDescriptor {
        stage: Stage::Execution,
        label: "Execution",
        aspects: &[Aspect::CodeExecution],
    },
    StageDescriptor {
        stage: Stage::SurfaceForm,
        label: "Surface form check",
        aspects: &[Aspect::SurfaceForm],
    },
    StageDescriptor {
        stage: Stage::Deconstruction,
        label: "Deconstruction",
        aspects: &[Aspect::Deconstruction],
    },
    StageDescriptor {
        stage: Stage::ChartTypeAndData,
        label: "Chart type and data check",
        aspects: &[Aspect::ChartType, Aspect::Data],
    },
    StageDescriptor {
        stage: Stage::Order,
        label: "Order check",
        aspects: &[Aspect::Order],
    },
    StageDescriptor {
        stage: Stage::Readability,
        label: "Readability check",
        aspects: &[Aspect::Layout, Aspect::ScaleAndTicks, Aspect::Readability],
    },
];

/// A stage passes iff every result it produced is truthy. A stage that
/// produced nothing passes.
pub fn stage_passed(results: &[CheckResult]) -> bool {
    results.iter().all(CheckResult::passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::AspectGroup;

    #[test]
    fn table_covers_every_aspect_once_in_order() {
        let aspects: Vec<Aspect> = STAGES.iter().flat_map(|s| s.aspects.iter().copied()).collect();
        assert_eq!(aspects, Aspect::ALL.to_vec());
    }

    #[test]
    fn groups_never_interleave() {
        let groups: Vec<AspectGroup> = STAGES
            .iter()
            .flat_map(|s| s.aspects.iter().map(|a| a.group()))
            .collect();
        assert!(groups.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn stage_pass_requires_all_truthy() {
        let ok = CheckResult::new(Aspect::ChartType, true, "bar");
        let bad = CheckResult::new(Aspect::Data, false, "missing rows");
        assert!(stage_passed(&[ok.clone()]));
        assert!(!stage_passed(&[ok, bad]));
        assert!(stage_passed(&[]));
    }
}
