//! Evaluation harness for natural-language-to-visualization agents.
//!
//! The harness drives a benchmark of visualization questions through an agent,
//! checks each produced chart with a fail-fast stage pipeline, caches both the
//! agent output and the final judgment per test, and rolls the judgments up
//! into fail rates and quality scores.
//!
//! ```text
//! Coordinator ──▶ ContextPool (one agent per group, reused)
//!      │
//!      ▼
//! CheckPipeline ──▶ JudgmentCache (hit: done)
//!      │
//!      ├─ Execution ──▶ ArtifactCache ──▶ Agent
//!      ├─ Surface form / Deconstruction / Chart type + data / Order
//!      └─ Readability (layout, scale and ticks, judge model)
//!      │
//!      ▼
//! ResultRecord ──▶ scoring::score
//! ```

pub mod aspect;
pub mod cache;
pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod judge;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod process;
pub mod providers;
pub mod report;
pub mod scoring;
pub mod storage;

pub use aspect::{Aspect, AspectGroup};
pub use cache::{ArtifactCache, CacheSource, JudgmentCache};
pub use checks::{ChartCheck, CheckContext, CheckSuite, Deconstructor, Verdict};
pub use config::{load_config, EvalConfig};
pub use engine::{ContextPool, Coordinator};
pub use error::{EvalError, EvalResult};
pub use model::{
    Answer, CheckResult, GroundTruth, ProducedArtifact, RenderedChart, ResultRecord, TestCase,
};
pub use pipeline::{CheckPipeline, Stage, STAGES};
pub use providers::agent::{Agent, AgentFactory};
pub use scoring::{score, score_tests, TestScore};
