use crate::aspect::{Aspect, AspectGroup};
use serde::{Deserialize, Serialize};

/// One benchmark question plus its ground truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub id: String,
    /// Data source the question targets (a database id in the reference benchmark).
    #[serde(alias = "db_id")]
    pub group: String,
    pub question: String,
    #[serde(alias = "hardness", default)]
    pub difficulty: String,
    pub ground_truth: GroundTruth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundTruth {
    /// Expected chart kind (e.g. "bar", "pie", "stacked bar").
    pub chart: String,
    /// Expected structured visual object.
    #[serde(default)]
    pub vis_obj: serde_json::Value,
    #[serde(default)]
    pub meta_info: MetaInfo,
    /// Reference query that produced `data`.
    #[serde(default)]
    pub vis_query: String,
    #[serde(default)]
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetaInfo {
    #[serde(default)]
    pub channel_specified: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacked_bar: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Agent output for one question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProducedArtifact {
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<RenderedChart>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedChart {
    /// Serialized SVG document of the rendered figure.
    pub svg: String,
    #[serde(default = "default_library")]
    pub library: String,
    /// Raster rendition as a data URL, when the agent provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_library() -> String {
    "matplotlib".to_string()
}

impl RenderedChart {
    pub fn new(svg: impl Into<String>) -> Self {
        Self {
            svg: svg.into(),
            library: default_library(),
            image_url: None,
        }
    }
}

/// Judgment value: a pass/fail flag or an integer score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Score(i64),
}

impl Answer {
    pub fn is_truthy(&self) -> bool {
        match self {
            Answer::Bool(b) => *b,
            Answer::Score(n) => *n != 0,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Answer::Bool(true) => 1.0,
            Answer::Bool(false) => 0.0,
            Answer::Score(n) => *n as f64,
        }
    }
}

impl From<bool> for Answer {
    fn from(b: bool) -> Self {
        Answer::Bool(b)
    }
}

impl From<i64> for Answer {
    fn from(n: i64) -> Self {
        Answer::Score(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub answer: Answer,
    pub aspect: Aspect,
    pub rationale: String,
}

impl CheckResult {
    pub fn new(aspect: Aspect, answer: impl Into<Answer>, rationale: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            aspect,
            rationale: rationale.into(),
        }
    }

    pub fn fail(aspect: Aspect, rationale: impl Into<String>) -> Self {
        Self::new(aspect, false, rationale)
    }

    pub fn passed(&self) -> bool {
        self.answer.is_truthy()
    }
}

/// Outcome of one pipeline run against one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_id: String,
    pub results: Vec<CheckResult>,
}

impl ResultRecord {
    pub fn new(test_id: impl Into<String>, results: Vec<CheckResult>) -> Self {
        Self {
            test_id: test_id.into(),
            results,
        }
    }

    /// True when no valid or legal result failed.
    pub fn passed(&self) -> bool {
        !self.group_failed(AspectGroup::Valid) && !self.group_failed(AspectGroup::Legal)
    }

    pub fn group_failed(&self, group: AspectGroup) -> bool {
        self.results
            .iter()
            .any(|r| r.aspect.group() == group && !r.passed())
    }

    /// Vacuously false when the aspect never ran.
    pub fn aspect_failed(&self, aspect: Aspect) -> bool {
        self.results
            .iter()
            .any(|r| r.aspect == aspect && !r.passed())
    }

    pub fn readability_value(&self) -> f64 {
        self.results
            .iter()
            .filter(|r| r.aspect == Aspect::Readability)
            .map(|r| r.answer.value())
            .sum()
    }
}
