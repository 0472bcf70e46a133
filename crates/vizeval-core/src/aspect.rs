//! Closed aspect taxonomy.
//!
//! Every [`CheckResult`](crate::model::CheckResult) is tagged with exactly one
//! aspect, and every aspect belongs to exactly one [`AspectGroup`]. Valid
//! aspects gate structure, legal aspects gate correctness, readability aspects
//! only feed the quality score.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Aspect {
    #[serde(rename = "code execution")]
    CodeExecution,
    #[serde(rename = "surface-form check")]
    SurfaceForm,
    #[serde(rename = "deconstruction")]
    Deconstruction,
    #[serde(rename = "chart type check")]
    ChartType,
    #[serde(rename = "data check")]
    Data,
    #[serde(rename = "order check")]
    Order,
    #[serde(rename = "layout check")]
    Layout,
    #[serde(rename = "scale and ticks check")]
    ScaleAndTicks,
    #[serde(rename = "readability check")]
    Readability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AspectGroup {
    Valid,
    Legal,
    Readability,
}

impl Aspect {
    /// All aspects in pipeline order.
    pub const ALL: [Aspect; 9] = [
        Aspect::CodeExecution,
        Aspect::SurfaceForm,
        Aspect::Deconstruction,
        Aspect::ChartType,
        Aspect::Data,
        Aspect::Order,
        Aspect::Layout,
        Aspect::ScaleAndTicks,
        Aspect::Readability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::CodeExecution => "code execution",
            Aspect::SurfaceForm => "surface-form check",
            Aspect::Deconstruction => "deconstruction",
            Aspect::ChartType => "chart type check",
            Aspect::Data => "data check",
            Aspect::Order => "order check",
            Aspect::Layout => "layout check",
            Aspect::ScaleAndTicks => "scale and ticks check",
            Aspect::Readability => "readability check",
        }
    }

    pub fn group(&self) -> AspectGroup {
        match self {
            Aspect::CodeExecution | Aspect::SurfaceForm => AspectGroup::Valid,
            Aspect::Deconstruction | Aspect::ChartType | Aspect::Data | Aspect::Order => {
                AspectGroup::Legal
            }
            Aspect::Layout | Aspect::ScaleAndTicks | Aspect::Readability => {
                AspectGroup::Readability
            }
        }
    }

    /// Label used when a readability-branch result is handed to the judge
    /// model as a peer review.
    pub fn review_label(&self) -> Option<&'static str> {
        match self {
            Aspect::Layout => Some("Overflow/Overlap"),
            Aspect::ScaleAndTicks => Some("Scale/Ticks"),
            _ => None,
        }
    }

    /// Metric key for the per-aspect fail rate.
    pub fn fail_rate_key(&self) -> String {
        format!("{}_fail_rate", self.as_str())
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aspect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aspect::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown aspect: {}", s))
    }
}
