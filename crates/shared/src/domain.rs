use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

macro_rules! named_candidate {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub name: String,
        }

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self { name: name.into() }
            }
        }
    };
}

/// Controller ids are published as numbers by some hosts and as strings by
/// others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControllerId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ControllerId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for ControllerId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A source controller offered on the first step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerRef {
    pub id: ControllerId,
    pub name: String,
}

impl ControllerRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self::with_id(ControllerId::Number(id), name)
    }

    pub fn with_id(id: ControllerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

named_candidate!(
    /// A telemetry/loop point offered on the TPS step.
    PointCandidate
);
named_candidate!(
    /// A control module offered for cutover.
    ModuleCandidate
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoverType {
    #[default]
    Single,
    Multiple,
}

impl CutoverType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "Single Loop",
            Self::Multiple => "Multiple Loop",
        }
    }
}

/// Point type chosen on the TPS step. "Unset" is modelled as `Option::None`
/// by the workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    All,
    Point1,
    Point2,
}

impl PointType {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Point1 => "Point 1",
            Self::Point2 => "Point 2",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IoChannels {
    #[serde(default)]
    pub input: Vec<Value>,
    #[serde(default)]
    pub output: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    #[serde(rename = "controllerName")]
    pub controller_name: String,
    #[serde(rename = "referenceNames", default)]
    pub reference_names: Vec<String>,
    #[serde(rename = "IOChannels", default)]
    pub io_channels: IoChannels,
}

/// One line of the cutover report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub module: String,
    pub reference_name: String,
    pub io_channel: String,
}
