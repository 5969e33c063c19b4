//! Wire shapes of the four read-only datasets consumed by the workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{ControllerId, ControllerRef, ReferenceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dataset {
    ControllerTypes,
    LoopSelection,
    CutoutoverContent,
    ReferenceBlocks,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::ControllerTypes,
        Dataset::LoopSelection,
        Dataset::CutoutoverContent,
        Dataset::ReferenceBlocks,
    ];

    /// Resource id as published by the fixture host; note the historical
    /// spelling of `CutoutoverContent`.
    pub fn resource_id(self) -> &'static str {
        match self {
            Self::ControllerTypes => "ControllerTypes",
            Self::LoopSelection => "LoopSelection",
            Self::CutoutoverContent => "CutoutoverContent",
            Self::ReferenceBlocks => "ReferenceBlocks",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerTypeEntry {
    pub id: ControllerId,
    #[serde(rename = "controllerName")]
    pub controller_name: String,
}

impl From<ControllerTypeEntry> for ControllerRef {
    fn from(value: ControllerTypeEntry) -> Self {
        ControllerRef::with_id(value.id, value.controller_name)
    }
}

/// Loop and cutover datasets mix bare strings with `{ "controllerName": .. }`
/// records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetEntry {
    Named {
        #[serde(rename = "controllerName", alias = "name")]
        controller_name: String,
    },
    Plain(String),
}

impl DatasetEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Named { controller_name } => controller_name,
            Self::Plain(name) => name,
        }
    }

    pub fn into_name(self) -> String {
        match self {
            Self::Named { controller_name } => controller_name,
            Self::Plain(name) => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceBlocksEnvelope {
    pub controllers: Vec<ReferenceRecord>,
}
