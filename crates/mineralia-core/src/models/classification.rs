use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationKind {
    Ns,
    Groups,
}

impl ClassificationKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Ns => "Nickel-Strunz Classification",
            Self::Groups => "Groups Classification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSection<T> {
    #[serde(rename = "type")]
    pub kind: ClassificationKind,
    pub title: String,
    pub data: T,
}

impl<T> ClassificationSection<T> {
    pub fn new(kind: ClassificationKind, data: T) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            data,
        }
    }
}

pub type GroupsClassification = ClassificationSection<Vec<ClassificationNode>>;
pub type NsClassification = ClassificationSection<NsClassificationData>;

/// One mineral inside a rendered hierarchy branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationNode {
    /// Id of the hierarchy edge this node was rendered from.
    pub id: i64,
    pub mineral_id: Uuid,
    pub name: String,
    pub formula: String,
    pub ns_index: Option<String>,
    pub statuses: Vec<StatusCode>,
    pub children: Vec<ClassificationNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NsLevel {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NsClassificationData {
    pub index: String,
    pub class: Option<NsLevel>,
    pub subclass: Option<NsLevel>,
    pub family: Option<NsLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<NsClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupsClassification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedMineral {
    pub mineral_id: Uuid,
    pub mineral_name: String,
}

/// Statuses of one mineral folded by status group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusGroupSummary {
    /// Status group id.
    pub id: i64,
    pub group: String,
    pub description: Vec<String>,
    /// Present only for groups whose statuses redirect to another mineral.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<RelatedMineral>>,
}
