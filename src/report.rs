//! Serializable report of a planning pass, shared by the reporters and the state file

use crate::domain::BumpKind;
use crate::plan::UpdatePlan;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Everything known about one submodule after fetching its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmoduleUpdate {
    pub path: String,
    pub chart_name: Option<String>,
    pub current_tag: String,
    pub latest_tag: Option<String>,
    pub suggested_tag: Option<String>,
    #[serde(default)]
    pub recent_tags: Vec<String>,
    pub current_tag_chart_version: Option<String>,
    pub suggested_tag_chart_version: Option<String>,
    pub chart_bump: Option<BumpKind>,
}

impl SubmoduleUpdate {
    /// Chart version the parent should depend on after the update
    pub fn effective_chart_version(&self) -> Option<&str> {
        self.suggested_tag_chart_version
            .as_deref()
            .or(self.current_tag_chart_version.as_deref())
    }

    /// Dependency name of this submodule's chart in the parent chart
    pub fn dependency_name<'a>(&'a self, submodule: &'a str) -> &'a str {
        self.chart_name.as_deref().unwrap_or(submodule)
    }
}

/// Parent chart versions before and after the update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInfo {
    pub current: String,
    pub suggested: String,
    pub chart_bump: Option<BumpKind>,
}

impl From<&UpdatePlan> for ParentInfo {
    fn from(plan: &UpdatePlan) -> Self {
        ParentInfo {
            current: plan.parent_current.render(),
            suggested: plan.parent_target.render(),
            chart_bump: Some(plan.parent_bump.into()),
        }
    }
}

/// Full result handed to reporters and persisted between invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReport {
    pub parent: ParentInfo,
    pub submodules: IndexMap<String, SubmoduleUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_changes: Option<bool>,
}

impl ReleaseReport {
    pub fn with_committed_changes(mut self, committed: Option<bool>) -> Self {
        self.committed_changes = committed;
        self
    }
}

/// Outcome of the `bump` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpResult {
    pub app_version: String,
    pub chart_version: Option<String>,
    pub new_tag: Option<String>,
}
