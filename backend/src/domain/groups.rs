//! Named groups and their capability plans.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Capability, CapabilitySet};

/// Maximum group name length in characters.
pub const GROUP_NAME_MAX: usize = 150;

/// Raised when a group name is blank or too long.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupNameError {
    #[error("group name must not be empty")]
    Empty,
    #[error("group name must be at most {max} characters")]
    TooLong { max: usize },
}

/// Unique group name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, GroupNameError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GroupNameError::Empty);
        }
        if trimmed.chars().count() > GROUP_NAME_MAX {
            return Err(GroupNameError::TooLong {
                max: GROUP_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    fn known(name: &'static str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<GroupName> for String {
    fn from(value: GroupName) -> Self {
        value.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = GroupNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Desired grants for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub name: GroupName,
    pub capabilities: Vec<Capability>,
}

/// The three standard groups, in provisioning order.
///
/// # Examples
/// ```
/// use backend::domain::default_group_plans;
///
/// let names: Vec<String> = default_group_plans()
///     .into_iter()
///     .map(|plan| plan.name.to_string())
///     .collect();
/// assert_eq!(names, ["Viewers", "Editors", "Admins"]);
/// ```
pub fn default_group_plans() -> Vec<GroupPlan> {
    use Capability::{Create, Delete, Edit, View};
    vec![
        GroupPlan {
            name: GroupName::known("Viewers"),
            capabilities: vec![View],
        },
        GroupPlan {
            name: GroupName::known("Editors"),
            capabilities: vec![View, Create, Edit],
        },
        GroupPlan {
            name: GroupName::known("Admins"),
            capabilities: vec![View, Create, Edit, Delete],
        },
    ]
}

/// Whether provisioning inserted the group or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningOutcome {
    Created,
    Updated,
}

/// Result of provisioning one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    #[schema(value_type = String, example = "Editors")]
    pub name: GroupName,
    pub outcome: ProvisioningOutcome,
    #[schema(example = json!(["can_view", "can_create", "can_edit"]))]
    pub codenames: Vec<String>,
}

impl GroupReport {
    pub fn new(name: GroupName, outcome: ProvisioningOutcome, grants: &CapabilitySet) -> Self {
        Self {
            name,
            outcome,
            codenames: grants.codenames().into_iter().map(str::to_owned).collect(),
        }
    }
}

/// Per-group results of a provisioning run.
///
/// `Display` renders the operator-facing report printed by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningSummary {
    pub groups: Vec<GroupReport>,
}

impl fmt::Display for ProvisioningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.groups {
            let verb = match report.outcome {
                ProvisioningOutcome::Created => "Created",
                ProvisioningOutcome::Updated => "Updated",
            };
            writeln!(f, "{verb} {} group", report.name)?;
        }
        writeln!(f, "Groups setup completed successfully!")?;
        writeln!(f, "Group Permissions:")?;
        for report in &self.groups {
            writeln!(f, "  - {}: {}", report.name, report.codenames.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", GroupNameError::Empty)]
    #[case("   ", GroupNameError::Empty)]
    fn group_name_rejects_blank(#[case] raw: &str, #[case] expected: GroupNameError) {
        assert_eq!(GroupName::new(raw).expect_err("blank"), expected);
    }

    #[rstest]
    fn editors_hold_no_delete() {
        let editors = default_group_plans()
            .into_iter()
            .find(|plan| plan.name.as_ref() == "Editors")
            .expect("editors plan");
        assert!(!editors.capabilities.contains(&Capability::Delete));
    }

    #[rstest]
    fn summary_renders_operator_report() {
        let summary = ProvisioningSummary {
            groups: default_group_plans()
                .into_iter()
                .enumerate()
                .map(|(idx, plan)| {
                    let outcome = if idx == 0 {
                        ProvisioningOutcome::Updated
                    } else {
                        ProvisioningOutcome::Created
                    };
                    let grants: CapabilitySet = plan.capabilities.into_iter().collect();
                    GroupReport::new(plan.name, outcome, &grants)
                })
                .collect(),
        };
        let expected = "\
Updated Viewers group
Created Editors group
Created Admins group
Groups setup completed successfully!
Group Permissions:
  - Viewers: can_view
  - Editors: can_view, can_create, can_edit
  - Admins: can_view, can_create, can_edit, can_delete
";
        assert_eq!(summary.to_string(), expected);
    }
}
