//! jira payload types
//!
//! thin serde views over what the list and get operations return. values are
//! kept close to the wire; mapping into richer domain types is left to callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// agile board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraBoard {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub board_type: Option<String>,
    #[serde(default)]
    pub location: Option<BoardLocation>,
}

/// project a board belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardLocation {
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// sprint as returned by the agile rest api
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSprint {
    pub id: u64,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub complete_date: Option<String>,
    #[serde(default)]
    pub origin_board_id: Option<u64>,
    #[serde(default)]
    pub goal: Option<String>,
}

/// project version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraVersion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
}

/// body for creating a version
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub name: String,
    /// project key
    pub project: String,
    pub released: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl NewVersion {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            released: false,
            description: None,
            release_date: None,
        }
    }
}

/// body for updating a version; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// issue from the rest search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    /// requested fields, keyed by field id
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl JiraIssue {
    /// a field by id, if the server returned it
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }
}

/// account reference in graphql payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpent {
    #[serde(default)]
    pub time_in_seconds: Option<i64>,
}

/// worklog node from the graphql gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraWorklog {
    pub worklog_id: String,
    #[serde(default)]
    pub author: Option<Person>,
    #[serde(default)]
    pub time_spent: Option<TimeSpent>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl JiraWorklog {
    pub fn time_spent_seconds(&self) -> Option<i64> {
        self.time_spent.as_ref()?.time_in_seconds
    }
}

/// account reference in rest payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestUser {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// worklog from the issue worklog rest endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestWorklog {
    pub id: String,
    #[serde(default)]
    pub issue_id: Option<String>,
    #[serde(default)]
    pub author: Option<RestUser>,
    #[serde(default)]
    pub time_spent_seconds: Option<i64>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

/// body for logging work on an issue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorklog {
    pub time_spent_seconds: u64,
    /// start of the logged work, e.g. `2021-01-17T12:34:00.000+0000`
    pub started: String,
}

impl NewWorklog {
    pub fn new(time_spent_seconds: u64, started: impl Into<String>) -> Self {
        Self {
            time_spent_seconds,
            started: started.into(),
        }
    }
}

/// sprint from the graphql gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSprint {
    pub sprint_id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub completion_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeField {
    #[serde(default)]
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub key: String,
    #[serde(default)]
    pub cloud_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectField {
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserField {
    #[serde(default)]
    pub user: Option<Person>,
}

/// issue from the graphql gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphIssue {
    pub key: String,
    #[serde(default)]
    pub issue_type: Option<Named>,
    #[serde(default)]
    pub status: Option<Named>,
    #[serde(default)]
    pub project_field: Option<ProjectField>,
    #[serde(default)]
    pub created_field: Option<DateTimeField>,
    #[serde(default)]
    pub updated_field: Option<DateTimeField>,
    #[serde(default)]
    pub resolution_date_field: Option<DateTimeField>,
    #[serde(default)]
    pub assignee_field: Option<UserField>,
    #[serde(default)]
    pub reporter: Option<Person>,
}

impl GraphIssue {
    pub fn project_key(&self) -> Option<&str> {
        Some(self.project_field.as_ref()?.project.as_ref()?.key.as_str())
    }

    pub fn assignee(&self) -> Option<&Person> {
        self.assignee_field.as_ref()?.user.as_ref()
    }
}
