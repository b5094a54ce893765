//! jira rest operations
//!
//! list endpoints walk offset pages (`startAt` / `maxResults`) through
//! [`paginate`]; version writes are single calls.

use super::models::{
    JiraBoard, JiraIssue, JiraSprint, JiraVersion, NewVersion, NewWorklog, RestWorklog,
    VersionUpdate,
};
use super::required;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::{page_size_or_default, paginate, OffsetPage};
use crate::request::Request;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;

/// fields requested by [`Client::search_issues`] before any extras
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &[
    "project",
    "issuetype",
    "status",
    "created",
    "updated",
    "resolutiondate",
    "assignee",
    "reporter",
    "labels",
    "components",
];

/// sprint state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintState {
    Future,
    Active,
    Closed,
}

impl SprintState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintState::Future => "future",
            SprintState::Active => "active",
            SprintState::Closed => "closed",
        }
    }
}

impl fmt::Display for SprintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SprintState {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "future" => Ok(SprintState::Future),
            "active" => Ok(SprintState::Active),
            "closed" => Ok(SprintState::Closed),
            _ => Err(Error::InvalidArgument(format!(
                "sprint state must be one of: future, active, closed (got {value:?})"
            ))),
        }
    }
}

fn search_fields(extra: &[&str]) -> Result<String> {
    let mut fields: Vec<&str> = DEFAULT_SEARCH_FIELDS.to_vec();
    for field in extra {
        let field = field.trim();
        if field.is_empty() {
            return Err(Error::InvalidArgument(
                "custom field names must be non-empty".to_string(),
            ));
        }
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields.join(","))
}

impl Client {
    async fn list_offset<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        page_size: u32,
    ) -> Result<Vec<T>> {
        let page_size = page_size_or_default(page_size);
        paginate(Some(0u64), |start_at| {
            let start_at = start_at.unwrap_or(0);
            let builder = params.iter().fold(
                Request::get(path)
                    .query("startAt", start_at)
                    .query("maxResults", page_size),
                |builder, (key, value)| builder.query(*key, value),
            );
            async move {
                let request = builder.build()?;
                let page: OffsetPage<T> = self.execute_json(&request).await?;
                Ok(page.into_page(start_at, u64::from(page_size)))
            }
        })
        .await
    }

    /// list every agile board visible to the caller
    pub async fn list_boards(&self, page_size: u32) -> Result<Vec<JiraBoard>> {
        self.list_offset("/rest/agile/1.0/board", &[], page_size)
            .await
    }

    /// list the sprints of a board, optionally filtered by state
    pub async fn list_board_sprints(
        &self,
        board_id: u64,
        state: Option<SprintState>,
        page_size: u32,
    ) -> Result<Vec<JiraSprint>> {
        if board_id == 0 {
            return Err(Error::InvalidArgument(
                "board id must be a positive integer".to_string(),
            ));
        }
        let params: Vec<(&str, String)> = state
            .map(|state| ("state", state.as_str().to_string()))
            .into_iter()
            .collect();
        self.list_offset(
            &format!("/rest/agile/1.0/board/{board_id}/sprint"),
            &params,
            page_size,
        )
        .await
    }

    /// list the versions of a project
    pub async fn list_project_versions(
        &self,
        project_key_or_id: &str,
        page_size: u32,
    ) -> Result<Vec<JiraVersion>> {
        let project = required("project key or id", project_key_or_id)?;
        self.list_offset(
            &format!("/rest/api/3/project/{project}/version"),
            &[],
            page_size,
        )
        .await
    }

    /// run a jql search, requesting the default fields plus `extra_fields`
    pub async fn search_issues(
        &self,
        jql: &str,
        extra_fields: &[&str],
        page_size: u32,
    ) -> Result<Vec<JiraIssue>> {
        let jql = required("jql", jql)?;
        let fields = search_fields(extra_fields)?;
        self.list_offset(
            "/rest/api/3/search",
            &[("jql", jql), ("fields", fields)],
            page_size,
        )
        .await
    }

    /// list every worklog on an issue through the rest api
    pub async fn list_issue_worklogs_rest(
        &self,
        issue_key: &str,
        page_size: u32,
    ) -> Result<Vec<RestWorklog>> {
        let key = required("issue key", issue_key)?;
        self.list_offset(&format!("/rest/api/3/issue/{key}/worklog"), &[], page_size)
            .await
    }

    /// log work on an issue
    pub async fn create_worklog(
        &self,
        issue_key: &str,
        worklog: &NewWorklog,
    ) -> Result<RestWorklog> {
        let key = required("issue key", issue_key)?;
        required("worklog start", &worklog.started)?;
        if worklog.time_spent_seconds == 0 {
            return Err(Error::InvalidArgument(
                "time spent must be a positive number of seconds".to_string(),
            ));
        }
        let request = Request::post(format!("/rest/api/3/issue/{key}/worklog"))
            .json(serde_json::to_value(worklog)?)
            .build()?;
        self.execute_json(&request).await
    }

    /// delete a worklog from an issue
    pub async fn delete_worklog(&self, issue_key: &str, worklog_id: &str) -> Result<()> {
        let key = required("issue key", issue_key)?;
        let id = required("worklog id", worklog_id)?;
        let request = Request::delete(format!("/rest/api/3/issue/{key}/worklog/{id}")).build()?;
        self.execute(&request).await?;
        Ok(())
    }

    /// create a project version
    pub async fn create_version(&self, version: &NewVersion) -> Result<JiraVersion> {
        required("version name", &version.name)?;
        required("project key", &version.project)?;
        let request = Request::post("/rest/api/3/version")
            .json(serde_json::to_value(version)?)
            .build()?;
        self.execute_json(&request).await
    }

    /// update a version in place
    pub async fn update_version(
        &self,
        version_id: &str,
        update: &VersionUpdate,
    ) -> Result<JiraVersion> {
        let id = required("version id", version_id)?;
        let request = Request::put(format!("/rest/api/3/version/{id}"))
            .json(serde_json::to_value(update)?)
            .build()?;
        self.execute_json(&request).await
    }

    /// delete a version
    pub async fn delete_version(&self, version_id: &str) -> Result<()> {
        let id = required("version id", version_id)?;
        let request = Request::delete(format!("/rest/api/3/version/{id}")).build()?;
        self.execute(&request).await?;
        Ok(())
    }
}
