//! jira operations
//!
//! typed list and get calls for boards, sprints, versions, issues and
//! worklogs. rest calls go to the site (`https://<site>.atlassian.net`);
//! graphql calls go to the configured gateway path.

mod graph;
mod models;
mod rest;

pub use graph::{
    IssueByKeyData, IssueWorklogs, IssueWorklogsData, JiraIssueByKey, JiraIssueWorklogsPage,
    JiraSprintById, SprintByIdData,
};
pub use models::{
    BoardLocation, DateTimeField, GraphIssue, GraphSprint, JiraBoard, JiraIssue, JiraSprint,
    JiraVersion, JiraWorklog, Named, NewVersion, NewWorklog, Person, ProjectField, ProjectRef,
    RestUser, RestWorklog, TimeSpent, UserField, VersionUpdate,
};
pub use rest::{SprintState, DEFAULT_SEARCH_FIELDS};

use crate::error::{Error, Result};

/// trimmed `value`, or an argument error naming `name`
fn required(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{name} is required")));
    }
    Ok(trimmed.to_string())
}
