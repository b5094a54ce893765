//! jira graphql operations
//!
//! each query is an [`Operation`] so it can also be run directly through
//! [`Client::execute_operation`].

use super::models::{GraphIssue, GraphSprint, JiraWorklog};
use super::required;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::graphql::{operation_error, GraphQlResponse};
use crate::operation::Operation;
use crate::pagination::{page_size_or_default, paginate, Connection};
use serde::Deserialize;
use serde_json::json;

/// one page of an issue's worklogs
pub struct JiraIssueWorklogsPage;

impl Operation for JiraIssueWorklogsPage {
    const QUERY: &'static str = r#"query JiraIssueWorklogsPage(
  $cloudId: ID!,
  $key: String!,
  $first: Int!,
  $after: String
) {
  issue: issueByKey(key: $key, cloudId: $cloudId) {
    worklogs(first: $first, after: $after) {
      pageInfo { hasNextPage endCursor }
      edges {
        cursor
        node {
          worklogId
          author { accountId name }
          timeSpent { timeInSeconds }
          created
          updated
          startDate
        }
      }
    }
  }
}"#;
    const NAME: &'static str = "JiraIssueWorklogsPage";
    type Response = IssueWorklogsData;
}

#[derive(Debug, Deserialize)]
pub struct IssueWorklogsData {
    pub issue: Option<IssueWorklogs>,
}

#[derive(Debug, Deserialize)]
pub struct IssueWorklogs {
    pub worklogs: Connection<JiraWorklog>,
}

/// a sprint by its global id
pub struct JiraSprintById;

impl Operation for JiraSprintById {
    const QUERY: &'static str = r#"query JiraSprintById(
  $id: ID!
) {
  sprintById(id: $id) {
    sprintId
    name
    state
    startDate
    endDate
    completionDate
  }
}"#;
    const NAME: &'static str = "JiraSprintById";
    type Response = SprintByIdData;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintByIdData {
    pub sprint_by_id: Option<GraphSprint>,
}

/// an issue by key within a site
pub struct JiraIssueByKey;

impl Operation for JiraIssueByKey {
    const QUERY: &'static str = r#"query JiraIssueByKey(
  $cloudId: ID!,
  $key: String!
) {
  issueByKey(key: $key, cloudId: $cloudId) {
    key
    issueType { name }
    status { name }
    projectField {
      project { key cloudId }
    }
    createdField { dateTime }
    updatedField { dateTime }
    resolutionDateField { dateTime }
    assigneeField {
      user { accountId name }
    }
    reporter { accountId name }
  }
}"#;
    const NAME: &'static str = "JiraIssueByKey";
    type Response = IssueByKeyData;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueByKeyData {
    pub issue_by_key: Option<GraphIssue>,
}

/// a nullable root field: absent with errors is a failure, absent without is `None`
fn optional_root<D, T>(
    response: GraphQlResponse<D>,
    pick: impl FnOnce(D) -> Option<T>,
) -> Result<Option<T>> {
    let GraphQlResponse { data, errors, .. } = response;
    match data.and_then(pick) {
        Some(value) => Ok(Some(value)),
        None if !errors.is_empty() => Err(operation_error(errors, None, None, "")),
        None => Ok(None),
    }
}

impl Client {
    /// list every worklog on an issue, following the connection cursor
    pub async fn list_issue_worklogs(
        &self,
        cloud_id: &str,
        issue_key: &str,
        page_size: u32,
    ) -> Result<Vec<JiraWorklog>> {
        let cloud_id = required("cloud id", cloud_id)?;
        let issue_key = required("issue key", issue_key)?;
        let first = page_size_or_default(page_size);

        paginate(None, |after: Option<String>| {
            let variables = json!({
                "cloudId": cloud_id,
                "key": issue_key,
                "first": first,
                "after": after,
            });
            async move {
                let response = self
                    .execute_operation::<JiraIssueWorklogsPage>(variables)
                    .await?;
                let issue = response
                    .require_data(JiraIssueWorklogsPage::NAME)?
                    .issue
                    .ok_or_else(|| Error::MissingData {
                        operation: format!("{}.issue", JiraIssueWorklogsPage::NAME),
                    })?;
                issue.worklogs.into_page("jira.issue.worklogs")
            }
        })
        .await
    }

    /// fetch one sprint; `None` when the gateway has no such sprint
    pub async fn get_sprint_by_id(&self, sprint_id: &str) -> Result<Option<GraphSprint>> {
        let id = required("sprint id", sprint_id)?;
        let response = self
            .execute_operation::<JiraSprintById>(json!({ "id": id }))
            .await?;
        optional_root(response, |data| data.sprint_by_id)
    }

    /// fetch one issue by key; `None` when the gateway has no such issue
    pub async fn get_issue_by_key(
        &self,
        cloud_id: &str,
        issue_key: &str,
    ) -> Result<Option<GraphIssue>> {
        let cloud_id = required("cloud id", cloud_id)?;
        let key = required("issue key", issue_key)?;
        let response = self
            .execute_operation::<JiraIssueByKey>(json!({ "cloudId": cloud_id, "key": key }))
            .await?;
        optional_root(response, |data| data.issue_by_key)
    }
}
