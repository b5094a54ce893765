//! downstream usage of worktrack: an operation defined outside the crate

use serde::Deserialize;
use serde_json::json;
use worktrack::{Client, Operation, Result};

/// the caller's own account
pub struct CurrentUser;

impl Operation for CurrentUser {
    const QUERY: &'static str = "query CurrentUser { me { user { accountId name } } }";
    const NAME: &'static str = "CurrentUser";
    const COST: u32 = 2;
    type Response = CurrentUserData;
}

#[derive(Debug, Deserialize)]
pub struct CurrentUserData {
    pub me: Me,
}

#[derive(Debug, Deserialize)]
pub struct Me {
    pub user: Option<Account>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    pub name: Option<String>,
}

/// account id of whoever the client authenticates as
pub async fn current_account_id(client: &Client) -> Result<Option<String>> {
    let response = client.execute_operation::<CurrentUser>(json!({})).await?;
    let data = response.require_data(CurrentUser::NAME)?;
    Ok(data.me.user.map(|user| user.account_id))
}

/// seconds logged on an issue by one account
pub async fn seconds_logged_by(
    client: &Client,
    cloud_id: &str,
    issue_key: &str,
    account_id: &str,
) -> Result<i64> {
    let worklogs = client.list_issue_worklogs(cloud_id, issue_key, 0).await?;
    Ok(worklogs
        .iter()
        .filter(|worklog| {
            worklog
                .author
                .as_ref()
                .and_then(|author| author.account_id.as_deref())
                == Some(account_id)
        })
        .filter_map(|worklog| worklog.time_spent_seconds())
        .sum())
}
