use std::env;
use std::time::Duration;
use worktrack::{BearerAuth, CancellationToken, Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let base_url = env::var("WORKTRACK_BASE_URL").expect("WORKTRACK_BASE_URL is required");
    let token = env::var("WORKTRACK_TOKEN").expect("WORKTRACK_TOKEN is required");
    let cloud_id = env::var("WORKTRACK_CLOUD_ID").expect("WORKTRACK_CLOUD_ID is required");
    let issue_key = env::var("WORKTRACK_ISSUE_KEY").expect("WORKTRACK_ISSUE_KEY is required");

    let cancel = CancellationToken::new();
    let config = ClientConfig::new(base_url, BearerAuth::new(token))
        .with_cancellation_token(cancel.clone());
    let client = Client::new(config)?;

    let deadline: u64 = env::var("WORKTRACK_DEADLINE_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(300);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(deadline)).await;
        cancel.cancel();
    });

    let worklogs = client.list_issue_worklogs(&cloud_id, &issue_key, 50).await?;
    let mut total = 0;
    for worklog in &worklogs {
        let seconds = worklog.time_spent_seconds().unwrap_or(0);
        total += seconds;
        let author = worklog
            .author
            .as_ref()
            .and_then(|author| author.name.as_deref())
            .unwrap_or("unknown");
        println!("{}\t{author}\t{seconds}s", worklog.worklog_id);
    }
    println!("{} worklogs, {total}s total", worklogs.len());

    Ok(())
}
