use std::env;
use std::time::Duration;
use worktrack::{BasicAuth, Client, ClientConfig, CostBudgetConfig, RetryPolicy, SprintState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let base_url = env::var("WORKTRACK_BASE_URL").expect("WORKTRACK_BASE_URL is required");
    let email = env::var("WORKTRACK_EMAIL").expect("WORKTRACK_EMAIL is required");
    let token = env::var("WORKTRACK_TOKEN").expect("WORKTRACK_TOKEN is required");
    let board_id: u64 = env::var("WORKTRACK_BOARD_ID")
        .expect("WORKTRACK_BOARD_ID is required")
        .parse()?;
    let state = env::var("WORKTRACK_SPRINT_STATE")
        .ok()
        .map(|value| value.parse::<SprintState>())
        .transpose()?;

    let config = ClientConfig::new(base_url, BasicAuth::new(email, token))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_secs(120)))
        .with_local_budget(CostBudgetConfig::new(100, Duration::from_secs(60)));
    let client = Client::new(config)?;

    for sprint in client.list_board_sprints(board_id, state, 50).await? {
        println!(
            "{}\t{}\t{}",
            sprint.id,
            sprint.state,
            sprint.name
        );
    }

    Ok(())
}
