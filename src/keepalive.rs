use log::{info, warn};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Pings `url` every `period` so an idling host keeps the process awake.
/// The first ping happens one period after start; failures wait for the next tick.
pub fn spawn(url: String, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Keepalive pinger started: {} every {:?}", url, period);

        loop {
            ticker.tick().await;
            ping(&client, &url).await;
        }
    })
}

async fn ping(client: &reqwest::Client, url: &str) {
    info!("Pinging {}", url);
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => {}
        Ok(response) => warn!("Ping to {} returned {}", url, response.status()),
        Err(e) => warn!("Ping to {} failed: {}", url, e),
    }
}
