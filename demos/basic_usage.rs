// ============================================================================
// Basic Usage Example
// ============================================================================

use matchmaking_engine::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), MatchmakingError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Matchmaking Engine Example ===\n");

    // Ranked queue that checks less often the longer it runs
    let runner = RunnerBuilder::ranked()?
        .with_interval(LinearBackoff {
            initial: Duration::from_millis(200),
            step: Duration::from_millis(20),
            max: Duration::from_secs(1),
        })
        .on_pair(|a: PoolEntry<PlayerProfile>, b: PoolEntry<PlayerProfile>| {
            println!(
                "  Match: {} ({}) vs {} ({}) after {:?} / {:?}",
                a.payload.player_id,
                a.payload.rating,
                b.payload.player_id,
                b.payload.rating,
                a.waited,
                b.waited
            );
        })
        .with_event_handler(Arc::new(LoggingEventHandler))
        .build()?;

    println!("Adding players...");
    let players = [
        PlayerProfile::new("alice", 1500.0),
        PlayerProfile::new("bob", 1540.0).with_streak(2),
        PlayerProfile::new("carol", 1820.0).with_performance(0.8),
        PlayerProfile::new("dave", 1180.0).with_streak(-4),
        PlayerProfile::new("erin", 2050.0).with_high_stakes(true),
    ];
    for player in players {
        let name = player.player_id.clone();
        match runner.join(player) {
            Some(id) => println!("  {} joined as {}", name, id),
            None => println!("  {} already queued", name),
        }
    }

    // Duplicate joins are ignored
    runner.join(PlayerProfile::new("alice", 1600.0));

    // Scores on demand
    let policy = RatingPolicy::default();
    let score = policy.score_profiles(
        &PlayerProfile::new("alice", 1500.0),
        &PlayerProfile::new("carol", 1820.0).with_performance(0.8),
        Duration::ZERO,
        Duration::ZERO,
    );
    println!("\nalice vs carol right away: {:?}", score);

    println!("\n=== Waiting for matches ===");
    while runner.is_running() {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = runner.snapshot();
        println!(
            "  waiting: {}, oldest: {:?}, attempts: {}",
            snapshot.waiting, snapshot.oldest_wait, snapshot.attempts
        );
        if snapshot.waiting == 1 && snapshot.oldest_wait > Some(Duration::from_secs(45)) {
            println!("  nobody left to pair with, stopping");
            runner.stop();
        }
    }

    println!("\nFinal pool size: {}", runner.len());
    Ok(())
}
