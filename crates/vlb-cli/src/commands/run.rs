//! `reconcile` and `rebuild-leaderboard`.

use anyhow::{Context, Result};
use vlb_stats::verify_leaderboard;

pub async fn reconcile(paths: &[&str], json: bool) -> Result<()> {
    let sup = super::supervisor(paths)?;
    let outcome = sup
        .reconcile_and_aggregate()
        .await
        .context("reconcile failed; re-run to resume")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    println!("run_id={}", outcome.run_id);
    println!("state={}", outcome.state.as_str());
    println!("fetched={}", outcome.fetched);
    println!("eligible={}", outcome.eligible);
    println!("persisted={}", outcome.persisted.join(","));
    println!("already_present={}", outcome.already_present);
    println!("had_new_matches={}", outcome.had_new_matches);
    println!("watermark={}", outcome.watermark.as_deref().unwrap_or("-"));
    println!("watermark_held={}", outcome.watermark_held);
    println!("roster_refreshed={}", outcome.roster_refreshed.len());
    if let Some(health) = &outcome.leaderboard_health {
        println!("leaderboard_health={}", health.as_str());
    }
    println!("leaderboard_written={}", outcome.leaderboard.is_some());
    for v in &outcome.violations {
        println!("violation={v}");
    }
    Ok(())
}

pub async fn rebuild_leaderboard(paths: &[&str]) -> Result<()> {
    let sup = super::supervisor(paths)?;
    let lb = sup
        .rebuild_leaderboard()
        .await
        .context("leaderboard rebuild failed")?;
    println!("players={}", lb.players.len());
    for v in verify_leaderboard(&lb) {
        println!("violation={v}");
    }
    Ok(())
}
