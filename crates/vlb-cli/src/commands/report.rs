//! Read-only commands: `status`, `summary`, `teams`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use vlb_config::load_layered_yaml;
use vlb_config::secrets::resolve_secrets_optional;
use vlb_runtime::Supervisor;
use vlb_schemas::TeamColor;
use vlb_source::{build_match_source, MatchSource, ProxyMatchSource};
use vlb_stats::{recommend_teams, MatchSummary, SummaryPlayer};

/// A supervisor for commands that never query the match source. Works
/// without the provider key even when the transport is `direct`.
fn read_only_supervisor(paths: &[&str]) -> Result<(Supervisor, vlb_store::GitHubContentsStore)> {
    let loaded = load_layered_yaml(paths).context("loading config")?;
    let cfg = loaded.tracker().context("typed config")?;
    let secrets = resolve_secrets_optional(&loaded.config_json);
    let store = super::github_store(&cfg, &secrets)?;

    let timeout = Duration::from_millis(cfg.engine.request_timeout_ms);
    let source: Arc<dyn MatchSource> = match build_match_source(&cfg, &secrets) {
        Ok(source) => source,
        Err(_) => Arc::new(ProxyMatchSource::new(cfg.source.proxy_url.clone(), timeout)?),
    };
    let sup = Supervisor::new(source, Arc::new(store.clone()), cfg);
    Ok((sup, store))
}

pub async fn status(paths: &[&str]) -> Result<()> {
    let (sup, store) = read_only_supervisor(paths)?;

    println!("repo={}", store.repo());
    println!("branch={}", store.branch());
    match store.probe_repo().await {
        Ok(p) => {
            println!("repo_access=ok");
            println!("repo_private={}", p.private);
            println!("repo_can_push={}", p.can_push);
            println!("repo_default_branch={}", p.default_branch);
        }
        Err(e) => println!("repo_access=error ({e})"),
    }
    match store.rate_limit().await {
        Ok(r) => {
            let reset = DateTime::from_timestamp(r.reset, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| r.reset.to_string());
            println!("rate_limit={}/{} reset_at_utc={}", r.remaining, r.limit, reset);
        }
        Err(e) => println!("rate_limit=error ({e})"),
    }

    let s = sup.status().await.context("reading stored documents")?;
    println!("user_state_present={}", s.user_state_present);
    println!("roster_size={}", s.roster_size);
    println!("watermark={}", s.watermark.as_deref().unwrap_or("-"));
    println!("match_files={}", s.match_files);
    println!("leaderboard_health={}", s.leaderboard_health.as_str());
    Ok(())
}

fn side(players: &[SummaryPlayer]) -> String {
    players
        .iter()
        .map(|p| format!("{}#{} {}/{}/{}", p.name, p.tag, p.kills, p.deaths, p.assists))
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn summary(paths: &[&str], limit: usize) -> Result<()> {
    let (sup, _) = read_only_supervisor(paths)?;
    let corpus = sup.load_corpus().await.context("loading stored matches")?;

    let mut records = corpus.records;
    // Newest first; records without a start time go last.
    records.sort_by_key(|r| std::cmp::Reverse(r.view().metadata.game_start.unwrap_or(i64::MIN)));

    for record in records.iter().take(limit) {
        let s = MatchSummary::from_view(record.view());
        let winner = match s.winner {
            Some(TeamColor::Red) => "red",
            Some(TeamColor::Blue) => "blue",
            None => "none",
        };
        let score = s
            .score
            .map(|(r, b)| format!("{r}:{b}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "match_id={} map={} started_at=\"{}\" winner={} score={}",
            s.match_id.as_deref().unwrap_or("-"),
            s.map,
            s.started_at,
            winner,
            score
        );
        println!("  red:  {}", side(&s.red));
        println!("  blue: {}", side(&s.blue));
    }
    if !corpus.skipped.is_empty() {
        println!("skipped_unreadable={}", corpus.skipped.join(","));
    }
    Ok(())
}

pub async fn teams(paths: &[&str]) -> Result<()> {
    let (sup, _) = read_only_supervisor(paths)?;
    let (user, _) = sup.load_user_state().await?;
    let lb = sup
        .stored_leaderboard()
        .await?
        .context("no leaderboard stored yet; run `vlb rebuild-leaderboard` first")?;

    let names: BTreeMap<&str, String> = user
        .players
        .iter()
        .map(|p| (p.puuid.as_str(), p.handle()))
        .collect();
    let label = |puuid: &String| names.get(puuid.as_str()).cloned().unwrap_or_else(|| puuid.clone());

    let rec = recommend_teams(&lb, &user.players);
    println!(
        "red={} mean_kd={:.2}",
        rec.red.iter().map(label).collect::<Vec<_>>().join(", "),
        rec.red_mean_kd
    );
    println!(
        "blue={} mean_kd={:.2}",
        rec.blue.iter().map(label).collect::<Vec<_>>().join(", "),
        rec.blue_mean_kd
    );
    Ok(())
}
