//! The `proctor start` and `proctor status` commands.

use std::path::PathBuf;

use anyhow::Result;
use uuid::Uuid;

use proctor_core::clock::TimeRemaining;

pub async fn start(config: Option<PathBuf>, evaluation: String, taker: String) -> Result<()> {
    let service = super::open(config)?;
    let started = service.start(&evaluation, &taker).await?;

    let session = started.session();
    let verb = if started.is_resumed() {
        "Resumed"
    } else {
        "Started"
    };
    println!("{verb} session {} (attempt {})", session.id, session.attempt);
    match session.deadline() {
        Some(deadline) => println!("Deadline: {}", deadline.to_rfc3339()),
        None => println!("Deadline: none"),
    }
    Ok(())
}

pub async fn status(config: Option<PathBuf>, session: Uuid) -> Result<()> {
    let service = super::open(config)?;
    let view = service.get_status(session).await?;

    println!("Session:   {}", view.session_id);
    println!("Status:    {}", view.status);
    println!("Remaining: {}", format_remaining(view.time_remaining));
    println!("Started:   {}", view.started_at.to_rfc3339());
    println!("Activity:  {}", view.last_activity_at.to_rfc3339());
    Ok(())
}

fn format_remaining(remaining: TimeRemaining) -> String {
    match remaining.as_secs() {
        None => "unlimited".to_string(),
        Some(secs) => format!("{}m {:02}s", secs / 60, secs % 60),
    }
}
