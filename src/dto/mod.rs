use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod action;
pub mod auth;
pub mod common;
pub mod community;
pub mod health;
pub mod item;
pub mod leaderboard;
pub mod result;
pub mod server;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
