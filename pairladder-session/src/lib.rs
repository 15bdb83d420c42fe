//! PairLadder Session — round orchestration on top of `pairladder-core`.
//!
//! This crate provides:
//! - League configuration loaded from TOML (penalty shifts, slot limits)
//! - Attendance: the active set, with one-pair-per-player enforcement
//! - Penalty entry and result-grid entry per pod
//! - Automatic reordering once the last pod is resolved
//! - Time-slot scheduling of pods
//! - A serializable ladder view

pub mod config;
pub mod schedule;
pub mod session;

pub use config::{ConfigError, LeagueConfig, ScheduleConfig};
pub use schedule::{clear_time_slots, count_by_time, distribute_pods, pairs_by_time};
pub use session::{GameSession, LadderRow, RoundStatus, SessionError};
