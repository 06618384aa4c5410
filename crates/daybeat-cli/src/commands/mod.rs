pub mod activity;
pub mod budget;
pub mod chat;
pub mod completions;
pub mod project;
pub mod reminder;
pub mod report;
pub mod schedule;
pub mod watch;

mod common;
