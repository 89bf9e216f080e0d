//! Telegram webhook bot answering questions about the university volunteering
//! program: centers, schedules, tutors and requirements.

pub mod classifier;
pub mod config;
pub mod knowledge;
pub mod replies;
pub mod telegram;
pub mod webhook;
