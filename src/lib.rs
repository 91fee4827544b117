//! Ploxi onboarding: multi-step registration wizards over a JSON API.

pub mod catalog;
pub mod config;
pub mod error;
pub mod flows;
pub mod forms;
pub mod handoff;
pub mod navigation;
pub mod routes;
pub mod wizard;
