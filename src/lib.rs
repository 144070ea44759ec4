//! Core of a group-chat moderation and engagement bot: flood throttling,
//! warning escalation, timed join verification, a points economy with daily
//! check-ins and a shop, stake-backed gomoku, and a free-text AI proxy.
//!
//! The crate is transport-agnostic. An embedder implements
//! [`platform::ChatPlatform`] for its chat service, translates inbound
//! updates into [`platform::Event`]s, and feeds them to a
//! [`handlers::Dispatcher`]:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use nekomod::ai::HttpCompletionService;
//! use nekomod::config::Settings;
//! use nekomod::handlers::Dispatcher;
//! # use nekomod::platform::{ChatPlatform, Event};
//! # async fn example(platform: Arc<dyn ChatPlatform>, event: Event) {
//!
//! let settings = Settings::from_env();
//! let completion = Arc::new(HttpCompletionService::new(
//!     settings.completion_api_url.clone().unwrap_or_default(),
//!     settings.completion_api_key.clone().unwrap_or_default(),
//! ));
//! let dispatcher = Arc::new(Dispatcher::new(platform, completion, settings));
//! dispatcher.spawn_background_tasks();
//!
//! // Verification deadlines come back as internally scheduled events;
//! // without this loop they are never delivered and unverified members
//! // stay restricted.
//! let scheduled = Arc::clone(&dispatcher);
//! tokio::spawn(async move { scheduled.run_scheduled().await });
//!
//! dispatcher.dispatch(event).await;
//! # }
//! ```

pub mod ai;
pub mod bot;
pub mod config;
pub mod constants;
pub mod handlers;
pub mod platform;
pub mod services;
pub mod store;
pub mod utils;
