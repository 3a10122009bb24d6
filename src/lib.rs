//! # luna-assistant
//!
//! Routing, fallback and intent-dispatch core of the Luna desktop assistant.
//!
//! ## Overview
//!
//! A user message goes through three layers:
//!
//! - the [`dispatch::IntentDispatcher`] decides whether the message is a model question,
//!   a weather or search request, a desktop command, or plain conversation;
//! - side requests go to the [`services`] executors;
//! - conversation goes to the [`router::FallbackRouter`], which calls the selected remote
//!   model with retries, walks alternate models when the endpoint is paused or loading, and
//!   falls back to the built-in [`responder::LocalResponder`] as a last resort.
//!
//! Every path ends in text carrying a `[Using: <model>]` suffix. Routing never returns an
//! error to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use luna_assistant::{
//!     Assistant, EnvCredentials, FallbackRouter, InMemorySettings, LocalResponder,
//!     OpenRouterClient,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> luna_assistant::Result<()> {
//!     let settings = Arc::new(InMemorySettings::default());
//!     let credentials = Arc::new(EnvCredentials::openrouter());
//!     let backend = Arc::new(OpenRouterClient::from_env(credentials.clone())?);
//!     let responder = Arc::new(LocalResponder::new(0.7));
//!
//!     let router = FallbackRouter::builder(backend, responder, settings.clone())
//!         .credentials(credentials)
//!         .build();
//!     let assistant = Assistant::new(settings, Arc::new(router));
//!
//!     println!("{}", assistant.handle("hello there").await);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Remote model backend trait and the OpenRouter client |
//! | [`catalog`] | Model descriptors, built-in catalog, alias resolution |
//! | [`status`] | Per-model availability cache and background probing |
//! | [`responder`] | Offline pattern-based responder with conversation memory |
//! | [`dispatch`] | Intent classification |
//! | [`router`] | Retry, alternates and local fallback |
//! | [`services`] | Weather, web search and desktop command executors |
//! | [`settings`] | Advanced settings and the settings provider |
//! | [`credentials`] | API key resolution and reload |

pub mod assistant;
pub mod catalog;
pub mod client;
pub mod credentials;
pub mod dispatch;
pub mod error_code;
pub mod responder;
pub mod router;
pub mod services;
pub mod settings;
pub mod status;

pub use assistant::Assistant;
pub use catalog::{ModelCatalog, ModelDescriptor, ProviderKind, LOCAL_ENGINE_ID};
pub use client::{ModelBackend, OpenRouterClient, OpenRouterConfig, RemoteError, RemoteResult};
pub use credentials::{CredentialStore, EnvCredentials};
pub use dispatch::{Intent, IntentDispatcher};
pub use error_code::ErrorKind;
pub use responder::LocalResponder;
pub use router::{
    FallbackRouter, FallbackRouterBuilder, RouteOutcome, RoutePath, RoutingAttempt,
};
pub use settings::{AdvancedSettings, InMemorySettings, SettingsProvider};
pub use status::{InMemoryStatusStore, ModelState, ModelStatus, StatusMonitor, StatusStore};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
