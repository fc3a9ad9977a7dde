//! Device-code sign-in and bearer-authenticated mail fetching for the Outlook REST API and
//! Microsoft Graph.
//!
//! [`flows::AuthSession`] hands out one lazily created [`flows::TokenProvider`] per scope set,
//! [`fetch::AuthenticatedFetcher`] attaches the minted [`auth::BearerToken`] to outbound requests,
//! and [`mail`] turns the raw responses into typed message pages.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flows;
pub mod http;
pub mod mail;
pub mod oauth;
pub mod obs;
pub mod provider;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, hash_map::DefaultHasher},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use {clap as _, color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tracing_subscriber as _};
