//! Signs in with the device-code flow and counts the latest messages returned by the Outlook REST
//! API and Microsoft Graph.

// std
use std::process::ExitCode;
// crates.io
use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use mail_probe::{
	config::{DEFAULT_TENANT, ProbeConfig},
	error::ConfigError,
	flows::AuthSession,
	mail::{self, MailEndpoint},
};

const RULE: &str = "------------------------------------------------";
const BANNER: &str = "================================================";

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
	/// Application (client) id registered with the Microsoft identity platform.
	#[arg(env = "MAIL_PROBE_CLIENT_ID")]
	client_id: Option<String>,
	/// Directory tenant (`common`, `organizations`, `consumers`, a domain, or a GUID).
	#[arg(long, default_value = DEFAULT_TENANT)]
	tenant: String,
	/// Only request the N most recent messages per endpoint.
	#[arg(long, value_name = "N")]
	top: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "mail_probe=info".into()))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let cli = Cli::parse();

	println!("{BANNER}");
	println!("Welcome to the Outlook to Microsoft Graph probe");
	println!("{BANNER}");

	let config = match ProbeConfig::resolve(cli.client_id.as_deref(), &cli.tenant, cli.top) {
		Ok(config) => config,
		Err(ConfigError::InvalidClientId { value, .. }) => {
			println!("Bad clientId format: {value}");

			return Ok(ExitCode::FAILURE);
		},
		Err(e) => return Err(e.into()),
	};

	println!("{RULE}");
	println!("Using the following Client Id: {}", config.client_id);
	println!("{RULE}");

	if config.client_id.is_placeholder() {
		tracing::warn!("no client id supplied; the authority will reject the placeholder");
	}

	let session = AuthSession::new(config.descriptor()?, config.client_id)?;
	let fetcher = session.fetcher();

	for endpoint in MailEndpoint::ALL {
		let scopes = endpoint.scopes()?;

		println!("{RULE}");
		println!("{endpoint} : Getting the latest messages");
		println!("{RULE}");
		println!("Authenticating using following scopes: {scopes}");

		let token = session.acquire(&scopes).await?;
		let page = mail::fetch_messages(&fetcher, &token, &endpoint.messages_url(config.top)?).await?;

		println!("Message Count: {}", page.count());
	}

	tracing::info!(
		interactive = session.metrics.interactive(),
		silent_refreshes = session.metrics.silent_refreshes(),
		cache_hits = session.metrics.cache_hits(),
		"token acquisition summary"
	);

	Ok(ExitCode::SUCCESS)
}
