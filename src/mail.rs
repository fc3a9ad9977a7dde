//! Message listing for the Outlook REST API and Microsoft Graph.
//!
//! Both endpoints return an OData collection whose `value` array holds message resources. Only
//! the fields needed to identify and describe a message are decoded; everything else is ignored.

// crates.io
use reqwest::Method;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, ScopeSet},
	error::{ConfigError, DeserializationError, NetworkError},
	fetch::AuthenticatedFetcher,
};

const PREVIEW_LIMIT: usize = 256;

/// Largest `$top` both endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Mail endpoints the probe talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MailEndpoint {
	/// Legacy Outlook REST API v2.0.
	OutlookRest,
	/// Microsoft Graph v1.0.
	Graph,
}
impl MailEndpoint {
	/// Every endpoint, in the order the probe queries them.
	pub const ALL: [Self; 2] = [Self::OutlookRest, Self::Graph];

	/// Human-readable name used in banners.
	pub const fn label(self) -> &'static str {
		match self {
			Self::OutlookRest => "Outlook REST APIs",
			Self::Graph => "Microsoft Graph",
		}
	}

	/// Scope strings the endpoint requires.
	pub const fn scope_strings(self) -> &'static [&'static str] {
		match self {
			Self::OutlookRest =>
				&["https://outlook.office.com/User.Read", "https://outlook.office.com/Mail.Read"],
			Self::Graph =>
				&["https://graph.microsoft.com/User.Read", "https://graph.microsoft.com/Mail.Read"],
		}
	}

	/// Scope set the endpoint requires.
	pub fn scopes(self) -> Result<ScopeSet, ConfigError> {
		ScopeSet::new(self.scope_strings().iter().copied()).map_err(ConfigError::from)
	}

	/// Collection URL listing the signed-in user's messages.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::OutlookRest => "https://outlook.office.com/api/v2.0/me/messages",
			Self::Graph => "https://graph.microsoft.com/v1.0/me/messages",
		}
	}

	/// Messages URL, optionally limited to the `top` most recent messages.
	pub fn messages_url(self, top: Option<u32>) -> Result<Url, ConfigError> {
		let mut url = Url::parse(self.base_url())
			.map_err(|source| ConfigError::InvalidResourceUrl { source })?;

		if let Some(top) = top {
			if top == 0 || top > MAX_PAGE_SIZE {
				return Err(ConfigError::InvalidPageSize { value: top, max: MAX_PAGE_SIZE });
			}

			url.query_pairs_mut().append_pair("$top", &top.to_string());
		}

		Ok(url)
	}
}
impl Display for MailEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// One page of a message collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
	/// Messages on this page.
	pub value: Vec<MessageSummary>,
	/// Link to the next page, when the collection continues.
	#[serde(default, rename = "@odata.nextLink", skip_serializing_if = "Option::is_none")]
	pub next_link: Option<String>,
}
impl MessagePage {
	/// Number of messages on this page.
	pub fn count(&self) -> usize {
		self.value.len()
	}
}

/// Identifying fields of a message.
///
/// Graph spells fields in camelCase and the Outlook REST API in PascalCase; both are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
	/// Opaque message identifier.
	#[serde(alias = "Id")]
	pub id: String,
	/// Subject line.
	#[serde(default, alias = "Subject")]
	pub subject: Option<String>,
	/// When the message arrived.
	#[serde(default, alias = "ReceivedDateTime", with = "time::serde::rfc3339::option")]
	pub received_date_time: Option<OffsetDateTime>,
}

/// Lists messages at `url`.
///
/// Non-success statuses become [`Error::UnexpectedStatus`] with a truncated body preview; bodies
/// that do not match [`MessagePage`] become [`DeserializationError`].
pub async fn fetch_messages(
	fetcher: &AuthenticatedFetcher,
	token: &BearerToken,
	url: &Url,
) -> Result<MessagePage> {
	let response = fetcher.fetch(Method::GET, token, url).await?;
	let status = response.status();
	let body =
		response.bytes().await.map_err(|e| NetworkError::from_reqwest("the mail endpoint", e))?;

	if !status.is_success() {
		return Err(Error::UnexpectedStatus { status: status.as_u16(), preview: preview(&body) });
	}

	let mut de = serde_json::Deserializer::from_slice(&body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| {
		DeserializationError::Json { source, status: Some(status.as_u16()) }.into()
	})
}

fn preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	match trimmed.char_indices().nth(PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &trimmed[..cut]),
		None => trimmed.to_owned(),
	}
}
