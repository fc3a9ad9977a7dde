//! Interactive device authorization (RFC 8628).
//!
//! The provider requests a device and user code, hands the instructions to its
//! [`DeviceCodePrompt`], and polls the token endpoint at the interval the authority dictates.
//! `authorization_pending` keeps polling, `slow_down` widens the interval up to the descriptor's
//! cap, and `access_denied` / `expired_token` end the flow with
//! [`crate::error::AuthenticationError::Declined`] / [`crate::error::AuthenticationError::Expired`].

pub mod prompt;

pub use prompt::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	flows::TokenProvider,
	http::TokenHttpClient,
	oauth::{self, DeviceFacade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::GrantType,
};

impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) async fn run_device_flow(&self) -> Result<TokenRecord> {
		obs::observe(FlowKind::DeviceCode, "run_device_flow", async move {
			self.ensure_supported(GrantType::DeviceCode)?;

			let facade = <DeviceFacade<C, M>>::from_descriptor(
				&self.descriptor,
				self.client_id,
				self.http_client.clone(),
				self.transport_mapper.clone(),
			)?;
			let authorization = facade
				.request_device_authorization(
					self.strategy.as_ref(),
					&self.scope,
					self.descriptor.quirks.request_offline_access,
				)
				.await?;

			self.metrics.record_interactive();
			self.prompt.present(&oauth::instructions(&authorization));

			facade
				.poll_device_token(
					self.strategy.as_ref(),
					&self.scope,
					&authorization,
					StdDuration::from_secs(self.descriptor.quirks.max_poll_interval_secs),
					self.poll_timeout,
				)
				.await
		})
		.await
	}
}
