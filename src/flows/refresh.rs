//! Silent renewal through the refresh token grant.
//!
//! A provider whose cached record carries a refresh token redeems it before falling back to the
//! device flow. The authority may rotate the refresh token; when it does not, the redeemed one is
//! kept on the new record.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, TokenRecord},
	flows::TokenProvider,
	http::TokenHttpClient,
	oauth::{DeviceFacade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::GrantType,
};

impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) async fn refresh_silently(&self, refresh_token: &BearerToken) -> Result<TokenRecord> {
		obs::observe(FlowKind::Refresh, "refresh_silently", async move {
			self.ensure_supported(GrantType::RefreshToken)?;

			let facade = <DeviceFacade<C, M>>::from_descriptor(
				&self.descriptor,
				self.client_id,
				self.http_client.clone(),
				self.transport_mapper.clone(),
			)?;
			let record =
				facade.refresh_token(self.strategy.as_ref(), &self.scope, refresh_token).await?;

			self.metrics.record_silent_refresh();

			Ok(record)
		})
		.await
	}
}
