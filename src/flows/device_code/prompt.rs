//! Presentation of device-code instructions.

// self
use crate::_prelude::*;

/// What the user needs to complete a device authorization on another device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationInstructions {
	/// Code the user types on the verification page.
	pub user_code: String,
	/// Page where the code is entered.
	pub verification_uri: String,
	/// Page with the code pre-filled, when the authority provides one.
	pub verification_uri_complete: Option<String>,
	/// Lifetime of the device code.
	pub expires_in: Duration,
	/// Authority-supplied text ready to show verbatim.
	pub message: Option<String>,
}
impl Display for VerificationInstructions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.message {
			Some(message) => f.write_str(message),
			None => write!(
				f,
				"To sign in, open {} and enter the code {} (valid for {} minutes).",
				self.verification_uri,
				self.user_code,
				self.expires_in.whole_minutes()
			),
		}
	}
}

/// Collaborator that shows device-code instructions to the user.
pub trait DeviceCodePrompt: Send + Sync {
	/// Called once per device authorization, before polling starts.
	fn present(&self, instructions: &VerificationInstructions);
}

/// Prints the instructions to standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsolePrompt;
impl DeviceCodePrompt for ConsolePrompt {
	fn present(&self, instructions: &VerificationInstructions) {
		println!("{instructions}");
	}
}
