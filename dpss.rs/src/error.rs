#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaperError {
	#[error("invalid parameter `{name}`: {reason}")]
	InvalidParameter { name: &'static str, reason: String },
}

impl TaperError {
	pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidParameter {
			name,
			reason: reason.into(),
		}
	}
}
