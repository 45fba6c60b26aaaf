//! Panel-level error taxonomy

use crate::client::ApiError;
use crate::presets::PresetError;
use crate::validator::ValidationError;

/// Errors surfaced by [`crate::panel::TradingPanel`]
///
/// Validation errors are recovered locally as inline messages and submission
/// failures are converted to notifications; neither propagates past the panel.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Balance query failed: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Preset(#[from] PresetError),
}

pub type Result<T> = std::result::Result<T, PanelError>;
