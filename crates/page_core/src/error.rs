use thiserror::Error;

use crate::rotator::RotatorError;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to start role rotator: {0}")]
    Rotator(#[from] RotatorError),
}
