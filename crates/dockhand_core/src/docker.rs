use http::StatusCode;
use thiserror::Error as ThisError;

use crate::docker::transport::TransportError;

pub use container::Container;
pub use entity::{Entity, EntityOptions, Kind};
pub use image::{Image, PullAuth, PullOptions};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid name {name:?}: allowed characters are a-z, A-Z, 0-9, _ and -")]
    InvalidName { name: String },
    #[error("no such {kind}: {reference}")]
    NotFound { kind: Kind, reference: String },
    #[error("pull failed: {message}")]
    Pull { message: String },
    #[error("{reference} has no resolved id, inspect it first")]
    NotInspected { reference: String },
    #[error("Docker Engine API error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn is_404(err: &TransportError) -> bool {
    matches!(
        err,
        TransportError::UnsuccessfulResponse { status, .. } if *status == StatusCode::NOT_FOUND
    )
}

/// Container names accept one optional leading slash followed by
/// `[a-zA-Z0-9_-]`. Checked before any request leaves the process.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let bare = name.strip_prefix('/').unwrap_or(name);

    let ok = !bare.is_empty()
        && bare
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if ok {
        Ok(())
    } else {
        Err(Error::InvalidName {
            name: name.to_owned(),
        })
    }
}

pub mod container;
pub mod entity;
pub mod image;
pub mod transport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_validation() {
        assert!(validate_name("myRedis123").is_ok());
        assert!(validate_name("/with-leading-slash").is_ok());
        assert!(validate_name("under_score-dash").is_ok());
    }

    #[test]
    fn names_with_foreign_characters_fail() {
        for bad in ["bad name!", "semi;colon", "col:on", "", "/", "dot.dot"] {
            assert!(
                matches!(validate_name(bad), Err(Error::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
