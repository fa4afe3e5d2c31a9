//! Thin async client for the Docker Engine remote API.
//!
//! The crate composes request paths, serializes creation payloads and maps
//! JSON responses onto lightweight image/container objects; everything else
//! is delegated to the daemon on the other side of the socket. Responses
//! are fully buffered before parsing; there is no streaming surface.

pub use client::{Client, ListParams};
pub use configuration::{ClientConfig, ConfigError};
pub use docker::{
    Container, Entity, EntityOptions, Error, Image, Kind, PullAuth, PullOptions, Result,
};

pub mod client;
pub mod configuration;
pub mod docker;
