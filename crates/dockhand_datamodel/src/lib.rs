//! Wire-level types for the Docker Engine remote API: the registry auth
//! descriptor, container-creation payloads, image history entries and the
//! line-delimited pull progress format.

pub use auth::{RegistryAuth, DEFAULT_REGISTRY};
pub use container::{ContainerConfig, CreateContainerResponse, HostConfig, RestartPolicy};
pub use image::{ErrorDetail, HistoryEntry, PullLine};

pub mod auth;
pub mod container;
pub mod image;
