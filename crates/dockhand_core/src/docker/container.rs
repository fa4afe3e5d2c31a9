use std::ops::{Deref, DerefMut};

use http::StatusCode;

use crate::docker;
use crate::docker::entity::{Entity, Kind};
use crate::docker::transport::{Channel, TransportError};

/// A container-kind entity with the lifecycle action set bound to it.
#[derive(Debug)]
pub struct Container {
    entity: Entity,
}

impl Deref for Container {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

impl DerefMut for Container {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl Container {
    pub fn new(name: &str, tag: Option<String>, channel: Channel) -> Self {
        Container {
            entity: Entity::new(name, Kind::Container, tag, channel),
        }
    }

    pub(crate) fn from_entity(entity: Entity) -> Self {
        debug_assert_eq!(entity.kind(), Kind::Container);
        Container { entity }
    }

    pub(crate) fn with_auth(mut self, auth: Option<String>) -> Self {
        self.entity = self.entity.with_auth(auth);
        self
    }

    pub fn into_entity(self) -> Entity {
        self.entity
    }

    /// `POST /containers/<reference>/start?t=<seconds>`.
    pub async fn start(&self, delay_seconds: u64) -> docker::Result<()> {
        self.lifecycle("start", delay_seconds).await
    }

    /// `POST /containers/<reference>/stop?t=<seconds>`.
    pub async fn stop(&self, delay_seconds: u64) -> docker::Result<()> {
        self.lifecycle("stop", delay_seconds).await
    }

    /// `POST /containers/<reference>/restart?t=<seconds>`.
    pub async fn restart(&self, delay_seconds: u64) -> docker::Result<()> {
        self.lifecycle("restart", delay_seconds).await
    }

    async fn lifecycle(&self, action: &str, delay_seconds: u64) -> docker::Result<()> {
        let path = format!("{}?t={delay_seconds}", self.entity.uri(&[action]));
        tracing::debug!("{action} {}", self.entity.reference);

        match self.entity.channel.post_unit(&path).await {
            // 304: already in the requested state
            Err(TransportError::UnsuccessfulResponse { status, .. })
                if status == StatusCode::NOT_MODIFIED =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
            Ok(()) => Ok(()),
        }
    }

    /// Deletes the container even if it is running, together with its
    /// anonymous volumes.
    pub async fn force_remove(&self) -> docker::Result<()> {
        let path = format!("{}?force=true&v=true", self.entity.uri(&[]));
        tracing::debug!("force-removing container {}", self.entity.reference);

        self.entity.channel.delete(&path).await?;
        Ok(())
    }
}
