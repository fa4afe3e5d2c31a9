use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};
use url::form_urlencoded;

use dockhand_datamodel::{
    ContainerConfig, CreateContainerResponse, HistoryEntry, PullLine, RegistryAuth,
};

use crate::docker::container::Container;
use crate::docker::entity::{Entity, Kind};
use crate::docker::transport::{Channel, TransportError};
use crate::docker::{self, Error};

/// Where the registry credential for a pull comes from.
#[derive(Debug, Clone, Default)]
pub enum PullAuth {
    /// No `X-Registry-Auth` header.
    #[default]
    Anonymous,
    /// The header value the client derived at construction.
    Stored,
    /// A one-off descriptor overriding the stored one.
    Override(RegistryAuth),
}

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub tag: Option<String>,
    pub repo: Option<String>,
    pub registry: Option<String>,
    pub auth: PullAuth,
}

/// An image-kind entity with the image action set bound to it.
#[derive(Debug)]
pub struct Image {
    entity: Entity,
}

impl Deref for Image {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

impl DerefMut for Image {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

fn pull_query(reference: &str, options: &PullOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("fromImage", reference);

    if let Some(tag) = &options.tag {
        query.append_pair("tag", tag);
    }
    if let Some(repo) = &options.repo {
        query.append_pair("repo", repo);
    }
    if let Some(registry) = &options.registry {
        query.append_pair("registry", registry);
    }

    query.finish()
}

impl Image {
    pub fn new(name: &str, tag: Option<String>, channel: Channel) -> Self {
        Image {
            entity: Entity::new(name, Kind::Image, tag, channel),
        }
    }

    pub(crate) fn from_entity(entity: Entity) -> Self {
        debug_assert_eq!(entity.kind(), Kind::Image);
        Image { entity }
    }

    pub(crate) fn with_auth(mut self, auth: Option<String>) -> Self {
        self.entity = self.entity.with_auth(auth);
        self
    }

    pub fn into_entity(self) -> Entity {
        self.entity
    }

    /// `POST /images/create?fromImage=<reference>...`.
    ///
    /// The daemon answers 200 and streams progress lines even when the
    /// pull fails; any line carrying `errorDetail` turns into
    /// [`Error::Pull`]. On success a fresh deferred image is returned;
    /// inspect it if its metadata is needed.
    pub async fn pull(&self, options: &PullOptions) -> docker::Result<Image> {
        let path = format!("/images/create?{}", pull_query(&self.entity.reference, options));

        let header = match &options.auth {
            PullAuth::Anonymous => None,
            PullAuth::Stored => self.entity.auth.clone(),
            PullAuth::Override(auth) => Some(
                auth.header_value()
                    .map_err(TransportError::SerializeRequestBody)?,
            ),
        };

        tracing::debug!("pulling {}", self.entity.reference);
        let body = self.entity.channel.post_buffered(&path, header.as_deref()).await?;

        for line in body.split(|byte| *byte == b'\n') {
            if line.is_empty() {
                continue;
            }
            let Ok(progress) = serde_json::from_slice::<PullLine>(line) else {
                continue;
            };

            if let Some(detail) = progress.error_detail {
                return Err(Error::Pull {
                    message: detail.message,
                });
            }
            if let Some(message) = progress.error {
                return Err(Error::Pull { message });
            }
        }

        let tag = options
            .tag
            .clone()
            .or_else(|| self.entity.tag.clone());

        Ok(
            Image::new(&self.entity.name, tag, self.entity.channel.clone())
                .with_auth(self.entity.auth.clone()),
        )
    }

    /// Layer history by resolved id, fetched once and cached; repeat calls
    /// answer from the cache without touching the daemon.
    pub async fn history(&mut self) -> docker::Result<&[HistoryEntry]> {
        if self.entity.history.is_none() {
            let id = self.entity.id.clone().ok_or_else(|| Error::NotInspected {
                reference: self.entity.reference.clone(),
            })?;

            let path = format!("/{}/{}/history", self.entity.kind.segment(), id);
            let entries: Vec<HistoryEntry> = self.entity.channel.get_json(&path).await?;
            self.entity.history = Some(entries);
        }

        Ok(self.entity.history.as_deref().unwrap_or_default())
    }

    /// Drops the cached history so the next call fetches again.
    pub fn invalidate_history(&mut self) {
        self.entity.history = None;
    }

    /// Inspect (pulling first when the daemon does not know the image),
    /// create a container named `name` from the merged creation payload,
    /// start it, and hand it back. Caller-supplied `details` win over the
    /// defaults key by key; the first failing step aborts the chain.
    pub async fn run(&mut self, name: &str, details: &Map<String, Value>) -> docker::Result<Container> {
        docker::validate_name(name)?;

        if let Err(e) = self.entity.inspect().await {
            match e {
                Error::NotFound { .. } => {
                    self.pull(&PullOptions::default()).await?;
                    self.entity.inspect().await?;
                }
                other => return Err(other),
            }
        }

        let id = self.entity.id.clone().ok_or_else(|| Error::NotInspected {
            reference: self.entity.reference.clone(),
        })?;

        let mut config = ContainerConfig {
            image: id,
            ..ContainerConfig::default()
        };
        config.exposed_ports = self
            .entity
            .fields
            .get("Config")
            .and_then(|image_config| image_config.get("ExposedPorts"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut payload =
            serde_json::to_value(&config).map_err(TransportError::SerializeRequestBody)?;
        if let Some(map) = payload.as_object_mut() {
            for (key, value) in details {
                map.insert(key.clone(), value.clone());
            }
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("name", name);
        let path = format!("/containers/create?{}", query.finish());

        tracing::debug!("creating container {name} from {}", self.entity.reference);
        let response: CreateContainerResponse =
            self.entity.channel.post_json(&path, &payload).await?;

        for warning in response.warnings.iter().flatten() {
            tracing::warn!("daemon warning while creating container {name}: {warning}");
        }

        let mut container = Container::new(name, None, self.entity.channel.clone())
            .with_auth(self.entity.auth.clone());
        container.absorb(Map::from_iter([(
            "Id".to_owned(),
            Value::from(response.id),
        )]));

        container.start(0).await?;
        Ok(container)
    }
}
