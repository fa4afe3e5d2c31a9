use std::collections::HashMap;

use serde_json::{Map, Value};
use url::form_urlencoded;

use dockhand_datamodel::RegistryAuth;

use crate::configuration::ClientConfig;
use crate::docker::container::Container;
use crate::docker::entity::{Entity, EntityOptions, Kind};
use crate::docker::image::{Image, PullOptions};
use crate::docker;
use crate::docker::transport::{Channel, TransportError};

/// Parameters for `list`. `filters` is a name-to-values map serialized as
/// embedded JSON inside the query string, the way the Engine expects it.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub all: bool,
    pub limit: Option<i64>,
    pub since: Option<String>,
    pub before: Option<String>,
    pub size: bool,
    pub filters: HashMap<String, Vec<String>>,
}

impl ListParams {
    fn to_query(&self) -> Result<String, TransportError> {
        let mut query = form_urlencoded::Serializer::new(String::new());

        if self.all {
            query.append_pair("all", "true");
        }
        if let Some(limit) = self.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(since) = &self.since {
            query.append_pair("since", since);
        }
        if let Some(before) = &self.before {
            query.append_pair("before", before);
        }
        if self.size {
            query.append_pair("size", "true");
        }
        if !self.filters.is_empty() {
            let filters =
                serde_json::to_string(&self.filters).map_err(TransportError::SerializeRequestBody)?;
            query.append_pair("filters", &filters);
        }

        Ok(query.finish())
    }
}

/// Facade over one daemon connection.
///
/// Holds the channel and the registry auth header derived once at
/// construction, and tracks nothing else; every entity it hands out
/// carries its own copy of both.
#[derive(Debug, Clone)]
pub struct Client {
    channel: Channel,
    auth: Option<String>,
}

impl Client {
    pub fn new(host: &str, auth: Option<&RegistryAuth>) -> docker::Result<Self> {
        let channel = Channel::open(host)?;

        let auth = match auth {
            Some(descriptor) => Some(
                descriptor
                    .header_value()
                    .map_err(TransportError::SerializeRequestBody)?,
            ),
            None => None,
        };

        Ok(Client { channel, auth })
    }

    pub fn from_config(config: &ClientConfig) -> docker::Result<Self> {
        Self::new(&config.host, config.auth.as_ref())
    }

    /// An image handle; inspected before returning unless
    /// `options.delay` is set.
    pub async fn image(&self, name: &str, options: &EntityOptions) -> docker::Result<Image> {
        let mut image =
            Image::new(name, options.tag.clone(), self.channel.clone()).with_auth(self.auth.clone());

        if !options.delay {
            image.inspect().await?;
        }

        Ok(image)
    }

    /// A container handle; inspected before returning unless
    /// `options.delay` is set.
    pub async fn container(&self, name: &str, options: &EntityOptions) -> docker::Result<Container> {
        let mut container = Container::new(name, options.tag.clone(), self.channel.clone())
            .with_auth(self.auth.clone());

        if !options.delay {
            container.inspect().await?;
        }

        Ok(container)
    }

    /// `GET /<kind>s/json`; every summary becomes a deferred entity
    /// carrying this client's channel and auth.
    pub async fn list(&self, kind: Kind, params: &ListParams) -> docker::Result<Vec<Entity>> {
        let query = params.to_query()?;
        let path = if query.is_empty() {
            format!("/{}/json", kind.segment())
        } else {
            format!("/{}/json?{query}", kind.segment())
        };

        let summaries: Vec<Map<String, Value>> = self.channel.get_json(&path).await?;

        Ok(summaries
            .into_iter()
            .map(|summary| {
                Entity::from_summary(kind, summary, self.channel.clone(), self.auth.clone())
            })
            .collect())
    }

    pub async fn images(&self, params: &ListParams) -> docker::Result<Vec<Image>> {
        Ok(self
            .list(Kind::Image, params)
            .await?
            .into_iter()
            .map(Image::from_entity)
            .collect())
    }

    pub async fn containers(&self, params: &ListParams) -> docker::Result<Vec<Container>> {
        Ok(self
            .list(Kind::Container, params)
            .await?
            .into_iter()
            .map(Container::from_entity)
            .collect())
    }

    /// Pulls `image_name` (tag split off or taken from `options`) and
    /// returns the deferred image handle.
    pub async fn pull(&self, image_name: &str, options: &PullOptions) -> docker::Result<Image> {
        let image = Image::new(image_name, options.tag.clone(), self.channel.clone())
            .with_auth(self.auth.clone());

        image.pull(options).await
    }

    /// Creates and starts a container `name` from `image`; the composite
    /// inspect/pull → create → start chain lives on [`Image::run`].
    pub async fn run(
        &self,
        name: &str,
        image: &str,
        details: &Map<String, Value>,
    ) -> docker::Result<Container> {
        docker::validate_name(name)?;

        let mut image =
            Image::new(image, None, self.channel.clone()).with_auth(self.auth.clone());
        image.run(name, details).await
    }

    /// `GET /_ping`; cheap reachability probe.
    pub async fn ping(&self) -> docker::Result<()> {
        self.channel.get("/_ping").await?;
        Ok(())
    }
}
