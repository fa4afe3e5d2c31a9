use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use dockhand_datamodel::HistoryEntry;

use crate::docker::transport::Channel;
use crate::docker::{self, Error};

/// The two entity categories the Engine addresses by reference. Fixed at
/// construction; decides which action set a wrapper exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Image,
    Container,
}

impl Kind {
    /// Pluralized path segment (`/images/...`, `/containers/...`).
    pub fn segment(&self) -> &'static str {
        match self {
            Kind::Image => "images",
            Kind::Container => "containers",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Image => "image",
            Kind::Container => "container",
        })
    }
}

/// Construction options for facade-built entities.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    pub tag: Option<String>,
    /// Skip the immediate inspect; no network traffic until one is
    /// requested explicitly.
    pub delay: bool,
}

/// One addressable Engine entity: an image or a container.
///
/// Everything the daemon reports about it lands verbatim in an open field
/// bag; the handful of fields the client itself reasons about (id, sizes,
/// creation time) are additionally kept typed. The connection handle and
/// auth string ride along for the entity's own requests and are never part
/// of the serializable view.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) name: String,
    pub(crate) tag: Option<String>,
    pub(crate) reference: String,
    pub(crate) kind: Kind,
    pub(crate) id: Option<String>,
    pub(crate) parent_id: Option<String>,
    pub(crate) size: i64,
    pub(crate) virtual_size: i64,
    pub(crate) created: Option<DateTime<Utc>>,
    pub(crate) fields: Map<String, Value>,
    pub(crate) history: Option<Vec<HistoryEntry>>,
    pub(crate) channel: Channel,
    pub(crate) auth: Option<String>,
}

impl Entity {
    /// A name carrying a colon and no explicit tag splits at the last
    /// colon, so `name:tag` always reassembles into the reference even
    /// when the name embeds a registry port.
    pub fn new(name: &str, kind: Kind, tag: Option<String>, channel: Channel) -> Self {
        let (name, tag) = match tag {
            Some(tag) => (name.to_owned(), Some(tag)),
            None => match name.rsplit_once(':') {
                Some((name, tag)) => (name.to_owned(), Some(tag.to_owned())),
                None => (name.to_owned(), None),
            },
        };

        let reference = match &tag {
            Some(tag) => format!("{name}:{tag}"),
            None => name.clone(),
        };

        Entity {
            name,
            tag,
            reference,
            kind,
            id: None,
            parent_id: None,
            size: 0,
            virtual_size: 0,
            created: None,
            fields: Map::new(),
            history: None,
            channel,
            auth: None,
        }
    }

    pub(crate) fn with_auth(mut self, auth: Option<String>) -> Self {
        self.auth = auth;
        self
    }

    /// A deferred entity out of one `/<kind>s/json` summary. The display
    /// name comes from the first repo tag or container name when the
    /// daemon supplies one, the daemon id otherwise.
    pub(crate) fn from_summary(
        kind: Kind,
        summary: Map<String, Value>,
        channel: Channel,
        auth: Option<String>,
    ) -> Self {
        let display = match kind {
            Kind::Image => summary
                .get("RepoTags")
                .and_then(Value::as_array)
                .and_then(|tags| tags.first())
                .and_then(Value::as_str)
                .filter(|tag| *tag != "<none>:<none>")
                .map(str::to_owned),
            Kind::Container => summary
                .get("Names")
                .and_then(Value::as_array)
                .and_then(|names| names.first())
                .and_then(Value::as_str)
                .map(|name| name.trim_start_matches('/').to_owned()),
        };

        let name = display.unwrap_or_else(|| {
            summary
                .get("Id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        });

        let mut entity = Entity::new(&name, kind, None, channel).with_auth(auth);
        entity.absorb(summary);
        entity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Daemon-assigned id; `None` until inspected (or listed).
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// One daemon-reported field, verbatim.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn size_bytes(&self) -> i64 {
        self.size
    }

    pub fn size_human(&self) -> String {
        human_size(self.size)
    }

    pub fn virtual_size_bytes(&self) -> i64 {
        self.virtual_size
    }

    pub fn virtual_size_human(&self) -> String {
        human_size(self.virtual_size)
    }

    /// Joins the kind segment, the reference and any trailing segments
    /// with single separators.
    pub fn uri(&self, trailing: &[&str]) -> String {
        let mut path = format!("/{}/{}", self.kind.segment(), self.reference);

        for segment in trailing {
            path.push('/');
            path.push_str(segment);
        }

        path
    }

    /// `GET /<kind>s/<reference>/json`; every reported field overwrites
    /// the bag entry of the same name, and the typed extracts follow.
    pub async fn inspect(&mut self) -> docker::Result<()> {
        let path = self.uri(&["json"]);
        tracing::debug!("inspecting {} {}", self.kind, self.reference);

        let info: Map<String, Value> = match self.channel.get_json(&path).await {
            Err(e) if docker::is_404(&e) => {
                return Err(Error::NotFound {
                    kind: self.kind,
                    reference: self.reference.clone(),
                });
            }
            Err(e) => return Err(e.into()),
            Ok(info) => info,
        };

        self.absorb(info);
        Ok(())
    }

    pub(crate) fn absorb(&mut self, info: Map<String, Value>) {
        for (key, value) in info {
            self.fields.insert(key, value);
        }

        if let Some(id) = self.fields.get("Id").and_then(Value::as_str) {
            self.id = Some(id.to_owned());
        }
        if let Some(parent) = self.fields.get("ParentId").and_then(Value::as_str) {
            self.parent_id = Some(parent.to_owned());
        }
        if let Some(size) = self.fields.get("Size").and_then(Value::as_i64) {
            self.size = size;
        }
        if let Some(size) = self.fields.get("VirtualSize").and_then(Value::as_i64) {
            self.virtual_size = size;
        }

        // inspect responses carry RFC 3339 strings, list summaries unix
        // seconds; accept both
        match self.fields.get("Created") {
            Some(Value::String(created)) => {
                if let Ok(created) = DateTime::parse_from_rfc3339(created) {
                    self.created = Some(created.with_timezone(&Utc));
                }
            }
            Some(Value::Number(created)) => {
                if let Some(seconds) = created.as_i64() {
                    self.created = DateTime::from_timestamp(seconds, 0);
                }
            }
            _ => {}
        }
    }

    /// `DELETE /<kind>s/<reference>`. Terminal: the daemon no longer knows
    /// the reference afterwards, and further action methods will fail with
    /// whatever the daemon answers.
    pub async fn delete(&self) -> docker::Result<()> {
        tracing::debug!("deleting {} {}", self.kind, self.reference);
        self.channel.delete(&self.uri(&[])).await?;
        Ok(())
    }

    /// External representation: the open field bag plus the client-side
    /// identity fields. The connection handle, the auth string and the
    /// history cache never appear here.
    pub fn to_serializable(&self) -> Map<String, Value> {
        let mut view = self.fields.clone();

        view.insert("name".to_owned(), Value::from(self.name.as_str()));
        if let Some(tag) = &self.tag {
            view.insert("tag".to_owned(), Value::from(tag.as_str()));
        }
        view.insert("reference".to_owned(), Value::from(self.reference.as_str()));
        view.insert("kind".to_owned(), Value::from(self.kind.to_string()));
        if let Some(id) = &self.id {
            view.insert("id".to_owned(), Value::from(id.as_str()));
        }
        if let Some(parent) = &self.parent_id {
            view.insert("parentId".to_owned(), Value::from(parent.as_str()));
        }
        view.insert("size".to_owned(), Value::from(self.size));
        view.insert("virtualSize".to_owned(), Value::from(self.virtual_size));
        if let Some(created) = self.created {
            view.insert(
                "created".to_owned(),
                Value::from(created.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }

        view
    }
}

/// Metric rendering: exact bytes below 1 kB, one decimal above
/// ("910 B", "1.5 kB", "2.0 MB").
pub(crate) fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];

    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit + 1 < UNITS.len() {
        value /= 1000.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}
