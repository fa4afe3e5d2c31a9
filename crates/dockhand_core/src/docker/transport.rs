//! HTTP channel to the daemon.
//!
//! A single `Channel` serves both transports the Engine listens on: a Unix
//! domain socket (`unix://` or a bare absolute path) and plain TCP
//! (`http://`, with Docker's customary `tcp://` accepted as an alias). The
//! connector enum switches on the scheme once at open time; every request
//! helper buffers the full response body before parsing it.

use std::error::Error as StdError;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode, Uri};
use hyper::body::Bytes;
use hyper::client::connect::{Connected, Connection, HttpConnector};
use hyper::{Body, Client};
use hyperlocal::UnixConnector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tower_service::Service;
use url::Url;

pub const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not parse daemon address {0:?}")]
    ParseHost(String),
    #[error("could not construct request URL")]
    ConstructUrl(#[source] BoxError),
    #[error("could not construct request")]
    ConstructRequest(#[source] http::Error),
    #[error("could not reach the daemon")]
    ExecuteRequest(#[source] hyper::Error),
    #[error("daemon responded with status {status}: {body}")]
    UnsuccessfulResponse { status: StatusCode, body: String },
    #[error("could not read the response body")]
    ReadResponse(#[source] hyper::Error),
    #[error("could not deserialize the response body")]
    ParseResponseBody(#[source] serde_json::Error),
    #[error("could not serialize the request body")]
    SerializeRequestBody(#[source] serde_json::Error),
}

/// How to reach the daemon: a socket path or an HTTP base URL.
#[derive(Debug, Clone)]
pub enum Scheme {
    Unix(String),
    Http(String),
}

#[derive(Debug, Clone)]
pub enum Connector {
    Unix(UnixConnector),
    Http(HttpConnector),
}

impl Service<Uri> for Connector {
    type Response = Stream;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self {
            Connector::Unix(connector) => connector.poll_ready(cx).map_err(BoxError::from),
            Connector::Http(connector) => connector.poll_ready(cx).map_err(BoxError::from),
        }
    }

    fn call(&mut self, req: Uri) -> Self::Future {
        match self {
            Connector::Unix(connector) => {
                let fut = connector
                    .call(req)
                    .map(|stream| stream.map(Stream::Unix).map_err(BoxError::from));
                Box::pin(fut)
            }
            Connector::Http(connector) => {
                let fut = connector
                    .call(req)
                    .map(|stream| stream.map(Stream::Http).map_err(BoxError::from));
                Box::pin(fut)
            }
        }
    }
}

pub enum Stream {
    Unix(<UnixConnector as Service<Uri>>::Response),
    Http(<HttpConnector as Service<Uri>>::Response),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Http(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Http(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Unix(stream) => Pin::new(stream).poll_flush(cx),
            Self::Http(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Http(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

impl Connection for Stream {
    fn connected(&self) -> Connected {
        match self {
            Stream::Unix(stream) => stream.connected(),
            Stream::Http(stream) => stream.connected(),
        }
    }
}

/// Cheap-to-clone handle on one daemon connection.
#[derive(Debug, Clone)]
pub struct Channel {
    client: Client<Connector, Body>,
    scheme: Scheme,
}

impl Channel {
    /// Opens a channel for `unix://<path>`, a bare absolute socket path,
    /// or an `http://`/`tcp://` address. No traffic is sent until the
    /// first request.
    pub fn open(host: &str) -> Result<Self, TransportError> {
        let (connector, scheme) = if let Some(path) = host.strip_prefix("unix://") {
            (Connector::Unix(UnixConnector), Scheme::Unix(path.to_owned()))
        } else if host.starts_with('/') {
            (Connector::Unix(UnixConnector), Scheme::Unix(host.to_owned()))
        } else if let Some(address) = host.strip_prefix("tcp://") {
            (
                Connector::Http(HttpConnector::new()),
                Scheme::Http(format!("http://{address}")),
            )
        } else if host.starts_with("http://") {
            (
                Connector::Http(HttpConnector::new()),
                Scheme::Http(host.to_owned()),
            )
        } else {
            return Err(TransportError::ParseHost(host.to_owned()));
        };

        let client = Client::builder().build(connector);
        Ok(Channel { client, scheme })
    }

    fn uri(&self, path_and_query: &str) -> Result<Uri, TransportError> {
        match &self.scheme {
            Scheme::Unix(base) => Ok(hyperlocal::Uri::new(base, path_and_query).into()),
            Scheme::Http(base) => {
                let url = Url::parse(base)
                    .and_then(|base| base.join(path_and_query))
                    .map_err(|e| TransportError::ConstructUrl(e.into()))?;
                url.as_str()
                    .parse()
                    .map_err(|e: http::uri::InvalidUri| TransportError::ConstructUrl(e.into()))
            }
        }
    }

    async fn execute(&self, req: Request<Body>) -> Result<Bytes, TransportError> {
        let res = self
            .client
            .request(req)
            .await
            .map_err(TransportError::ExecuteRequest)?;

        let status = res.status();
        let body = hyper::body::to_bytes(res.into_body())
            .await
            .map_err(TransportError::ReadResponse)?;

        if !status.is_success() {
            return Err(TransportError::UnsuccessfulResponse {
                status,
                body: String::from_utf8_lossy(&body).trim().to_owned(),
            });
        }

        Ok(body)
    }

    pub async fn get(&self, path: &str) -> Result<Bytes, TransportError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(self.uri(path)?)
            .body(Body::empty())
            .map_err(TransportError::ConstructRequest)?;

        self.execute(req).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let body = self.get(path).await?;
        serde_json::from_slice(&body).map_err(TransportError::ParseResponseBody)
    }

    /// POST with a JSON payload, expecting a JSON answer.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body).map_err(TransportError::SerializeRequestBody)?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(self.uri(path)?)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .map_err(TransportError::ConstructRequest)?;

        let body = self.execute(req).await?;
        serde_json::from_slice(&body).map_err(TransportError::ParseResponseBody)
    }

    /// Body-less POST for lifecycle endpoints whose answer carries no data.
    pub async fn post_unit(&self, path: &str) -> Result<(), TransportError> {
        let req = Request::builder()
            .method(Method::POST)
            .uri(self.uri(path)?)
            .body(Body::empty())
            .map_err(TransportError::ConstructRequest)?;

        self.execute(req).await?;
        Ok(())
    }

    /// Body-less POST returning the raw buffered response, optionally with
    /// the registry auth header attached. Used for pull, whose body is a
    /// progress stream rather than one JSON document.
    pub async fn post_buffered(
        &self,
        path: &str,
        registry_auth: Option<&str>,
    ) -> Result<Bytes, TransportError> {
        let mut builder = Request::builder().method(Method::POST).uri(self.uri(path)?);

        if let Some(auth) = registry_auth {
            builder = builder.header(REGISTRY_AUTH_HEADER, auth);
        }

        let req = builder
            .body(Body::empty())
            .map_err(TransportError::ConstructRequest)?;

        self.execute(req).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), TransportError> {
        let req = Request::builder()
            .method(Method::DELETE)
            .uri(self.uri(path)?)
            .body(Body::empty())
            .map_err(TransportError::ConstructRequest)?;

        self.execute(req).await?;
        Ok(())
    }

    /// The configured address, for diagnostics only. Never serialized
    /// into entity views.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_unix_channel_from_scheme_and_bare_path() {
        for host in ["unix:///var/run/docker.sock", "/var/run/docker.sock"] {
            let channel = Channel::open(host).unwrap();
            assert!(
                matches!(channel.scheme(), Scheme::Unix(path) if path == "/var/run/docker.sock")
            );
        }
    }

    #[test]
    fn tcp_is_an_alias_for_http() {
        let channel = Channel::open("tcp://127.0.0.1:2375").unwrap();
        assert!(matches!(
            channel.scheme(),
            Scheme::Http(base) if base == "http://127.0.0.1:2375"
        ));
    }

    #[test]
    fn unsupported_addresses_are_rejected() {
        for host in ["ftp://example.com", "not a host"] {
            assert!(matches!(
                Channel::open(host),
                Err(TransportError::ParseHost(_))
            ));
        }
    }

    #[test]
    fn http_uris_join_without_duplicate_separators() {
        let channel = Channel::open("http://127.0.0.1:2375").unwrap();
        let uri = channel.uri("/images/json?all=true").unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:2375/images/json?all=true");
    }

    #[test]
    fn unix_uris_carry_the_request_path() {
        let channel = Channel::open("unix:///tmp/docker.sock").unwrap();
        let uri = channel.uri("/containers/web1/start?t=0").unwrap();
        assert_eq!(uri.path_and_query().unwrap().as_str(), "/containers/web1/start?t=0");
    }
}
