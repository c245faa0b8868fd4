use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::api::{Body, Method, Request, Response, Transport};
use crate::config::ClientConfig;
use crate::error::TransportError;

/// [`Transport`] over `reqwest`, for native builds and tests.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent("townsquare-client")
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self::with_client(client, &config.api_base))
    }

    pub fn with_client(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::File(file) => {
                let mut part = Part::bytes(file.bytes).file_name(file.filename);
                if let Some(mime) = &file.mime {
                    part = part
                        .mime_str(mime)
                        .map_err(|e| TransportError(e.to_string()))?;
                }
                builder.multipart(Form::new().part("file", part))
            }
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?
            .to_vec();
        debug!(%url, status, bytes = body.len(), "http exchange");
        Ok(Response { status, body })
    }
}
