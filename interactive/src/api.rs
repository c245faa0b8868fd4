use async_trait::async_trait;
use gloo_net::http::Request as HttpRequest;
use townsquare_client::api::{Body, FilePart, Method, Request, Response, Transport};
use townsquare_client::config::DEFAULT_API_BASE;
use townsquare_client::TransportError;
use web_sys::js_sys::{Array, Uint8Array};
use web_sys::{window, Blob, BlobPropertyBag, FormData};

/// API origin from `<meta name="townsquare-api">`, falling back to the dev server.
pub fn api_base() -> String {
    let configured = window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector("meta[name='townsquare-api']").ok().flatten())
        .and_then(|el| el.get_attribute("content"))
        .filter(|url| !url.is_empty());
    configured
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve a server-relative media path against the API origin.
pub fn media_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{base}{url}")
    }
}

/// [`Transport`] over the browser's `fetch`.
pub struct FetchTransport {
    base: String,
}

impl FetchTransport {
    pub fn new(base: String) -> Self {
        Self { base }
    }
}

fn js_err(err: impl std::fmt::Debug) -> TransportError {
    TransportError(format!("{err:?}"))
}

fn file_form(file: &FilePart) -> Result<FormData, TransportError> {
    let parts = Array::of1(&Uint8Array::from(file.bytes.as_slice()));
    let options = BlobPropertyBag::new();
    if let Some(mime) = &file.mime {
        options.set_type(mime);
    }
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_err)?;
    let form = FormData::new().map_err(js_err)?;
    form.append_with_blob_and_filename("file", &blob, &file.filename)
        .map_err(js_err)?;
    Ok(form)
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base, request.path);
        let mut builder = match request.method {
            Method::Get => HttpRequest::get(&url),
            Method::Post => HttpRequest::post(&url),
            Method::Put => HttpRequest::put(&url),
            Method::Delete => HttpRequest::delete(&url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }

        let req = match &request.body {
            Body::Empty => builder.build(),
            Body::Json(value) => builder.json(value),
            // The browser sets the multipart boundary itself.
            Body::File(file) => builder.body(file_form(file)?),
        }
        .map_err(|e| TransportError(e.to_string()))?;

        let resp = req.send().await.map_err(|e| TransportError(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .binary()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Response { status, body })
    }
}
