//! Main client implementation

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, Body, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tracing::{debug, instrument};

use crate::config::{parse_url, Config, ROOT_FOLDER};
use crate::error::{Error, Result};
use crate::multipart::{streaming_form, ByteSource};
use crate::resolver::IdentifierCells;
use crate::types::*;

/// Stream of downloaded file bytes. The caller drains and drops it.
pub struct DownloadStream(pub BoxStream<'static, Result<Bytes>>);

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream").finish_non_exhaustive()
    }
}

impl futures::Stream for DownloadStream {
    type Item = Result<Bytes>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.get_mut().0.poll_next_unpin(cx)
    }
}

/// The public contract for interacting with the GoFile API.
///
/// Implemented by [`GofileClient`]; substitute a stub in tests.
#[async_trait]
pub trait GofileApi: Send + Sync {
    /// Create a folder under the given parent, which may be [`ROOT_FOLDER`].
    async fn create_folder(
        &self,
        parent_folder_id: &str,
        folder_name: &str,
    ) -> Result<CreateFolderResponse>;

    /// Upload a byte source into the given folder under the given name.
    async fn upload_file(
        &self,
        folder_id: &str,
        file_name: &str,
        source: ByteSource,
    ) -> Result<UploadFileResponse>;

    /// Retrieve metadata for the given file.
    async fn get_file_info(&self, file_id: &str) -> Result<FileInfoResponse>;

    /// Download a file from the given server.
    async fn download_file(
        &self,
        server: &str,
        file_id: &str,
        file_name: &str,
    ) -> Result<DownloadStream>;
}

/// A reusable, concurrency-safe client for the GoFile API.
///
/// One instance caches the account and root-folder identifiers after their
/// first resolution and may be shared freely across tasks.
#[derive(Debug)]
pub struct GofileClient {
    pub(crate) config: Config,
    pub(crate) http: Client,
    pub(crate) ids: IdentifierCells,
}

impl GofileClient {
    /// Create a new client with the given configuration.
    ///
    /// Fails if the API token is empty or the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(Error::Validation("apiKey"));
        }

        let mut headers = header::HeaderMap::new();
        let user_agent = header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            Error::RequestConstruction {
                operation: "client",
                reason: e.to_string(),
            }
        })?;
        headers.insert(header::USER_AGENT, user_agent);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::RequestConstruction {
                operation: "client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            config,
            http,
            ids: IdentifierCells::default(),
        })
    }

    /// Create a client for the given API token with default endpoints.
    pub fn with_token(api_token: impl Into<String>) -> Result<Self> {
        Self::new(Config::new(api_token))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Operations ====================

    /// Create a new folder under the specified parent folder.
    ///
    /// `parent_folder_id` may be a concrete folder identifier or
    /// [`ROOT_FOLDER`], in which case the account's root folder id is
    /// resolved (and cached) automatically.
    #[instrument(skip(self))]
    pub async fn create_folder(
        &self,
        parent_folder_id: &str,
        folder_name: &str,
    ) -> Result<CreateFolderResponse> {
        const OPERATION: &str = "createFolder";

        if parent_folder_id.is_empty() {
            return Err(Error::Validation("parentFolderId"));
        }
        if folder_name.is_empty() {
            return Err(Error::Validation("folderName"));
        }

        let resolved;
        let parent_folder_id = if parent_folder_id == ROOT_FOLDER {
            resolved = self.root_folder_id().await?;
            resolved.as_str()
        } else {
            parent_folder_id
        };

        let url = self.config.contents_item_url(OPERATION, "createFolder")?;
        let body = CreateFolderRequest {
            parent_folder_id,
            folder_name,
        };

        let response = self.execute(OPERATION, self.http.post(url).json(&body)).await?;
        self.decode_json(OPERATION, response).await
    }

    /// Upload a file to the specified folder.
    ///
    /// The byte source is consumed and dropped by the upload; its content is
    /// streamed into the request body without being buffered in full.
    #[instrument(skip(self, source))]
    pub async fn upload_file<R>(
        &self,
        folder_id: &str,
        file_name: &str,
        source: R,
    ) -> Result<UploadFileResponse>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        const OPERATION: &str = "uploadFile";

        if folder_id.is_empty() {
            return Err(Error::Validation("folderId"));
        }
        if file_name.is_empty() {
            return Err(Error::Validation("fileName"));
        }

        let url = parse_url(OPERATION, &self.config.upload_url)?;
        let form = streaming_form(folder_id, file_name, source);
        debug!(folder_id, file_name, "created streaming upload request");

        let request = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, form.content_type)
            .body(Body::wrap_stream(form.stream));

        let response = self.execute(OPERATION, request).await?;
        self.decode_json(OPERATION, response).await
    }

    /// Retrieve metadata information for the specified file.
    #[instrument(skip(self))]
    pub async fn get_file_info(&self, file_id: &str) -> Result<FileInfoResponse> {
        const OPERATION: &str = "getFileInfo";

        if file_id.is_empty() {
            return Err(Error::Validation("fileId"));
        }

        let url = self.config.contents_item_url(OPERATION, file_id)?;
        let request = self
            .http
            .get(url)
            .header("X-Website-Token", &self.config.website_token);

        let response = self.execute(OPERATION, request).await?;
        self.decode_json(OPERATION, response).await
    }

    /// Download a file from the specified server.
    ///
    /// Returns the response byte stream; the caller drains it.
    #[instrument(skip(self))]
    pub async fn download_file(
        &self,
        server: &str,
        file_id: &str,
        file_name: &str,
    ) -> Result<DownloadStream> {
        const OPERATION: &str = "getFile";

        if server.is_empty() {
            return Err(Error::Validation("server"));
        }
        if file_id.is_empty() {
            return Err(Error::Validation("fileId"));
        }
        if file_name.is_empty() {
            return Err(Error::Validation("fileName"));
        }

        let url = self.config.download_url(OPERATION, server, file_id, file_name)?;
        let response = self.execute(OPERATION, self.http.get(url)).await?;

        Ok(DownloadStream(
            response
                .bytes_stream()
                .map_err(|source| Error::Transport {
                    operation: OPERATION,
                    source,
                })
                .boxed(),
        ))
    }

    // ==================== Transport ====================

    /// Send a prepared request with the bearer token attached and classify
    /// the response, in order: transport failure, HTML error page, bad
    /// status. On success the caller owns the response body.
    pub(crate) async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response> {
        let request = request.bearer_auth(&self.config.api_token);

        debug!(operation, "sending request");
        let response = request
            .send()
            .await
            .map_err(|source| Error::Transport { operation, source })?;

        let html = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));
        if html {
            debug!(operation, "received HTML response body");
            return Err(Error::UnexpectedHtml { operation });
        }

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            debug!(operation, %status, "received bad status");
            return Err(Error::Status {
                operation,
                status,
                body,
            });
        }

        Ok(response)
    }

    /// Read and decode a success body as JSON, refusing bodies that open
    /// with an HTML document marker regardless of their content type.
    pub(crate) async fn decode_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        response: Response,
    ) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|source| Error::Transport { operation, source })?;

        // The marker comparison is case-insensitive; `<!doctype html>` is
        // just as valid as the capitalized form.
        let head: String = body
            .trim_start()
            .chars()
            .take("<!doctype html".len())
            .collect::<String>()
            .to_ascii_lowercase();
        if head.starts_with("<!doctype html") || head.starts_with("<html") {
            debug!(operation, "received HTML response body");
            return Err(Error::UnexpectedHtml { operation });
        }

        serde_json::from_str(&body).map_err(|source| Error::Decode { operation, source })
    }
}

#[async_trait]
impl GofileApi for GofileClient {
    async fn create_folder(
        &self,
        parent_folder_id: &str,
        folder_name: &str,
    ) -> Result<CreateFolderResponse> {
        GofileClient::create_folder(self, parent_folder_id, folder_name).await
    }

    async fn upload_file(
        &self,
        folder_id: &str,
        file_name: &str,
        source: ByteSource,
    ) -> Result<UploadFileResponse> {
        GofileClient::upload_file(self, folder_id, file_name, source).await
    }

    async fn get_file_info(&self, file_id: &str) -> Result<FileInfoResponse> {
        GofileClient::get_file_info(self, file_id).await
    }

    async fn download_file(
        &self,
        server: &str,
        file_id: &str,
        file_name: &str,
    ) -> Result<DownloadStream> {
        GofileClient::download_file(self, server, file_id, file_name).await
    }
}
