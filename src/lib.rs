//! # GoFile Client SDK
//!
//! A client for the GoFile file-hosting API: folder creation, streaming file
//! upload, file-metadata lookup, and file download over HTTPS/JSON.
//!
//! - **Streaming uploads**: multipart bodies are encoded concurrently with
//!   transmission, so memory use stays constant regardless of file size
//! - **Cached resolution**: the account and root-folder identifiers are
//!   resolved at most once per client, shared safely across concurrent tasks
//! - **Uniform errors**: transport failures, HTML error pages, and HTTP error
//!   statuses are classified before any JSON decoding happens
//!
//! ## Example
//!
//! ```rust,ignore
//! use gofile_client::{GofileClient, ROOT_FOLDER};
//!
//! #[tokio::main]
//! async fn main() -> gofile_client::Result<()> {
//!     let client = GofileClient::with_token("your-api-token")?;
//!
//!     // Create a folder under the account's root folder
//!     let folder = client.create_folder(ROOT_FOLDER, "backups").await?;
//!
//!     // Stream a file into it
//!     let file = tokio::fs::File::open("report.pdf").await.unwrap();
//!     let uploaded = client
//!         .upload_file(&folder.data.id, "report.pdf", file)
//!         .await?;
//!     println!("uploaded: {}", uploaded.data);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod multipart;
mod resolver;
mod types;

pub use client::{DownloadStream, GofileApi, GofileClient};
pub use config::{Config, ROOT_FOLDER};
pub use error::{Error, Result};
pub use multipart::ByteSource;
pub use types::{
    CreateFolderResponse, CreatedFolder, FileInfo, FileInfoResponse, UploadFileResponse,
    UploadedFile,
};
