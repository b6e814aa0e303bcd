//! Client configuration

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Symbolic parent-folder token resolved to the account's root folder.
pub const ROOT_FOLDER: &str = "root";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// API key (bearer token); never logged
    pub api_token: String,
    /// Base URL for content operations (folder creation, file info)
    pub contents_url: String,
    /// Base URL for account lookups
    pub accounts_url: String,
    /// File upload endpoint
    pub upload_url: String,
    /// Per-server download base; `{server}` is substituted at request time
    pub download_base_template: String,
    /// Token sent as `X-Website-Token` on file-info requests
    pub website_token: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            contents_url: "https://api.gofile.io/contents/".to_string(),
            accounts_url: "https://api.gofile.io/accounts/".to_string(),
            upload_url: "https://upload.gofile.io/uploadfile".to_string(),
            download_base_template: "https://{server}.gofile.io".to_string(),
            website_token: "4fd6sg89d7s6".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("gofile-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given API token
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Point every endpoint at a single base URL. Intended for tests
    /// against a stub server; download URLs become `{base}/{server}/...`.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        self.contents_url = format!("{base}/contents/");
        self.accounts_url = format!("{base}/accounts/");
        self.upload_url = format!("{base}/uploadfile");
        self.download_base_template = format!("{base}/{{server}}");
        self
    }

    /// Build the download URL for a file hosted on the given server,
    /// path-escaping the file id and name.
    pub(crate) fn download_url(
        &self,
        operation: &'static str,
        server: &str,
        file_id: &str,
        file_name: &str,
    ) -> Result<Url> {
        let base = self.download_base_template.replace("{server}", server);
        let mut url = parse_url(operation, &base)?;
        url.path_segments_mut()
            .map_err(|_| Error::RequestConstruction {
                operation,
                reason: format!("download base '{base}' cannot carry a path"),
            })?
            .extend(["download", "web", file_id, file_name]);
        Ok(url)
    }

    /// Build a URL under the contents base with the given escaped segment.
    pub(crate) fn contents_item_url(
        &self,
        operation: &'static str,
        item: &str,
    ) -> Result<Url> {
        let mut url = parse_url(operation, &self.contents_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::RequestConstruction {
                operation,
                reason: format!("contents base '{}' cannot carry a path", self.contents_url),
            })?
            .pop_if_empty()
            .push(item);
        Ok(url)
    }

    /// Build a URL under the accounts base with the given escaped segment.
    pub(crate) fn accounts_item_url(
        &self,
        operation: &'static str,
        item: &str,
    ) -> Result<Url> {
        let mut url = parse_url(operation, &self.accounts_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::RequestConstruction {
                operation,
                reason: format!("accounts base '{}' cannot carry a path", self.accounts_url),
            })?
            .pop_if_empty()
            .push(item);
        Ok(url)
    }
}

pub(crate) fn parse_url(operation: &'static str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::RequestConstruction {
        operation,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let config = Config::new("token");
        assert_eq!(config.api_token, "token");
        assert_eq!(config.upload_url, "https://upload.gofile.io/uploadfile");
        assert_eq!(config.contents_url, "https://api.gofile.io/contents/");
    }

    #[test]
    fn download_url_substitutes_server_and_escapes() {
        let config = Config::new("token");
        let url = config
            .download_url("getFile", "store1", "abc123", "my file.txt")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://store1.gofile.io/download/web/abc123/my%20file.txt"
        );
    }

    #[test]
    fn contents_item_url_escapes_segment() {
        let config = Config::new("token");
        let url = config.contents_item_url("getFileInfo", "id/with/slash").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.gofile.io/contents/id%2Fwith%2Fslash"
        );
    }

    #[test]
    fn base_url_rebases_all_endpoints() {
        let config = Config::new("token").with_base_url("http://127.0.0.1:9999/");
        assert_eq!(config.accounts_url, "http://127.0.0.1:9999/accounts/");
        let url = config.download_url("getFile", "s1", "f1", "a.txt").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/s1/download/web/f1/a.txt");
    }
}
