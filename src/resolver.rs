//! Memoized account and root-folder identifier resolution
//!
//! Each identifier is fetched at most once per client instance. The outcome,
//! success or failure, is pinned into a single-assignment cell and every
//! later caller gets the same result back; a failed resolution is never
//! retried. Callers that need a fresh attempt construct a new client.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::client::GofileClient;
use crate::error::{Error, Result};
use crate::types::{AccountIdResponse, AccountInfoResponse};

type Cached = std::result::Result<String, Arc<Error>>;

/// The two single-assignment identifier cells shared by all operations on a
/// client. Written once by whichever caller gets there first; safe for
/// unsynchronized reads afterwards.
#[derive(Debug, Default)]
pub(crate) struct IdentifierCells {
    account_id: OnceCell<Cached>,
    root_folder_id: OnceCell<Cached>,
}

impl GofileClient {
    /// Resolve and cache the account id associated with the API token.
    ///
    /// Concurrent callers share a single network round trip; all of them
    /// observe the same outcome.
    pub(crate) async fn account_id(&self) -> Result<String> {
        let cached = self
            .ids
            .account_id
            .get_or_init(|| async { self.fetch_account_id().await.map_err(Arc::new) })
            .await;
        replay(cached)
    }

    /// Resolve and cache the root folder id of the account.
    ///
    /// Always sequenced after a successful [`Self::account_id`] resolution,
    /// which is itself fetched at most once.
    pub(crate) async fn root_folder_id(&self) -> Result<String> {
        let cached = self
            .ids
            .root_folder_id
            .get_or_init(|| async { self.fetch_root_folder_id().await.map_err(Arc::new) })
            .await;
        replay(cached)
    }

    async fn fetch_account_id(&self) -> Result<String> {
        const OPERATION: &str = "getid";

        let url = self.config.accounts_item_url(OPERATION, "getid")?;
        let response = self.execute(OPERATION, self.http.get(url)).await?;
        let body: AccountIdResponse = self.decode_json(OPERATION, response).await?;

        if body.data.id.is_empty() {
            return Err(Error::EmptyIdentifier {
                operation: OPERATION,
            });
        }
        debug!("resolved account id");
        Ok(body.data.id)
    }

    async fn fetch_root_folder_id(&self) -> Result<String> {
        const OPERATION: &str = "getAccountInfo";

        let account_id = self.account_id().await?;

        let url = self.config.accounts_item_url(OPERATION, &account_id)?;
        let response = self.execute(OPERATION, self.http.get(url)).await?;
        let body: AccountInfoResponse = self.decode_json(OPERATION, response).await?;

        if body.data.root_folder.is_empty() {
            return Err(Error::EmptyIdentifier {
                operation: OPERATION,
            });
        }
        debug!("resolved root folder id");
        Ok(body.data.root_folder)
    }
}

fn replay(cached: &Cached) -> Result<String> {
    match cached {
        Ok(id) => Ok(id.clone()),
        Err(e) => Err(Error::Cached(Arc::clone(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_clones_value_and_shares_error() {
        let ok: Cached = Ok("acct-1".to_string());
        assert_eq!(replay(&ok).unwrap(), "acct-1");

        let err: Cached = Err(Arc::new(Error::EmptyIdentifier { operation: "getid" }));
        let first = replay(&err).unwrap_err();
        let second = replay(&err).unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.is_cached());
    }
}
