//! Offset/limit pagination over list endpoints.
//!
//! The backing API exposes no total count or has-more flag, so the only
//! end-of-data signal is a page shorter than the requested limit. An
//! exactly-full final page therefore costs one extra confirming request.

use crate::client::NimbusClient;
use crate::error::Result;
use serde::de::DeserializeOwned;

impl NimbusClient {
    /// Fetch every entity behind a list endpoint.
    ///
    /// Issues `GET path` with `limit`/`offset` merged into `params` until a
    /// short page arrives, concatenating pages in server response order. Any
    /// page failure aborts the whole fetch; nothing partial is returned.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let limit = self.page_size();
        let mut entities = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("limit", limit.to_string()));
            query.push(("offset", offset.to_string()));

            let page: Vec<T> = self.get_with(path, &query).await?;
            let received = page.len();
            tracing::debug!("fetched page of {} at offset {}", received, offset);
            entities.extend(page);

            // A short page is the end-of-data signal; an exactly-full page
            // forces one more request to confirm.
            if received < limit {
                break;
            }
            offset += received;
        }

        Ok(entities)
    }
}
