use futures::stream::{self, Stream, TryStreamExt};
use std::collections::HashSet;
use url::Url;

use super::types::RepoRef;
use crate::http::{FetchError, Transport};

/// Walks a linked sequence of listing pages.
///
/// Every page is fetched; the walk ends only when a page carries no `next`
/// link. Any failure ends the walk with an error, as a partial listing
/// would silently drop repositories.
pub struct Paginator<'a, T> {
    transport: &'a T,
    start: Url,
}

impl<'a, T: Transport> Paginator<'a, T> {
    pub fn new(transport: &'a T, start: Url) -> Self {
        Self { transport, start }
    }

    /// Listing of the authenticated user's starred repositories.
    pub fn starred(transport: &'a T, api_base: &str, per_page: u32) -> Result<Self, FetchError> {
        let start = Url::parse(&format!(
            "{}/user/starred?per_page={per_page}",
            api_base.trim_end_matches('/')
        ))?;
        Ok(Self::new(transport, start))
    }

    pub fn start(&self) -> &Url {
        &self.start
    }

    /// Lazily fetches one page per item, in link order.
    ///
    /// A `next` link that points at an already fetched page yields
    /// [`FetchError::PaginationCycle`].
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<RepoRef>, FetchError>> + 'a {
        let transport = self.transport;

        stream::try_unfold(
            (Some(self.start.clone()), HashSet::new()),
            move |(next, mut visited)| async move {
                let Some(url) = next else {
                    return Ok(None);
                };
                if !visited.insert(url.as_str().to_string()) {
                    return Err(FetchError::PaginationCycle(url.into()));
                }

                let response = transport.get(url.as_str()).await?.error_for_status()?;
                let repos: Vec<RepoRef> = response.json()?;
                let next = response.next_page()?;

                tracing::debug!(
                    page = visited.len(),
                    items = repos.len(),
                    has_next = next.is_some(),
                    "Fetched listing page"
                );
                Ok(Some((repos, (next, visited))))
            },
        )
    }

    /// Drains [`pages`](Self::pages), dropping repeated `full_name`s.
    pub async fn list_all(&self) -> Result<Vec<RepoRef>, FetchError> {
        let mut pages = std::pin::pin!(self.pages());
        let mut seen = HashSet::new();
        let mut repos = Vec::new();
        let mut page_count = 0usize;

        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            for repo in page {
                if seen.insert(repo.full_name.clone()) {
                    repos.push(repo);
                } else {
                    tracing::debug!(repo = %repo.full_name, "Duplicate in listing, skipping");
                }
            }
        }

        tracing::info!(
            pages = page_count,
            repositories = repos.len(),
            "Listed starred repositories"
        );
        Ok(repos)
    }
}
