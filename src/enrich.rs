//! User search enrichment.
//!
//! Each candidate runs its own small task graph: account details and the
//! repository list are fetched together, then every repository's language map
//! is fetched in one concurrent batch, then the aggregates are computed.
//! Candidates run concurrently up to the configured limit. A candidate whose
//! pipeline fails anywhere is reported with zeroed aggregates instead.

use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::github::{self, GithubClient, SearchUser};
use crate::stats::{EnrichedUser, RepoTotals, tally_languages, top_languages};

#[derive(Clone)]
pub struct Enricher {
    client: GithubClient,
    max_concurrent_users: usize,
}

impl Enricher {
    pub fn new(client: GithubClient, max_concurrent_users: usize) -> Self {
        Self {
            client,
            max_concurrent_users: max_concurrent_users.max(1),
        }
    }

    /// Enrich every candidate; output order matches `users`.
    pub async fn enrich_all(&self, users: &[SearchUser]) -> Vec<EnrichedUser> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_users));

        join_all(users.iter().map(|user| {
            let permits = Arc::clone(&permits);
            async move {
                // never closed
                let _permit = permits.acquire().await.ok();
                self.enrich_or_degrade(user).await
            }
        }))
        .await
    }

    async fn enrich_or_degrade(&self, user: &SearchUser) -> EnrichedUser {
        match self.enrich(user).await {
            Ok(record) => record,
            Err(e) => {
                let login = user.login.as_deref().unwrap_or("<unknown>");
                tracing::warn!(%login, error = %e, "Error fetching details for user");
                EnrichedUser::degraded(user)
            }
        }
    }

    /// Full pipeline for one candidate; the first failing call aborts it.
    pub async fn enrich(&self, user: &SearchUser) -> github::Result<EnrichedUser> {
        let (details, repos) = tokio::try_join!(
            self.client.user_details(user),
            self.client.user_repos(user),
        )?;

        let totals = RepoTotals::from_repos(&repos);

        let language_maps =
            try_join_all(repos.iter().map(|repo| self.client.repo_languages(repo))).await?;
        let top = top_languages(tally_languages(&language_maps));

        Ok(EnrichedUser::new(user, details.public_repos, &totals, top))
    }
}
