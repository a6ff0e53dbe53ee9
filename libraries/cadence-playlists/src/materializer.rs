//! Smart playlist materializer
//!
//! Recomputes a smart playlist's members from its rule and persists the new
//! order through `PlaylistStore::replace_items`, which is all-or-nothing.

use crate::rules::{CriteriaRule, CustomRule};
use cadence_core::{
    CadenceError, Playlist, PlaylistId, PlaylistKind, PlaylistStore, PlaylistTotals, Result,
    SmartRule, SmartType, Track, TrackId, TrackQuery, TrackStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default size of the Recent and MostPlayed playlists
pub const DEFAULT_SMART_LIMIT: u32 = 100;

/// Materializer tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializerConfig {
    /// Member count for Recent and MostPlayed (default: 100)
    pub limit: u32,

    /// Extra attempts after a failed replace (default: 2)
    pub refresh_retries: u32,

    /// Pause before each retry
    pub retry_delay: Duration,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SMART_LIMIT,
            refresh_retries: 2,
            retry_delay: Duration::from_millis(50),
        }
    }
}

/// What a refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshOutcome {
    /// Membership rewritten
    Refreshed(PlaylistTotals),
    /// Not a smart playlist
    Skipped,
}

/// Result of one playlist in a batch refresh
#[derive(Debug)]
pub struct RefreshReport {
    pub playlist_id: PlaylistId,
    pub name: String,
    pub result: Result<RefreshOutcome>,
}

impl RefreshReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Smart playlist materializer
pub struct Materializer {
    tracks: Arc<dyn TrackStore>,
    playlists: Arc<dyn PlaylistStore>,
    custom: Arc<dyn CustomRule>,
    config: MaterializerConfig,
}

impl Materializer {
    pub fn new(
        tracks: Arc<dyn TrackStore>,
        playlists: Arc<dyn PlaylistStore>,
        config: MaterializerConfig,
    ) -> Self {
        Self {
            tracks,
            playlists,
            custom: Arc::new(CriteriaRule),
            config,
        }
    }

    /// Replace the evaluator used for `Custom` playlists
    #[must_use]
    pub fn with_custom_rule(mut self, rule: Arc<dyn CustomRule>) -> Self {
        self.custom = rule;
        self
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    /// Ordered members a rule selects right now
    pub async fn compute(&self, rule: &SmartRule) -> Result<Vec<Track>> {
        let limit = self.config.limit;
        match rule.smart_type {
            SmartType::Favorites => self.tracks.query(&TrackQuery::favorites()).await,
            SmartType::Recent => self.tracks.query(&TrackQuery::recent(limit)).await,
            SmartType::MostPlayed => self.tracks.query(&TrackQuery::most_played(limit)).await,
            SmartType::Custom => {
                let all = self.tracks.all_tracks().await?;
                self.custom.evaluate(&rule.criteria, all)
            }
        }
    }

    /// Recompute one playlist
    ///
    /// Manual playlists are skipped, not rejected. A failed replace is retried
    /// with freshly computed members; prior membership stays intact until one
    /// attempt commits.
    pub async fn refresh(&self, id: PlaylistId) -> Result<RefreshOutcome> {
        let playlist = self.playlists.get_playlist(id).await?;
        let Some(rule) = playlist.rule.clone() else {
            debug!(playlist_id = id.get(), "Not a smart playlist, skipping refresh");
            return Ok(RefreshOutcome::Skipped);
        };

        let mut attempt = 0;
        let totals = loop {
            match self.replace_once(id, &rule).await {
                Ok(totals) => break totals,
                Err(e) if is_retryable(&e) && attempt < self.config.refresh_retries => {
                    attempt += 1;
                    warn!(
                        playlist_id = id.get(),
                        attempt,
                        error = %e,
                        "Smart playlist refresh failed, retrying"
                    );
                    if !self.config.retry_delay.is_zero() {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        };

        // Membership is committed; an unstamped playlist is just due again
        if let Err(e) = self.playlists.mark_refreshed(id, Utc::now()).await {
            warn!(playlist_id = id.get(), error = %e, "Failed to record refresh time");
        }

        info!(
            playlist_id = id.get(),
            name = %playlist.name,
            smart_type = rule.smart_type.as_str(),
            track_count = totals.track_count,
            "Refreshed smart playlist"
        );
        Ok(RefreshOutcome::Refreshed(totals))
    }

    async fn replace_once(&self, id: PlaylistId, rule: &SmartRule) -> Result<PlaylistTotals> {
        let members = self.compute(rule).await?;
        let ids: Vec<TrackId> = members.iter().map(|t| t.id).collect();
        self.playlists.replace_items(id, &ids).await
    }

    /// Refresh every smart playlist, continuing past failures
    pub async fn refresh_all(&self) -> Result<Vec<RefreshReport>> {
        let playlists = self.playlists.list_playlists(PlaylistKind::Smart).await?;
        Ok(self.refresh_each(playlists).await)
    }

    /// Refresh auto-refresh playlists whose interval has elapsed at `now`
    pub async fn refresh_due(&self, now: DateTime<Utc>) -> Result<Vec<RefreshReport>> {
        let due: Vec<Playlist> = self
            .playlists
            .list_playlists(PlaylistKind::Smart)
            .await?
            .into_iter()
            .filter(|p| p.auto_refresh && p.is_refresh_due(now))
            .collect();

        if !due.is_empty() {
            debug!(count = due.len(), "Smart playlists due for refresh");
        }
        Ok(self.refresh_each(due).await)
    }

    async fn refresh_each(&self, playlists: Vec<Playlist>) -> Vec<RefreshReport> {
        let mut reports = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let result = self.refresh(playlist.id).await;
            if let Err(e) = &result {
                warn!(playlist_id = playlist.id.get(), name = %playlist.name, error = %e, "Smart playlist refresh failed");
            }
            reports.push(RefreshReport {
                playlist_id: playlist.id,
                name: playlist.name,
                result,
            });
        }
        reports
    }
}

fn is_retryable(err: &CadenceError) -> bool {
    matches!(err, CadenceError::StoreFailure(_))
}
