use chrono::NaiveDate;
use tracing::debug;

use crate::executor::{DeviceRequest, RequestExecutor};
use crate::models::{AggregationOfFile, CatalogEntry};
use crate::session::DeviceSession;
use crate::utils::zidoo_parse;
use crate::ZidooError;

/// Catalog entry classification as reported by the poster database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Movie,
    Collection,
    TvShow,
    TvSeason,
    TvEpisode,
    Other,
}

impl MediaKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => MediaKind::Video,
            1 => MediaKind::Movie,
            2 => MediaKind::Collection,
            3 => MediaKind::TvShow,
            4 => MediaKind::TvSeason,
            5 => MediaKind::TvEpisode,
            _ => MediaKind::Other,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            MediaKind::Video => 0,
            MediaKind::Movie => 1,
            MediaKind::Collection => 2,
            MediaKind::TvShow => 3,
            MediaKind::TvSeason => 4,
            MediaKind::TvEpisode => 5,
            MediaKind::Other => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Movie => "movie",
            MediaKind::Collection => "collection",
            MediaKind::TvShow => "tvshow",
            MediaKind::TvSeason => "tvseason",
            MediaKind::TvEpisode => "tvepisode",
            MediaKind::Other => "other",
        }
    }

    pub fn is_episodic(&self) -> bool {
        matches!(
            self,
            MediaKind::TvShow | MediaKind::TvSeason | MediaKind::TvEpisode
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalIds {
    pub imdb: Option<String>,
    pub tmdb: Option<String>,
}

impl ExternalIds {
    pub fn is_empty(&self) -> bool {
        self.imdb.is_none() && self.tmdb.is_none()
    }
}

/// Catalog metadata for one playable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaIdentity {
    /// Database id used for artwork; 0 when the file is not in the catalog.
    pub catalog_id: i64,
    pub kind: MediaKind,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub external_ids: Option<ExternalIds>,
    pub episode_number: Option<i64>,
    pub episode_name: Option<String>,
    pub season_number: Option<i64>,
    pub season_name: Option<String>,
    pub series_name: Option<String>,
}

impl MediaIdentity {
    /// An uncatalogued file.
    pub fn unknown() -> Self {
        Self {
            catalog_id: 0,
            kind: MediaKind::Video,
            title: None,
            tagline: None,
            release_date: None,
            external_ids: None,
            episode_number: None,
            episode_name: None,
            season_number: None,
            season_name: None,
            series_name: None,
        }
    }

    pub fn from_aggregation(file: &AggregationOfFile) -> Self {
        let mut identity = Self::unknown();
        if let Some(code) = file.kind {
            identity.kind = MediaKind::from_code(code);
        }

        let mut catalog_id = 0;

        if let Some(movie) = &file.movie {
            catalog_id = movie.id.unwrap_or(0);
            identity.title = movie.name.clone();
            if let Some(agg) = &movie.aggregation {
                identity.tagline = agg.tag_line.clone();
                identity.release_date = agg
                    .release_date
                    .as_deref()
                    .and_then(zidoo_parse::parse_release_date);
                let ids = ExternalIds {
                    imdb: agg.imdb_id.clone(),
                    tmdb: agg.tmdb_id.clone(),
                };
                identity.external_ids = (!ids.is_empty()).then_some(ids);
            }
        }

        if let Some(episode) = &file.episode {
            catalog_id = episode.id.unwrap_or(0);
            if let Some(agg) = &episode.aggregation {
                identity.episode_number = agg.episode_number;
                identity.episode_name = agg.name.clone();
            }
        }

        if let Some(CatalogEntry {
            aggregation: Some(agg),
            ..
        }) = &file.season
        {
            identity.season_number = agg.season_number;
            identity.season_name = agg.name.clone();
            identity.series_name = agg.tv_name.clone();
        }

        // Plain files have no db id of their own
        if catalog_id == 0 {
            catalog_id = file
                .video
                .as_ref()
                .and_then(|video| video.parent_id)
                .unwrap_or(0);
        }
        identity.catalog_id = catalog_id;
        identity
    }
}

/// Memoizes the identity of the last resolved path.
#[derive(Debug, Default)]
pub struct IdentityCache {
    path: Option<String>,
    identity: Option<MediaIdentity>,
    lookups: u64,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<&MediaIdentity> {
        self.identity.as_ref()
    }

    /// Number of catalog lookups issued so far.
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    /// Returns the identity for `path`, asking the device only when the path
    /// differs from the last one resolved. A failed lookup leaves the cache
    /// untouched so the next poll tries again.
    pub async fn resolve(
        &mut self,
        executor: &RequestExecutor,
        session: &mut DeviceSession,
        path: &str,
    ) -> Result<MediaIdentity, ZidooError> {
        if let (Some(cached), Some(identity)) = (self.path.as_deref(), &self.identity) {
            if cached == path {
                return Ok(identity.clone());
            }
        }

        self.lookups += 1;
        let request =
            DeviceRequest::new("ZidooPoster/v2/getAggregationOfFile").param("path", path);
        let file: AggregationOfFile = executor.execute_as(session, &request).await?;
        let identity = MediaIdentity::from_aggregation(&file);
        debug!(
            "new media detected ({}): {:?}",
            identity.catalog_id, identity
        );
        self.path = Some(path.to_string());
        self.identity = Some(identity.clone());
        Ok(identity)
    }
}
