use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{BundleInfo, RankedResult, TitleRecord};

/// Key for enrichment lookups: a display title plus an optional stable id.
///
/// Row indices never appear here; they are only valid for the bundle that
/// produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleLookup {
    pub title: String,
    pub external_id: Option<String>,
}

impl From<&RankedResult> for TitleLookup {
    fn from(result: &RankedResult) -> Self {
        Self {
            title: result.title.clone(),
            external_id: result.external_id.clone(),
        }
    }
}

impl From<&TitleRecord> for TitleLookup {
    fn from(record: &TitleRecord) -> Self {
        Self {
            title: record.title.clone(),
            external_id: record.external_id.clone(),
        }
    }
}

/// Descriptive metadata attached to a recommended title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleMetadata {
    pub poster_url: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    pub fetched_at: DateTime<Utc>,
}

/// Title as exposed to clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TitleSummary {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl From<&TitleRecord> for TitleSummary {
    fn from(record: &TitleRecord) -> Self {
        Self {
            title: record.title.clone(),
            external_id: record.external_id.clone(),
        }
    }
}

/// One recommended title in an API response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedTitle {
    pub title: String,
    pub score: f32,
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TitleMetadata>,
}

impl From<RankedResult> for RecommendedTitle {
    fn from(result: RankedResult) -> Self {
        Self {
            title: result.title,
            score: result.score,
            rank: result.rank,
            external_id: result.external_id,
            metadata: None,
        }
    }
}

/// Response body of the recommendations endpoint
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationResponse {
    Ok {
        query: TitleSummary,
        results: Vec<RecommendedTitle>,
    },
    NotFound {
        query: String,
    },
}

/// Page of corpus titles
#[derive(Debug, Serialize)]
pub struct TitlePage {
    pub total: usize,
    pub offset: usize,
    pub titles: Vec<TitleSummary>,
}

/// Health endpoint body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub artifacts: BundleInfo,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Movie entry from TMDB `/search/movie` and `/movie/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
}

/// TMDB search response envelope
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    pub results: Vec<TmdbMovie>,
}

impl TmdbMovie {
    /// Converts to our metadata, prefixing the poster path with the image base URL
    pub fn into_metadata(self, image_base_url: &str) -> TitleMetadata {
        TitleMetadata {
            poster_url: self
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}{}", image_base_url.trim_end_matches('/'), p)),
            overview: self.overview.filter(|o| !o.is_empty()),
            release_date: self.release_date.filter(|d| !d.is_empty()),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_response_serialization() {
        let response = RecommendationResponse::NotFound {
            query: "Nope".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["query"], "Nope");
    }

    #[test]
    fn test_ok_response_omits_empty_fields() {
        let response = RecommendationResponse::Ok {
            query: TitleSummary {
                title: "Heat".to_string(),
                external_id: None,
            },
            results: vec![RecommendedTitle {
                title: "Ronin".to_string(),
                score: 0.5,
                rank: 1,
                external_id: None,
                metadata: None,
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["query"]["title"], "Heat");
        assert_eq!(json["results"][0]["title"], "Ronin");
        assert_eq!(json["results"][0]["score"], 0.5);
        assert!(json["results"][0].get("metadata").is_none());
        assert!(json["results"][0].get("row_index").is_none());
    }

    #[test]
    fn test_tmdb_movie_deserialization() {
        let json = r#"{
            "id": 949,
            "title": "Heat",
            "overview": "Obsessive master thief...",
            "poster_path": "/heat.jpg",
            "release_date": "1995-12-15",
            "vote_average": 7.9,
            "vote_count": 7000
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 949);
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.vote_count, Some(7000));
    }

    #[test]
    fn test_tmdb_movie_into_metadata() {
        let movie = TmdbMovie {
            id: 949,
            title: "Heat".to_string(),
            overview: Some(String::new()),
            poster_path: Some("/heat.jpg".to_string()),
            release_date: Some("1995-12-15".to_string()),
            vote_average: Some(7.9),
            vote_count: None,
        };

        let metadata = movie.into_metadata("https://image.tmdb.org/t/p/w500/");
        assert_eq!(
            metadata.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/heat.jpg")
        );
        assert_eq!(metadata.overview, None);
        assert_eq!(metadata.release_date.as_deref(), Some("1995-12-15"));
    }
}
