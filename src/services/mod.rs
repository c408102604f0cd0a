pub mod enrichment;
pub mod providers;
pub mod recommendations;

pub use enrichment::enrich_results;
pub use providers::{MetadataProvider, TmdbProvider};
pub use recommendations::{Recommendation, RecommendationService, DEFAULT_TOP_N};
