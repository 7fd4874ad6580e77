pub mod accuracy;
pub mod articles;
pub mod chunks;
pub mod feed;
pub mod settings;

use crate::clients::context::ContextGenerator;
use crate::clients::fetcher::DocumentFetcher;
use crate::clients::imagery::ImageSynthesizer;
use crate::clients::scorer::HttpRelevanceScorer;
use crate::config::Config;
use crate::services::Replenisher;
use sqlx::PgPool;

/// Shared application state handed to every handler.
///
/// Everything is constructed once at startup and dependency-injected; no
/// module-level lazily-initialized store clients.
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub replenisher: Replenisher,
    pub scorer: HttpRelevanceScorer,
    pub context: ContextGenerator,
    pub fetcher: DocumentFetcher,
    pub imagery: ImageSynthesizer,
}
