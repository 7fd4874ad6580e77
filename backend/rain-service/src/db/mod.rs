pub mod article_repo;
pub mod chunk_repo;
pub mod feed_log_repo;
pub mod feed_state_repo;
pub mod queue_repo;
pub mod rating_repo;
pub mod settings_repo;
