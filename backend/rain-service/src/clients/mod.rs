pub mod chat;
pub mod context;
pub mod fetcher;
pub mod imagery;
pub mod scorer;
