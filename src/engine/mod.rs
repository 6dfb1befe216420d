pub mod best_price;
pub mod candidates;
pub mod dispatcher;
pub mod feed_watch;
pub mod navigation;
pub mod orchestrator;
pub mod quote_extractor;
pub mod selection;
