pub mod automation_host;
pub mod calendar_surface;
pub mod clock;
pub mod listing_feed;
pub mod price_sink;
