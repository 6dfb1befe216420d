pub mod calendar;
pub mod listing;
pub mod month;
pub mod queue;
pub mod quote;
pub mod search_params;
