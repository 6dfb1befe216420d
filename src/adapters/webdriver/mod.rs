pub mod client;
pub mod host;
pub mod page_parser;
pub mod scripts;
pub mod selectors;
pub mod surface;
