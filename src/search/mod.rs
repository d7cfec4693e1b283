//! Search Module
//!
//! Vacancy search over the job board:
//! - [`search_all`] walks every page of a query and merges the results
//! - [`filter_unresponded`] drops vacancies the user already applied to
//!
//! Page-count rounding is configurable, see [`PageRounding`].

pub mod aggregator;
pub mod filter;

pub(crate) use aggregator::deadline_reached;
pub use aggregator::{search_all, AggregatedSearch, PageRounding, ParseRoundingError, SearchOptions};
pub use filter::{filter_unresponded, responded_ids};
