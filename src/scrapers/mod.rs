//! Scrapers for the Fresh Produce site.
//!
//! Acquisition happens in two phases:
//!
//! 1. **Catalog**: walk the paginated search API to list every matching
//!    article ([`catalog`])
//! 2. **Articles**: download each listed page and extract its text
//!    ([`articles`])
//!
//! | Phase | Module | Method | Failure policy |
//! |-------|--------|--------|----------------|
//! | Catalog | [`catalog`] | JSON search API | Any error aborts the run |
//! | Articles | [`articles`] | HTML scraping | Failed pages keep empty content |

pub mod articles;
pub mod catalog;
