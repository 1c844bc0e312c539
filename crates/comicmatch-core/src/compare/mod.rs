//! Per-field comparators. Each returns a score in `[0, 1]`.

pub mod issue;
pub mod title;
pub mod year;

pub use issue::{compare_issues, compare_normalized_issues};
pub use title::{compare_titles, title_similarity};
pub use year::{compare_year_values, compare_years};
