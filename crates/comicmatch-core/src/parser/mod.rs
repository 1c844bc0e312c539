//! Field normalizers: titles, issue numbers, years, series keys.

pub mod issue;
pub mod series;
pub mod title;
pub mod year;

pub use issue::normalize_issue;
pub use series::series_key;
pub use title::{clean_title, parse_title};
pub use year::{extract_year, parse_year};
