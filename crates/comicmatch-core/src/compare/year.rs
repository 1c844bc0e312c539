use crate::parser::parse_year;

/// Score returned when either year is unknown.
pub const NEUTRAL_YEAR_SCORE: f64 = 0.5;

const CLASSIC_DECADES: [i32; 4] = [1960, 1970, 1980, 1990];

/// Compare two year fields.
///
/// 1.0 for the same year, 0.8 within two years, 0.7 for a classic-decade
/// original against a 2000+ reprint, 0.5 when either side has no year,
/// otherwise 0.0.
pub fn compare_years(year_a: &str, year_b: &str) -> f64 {
    compare_year_values(parse_year(year_a), parse_year(year_b)).unwrap_or(NEUTRAL_YEAR_SCORE)
}

/// Score two already-resolved years. `None` when either side has no year.
pub fn compare_year_values(year_a: Option<i32>, year_b: Option<i32>) -> Option<f64> {
    Some(score_years(year_a?, year_b?))
}

fn score_years(a: i32, b: i32) -> f64 {
    if a == b {
        return 1.0;
    }
    if (i64::from(a) - i64::from(b)).abs() <= 2 {
        return 0.8;
    }
    if is_reprint_of(a, b) || is_reprint_of(b, a) {
        return 0.7;
    }
    0.0
}

fn is_reprint_of(modern: i32, original: i32) -> bool {
    modern >= 2000
        && CLASSIC_DECADES
            .iter()
            .any(|decade| (*decade..decade + 10).contains(&original))
}
