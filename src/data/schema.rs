//! Fixed layout of the students performance dataset.
//!
//! Column names match the source CSV exactly, spacing included. The option
//! sets are the values the dataset can contain; the inference boundary
//! validates against them before any encoding happens.

/// Prediction target.
pub const TARGET_COLUMN: &str = "math score";

/// Numeric feature columns, in pipeline order.
pub const NUMERIC_COLUMNS: [&str; 2] = ["reading score", "writing score"];

/// Categorical feature columns, in pipeline order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race/ethnicity",
    "parental level of education",
    "lunch",
    "test preparation course",
];

pub const GENDER_OPTIONS: [&str; 2] = ["male", "female"];

pub const ETHNICITY_OPTIONS: [&str; 5] =
    ["group A", "group B", "group C", "group D", "group E"];

pub const PARENTAL_EDUCATION_OPTIONS: [&str; 6] = [
    "associate's degree",
    "bachelor's degree",
    "high school",
    "master's degree",
    "some college",
    "some high school",
];

pub const LUNCH_OPTIONS: [&str; 2] = ["standard", "free/reduced"];

pub const TEST_PREPARATION_OPTIONS: [&str; 2] = ["none", "completed"];

/// Inclusive bounds for every score column.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// The allowed values for a categorical column, if it is one.
pub fn options_for(column: &str) -> Option<&'static [&'static str]> {
    match column {
        "gender" => Some(&GENDER_OPTIONS),
        "race/ethnicity" => Some(&ETHNICITY_OPTIONS),
        "parental level of education" => Some(&PARENTAL_EDUCATION_OPTIONS),
        "lunch" => Some(&LUNCH_OPTIONS),
        "test preparation course" => Some(&TEST_PREPARATION_OPTIONS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_categorical_column_has_options() {
        for column in CATEGORICAL_COLUMNS {
            let options = options_for(column).unwrap();
            assert!(!options.is_empty());
        }
        assert!(options_for(TARGET_COLUMN).is_none());
        assert!(options_for("reading score").is_none());
    }
}
