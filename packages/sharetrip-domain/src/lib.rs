pub mod booking;
pub mod capacity;
pub mod pricing;
pub mod profile;
pub mod similarity;
pub mod time_serde;
pub mod tour;

/// Case- and padding-insensitive comparison used for free-form labels such as cities,
/// languages and travel styles.
pub fn labels_match(left: &str, right: &str) -> bool {
	left.trim().eq_ignore_ascii_case(right.trim())
}

pub fn contains_label(labels: &[String], wanted: &str) -> bool {
	labels.iter().any(|label| labels_match(label, wanted))
}
