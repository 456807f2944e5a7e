/// Cosine similarity in `[-1, 1]`.
///
/// Returns 0 when either vector is empty, the lengths differ, or either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if !is_comparable(a, b) {
		return 0.0;
	}

	let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
	let norm_a = norm(a);
	let norm_b = norm(b);

	if !has_signal(norm_a) || !has_signal(norm_b) {
		return 0.0;
	}

	(dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}

/// Whether a similarity between the two vectors carries any signal.
pub fn is_usable_pair(a: &[f32], b: &[f32]) -> bool {
	is_comparable(a, b) && has_signal(norm(a)) && has_signal(norm(b))
}

fn is_comparable(a: &[f32], b: &[f32]) -> bool {
	!a.is_empty() && a.len() == b.len()
}

fn has_signal(norm: f64) -> bool {
	norm.is_finite() && norm > 0.0
}

fn norm(v: &[f32]) -> f64 {
	v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
	use crate::similarity::{cosine_similarity, is_usable_pair};

	#[test]
	fn identical_unit_vectors_score_one() {
		assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn orthogonal_vectors_score_zero() {
		assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
	}

	#[test]
	fn opposite_vectors_score_negative_one() {
		assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
	}

	#[test]
	fn degenerate_inputs_score_zero() {
		assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
		assert_eq!(cosine_similarity(&[], &[]), 0.0);
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
		assert!(!is_usable_pair(&[0.0, 0.0], &[1.0, 2.0]));
		assert!(!is_usable_pair(&[1.0], &[1.0, 2.0]));
		assert!(is_usable_pair(&[0.3, 0.1], &[1.0, 2.0]));
	}

	#[test]
	fn infinite_norms_are_neither_usable_nor_scored() {
		let huge = [f32::MAX, f32::INFINITY];

		assert_eq!(cosine_similarity(&huge, &[1.0, 2.0]), 0.0);
		assert!(!is_usable_pair(&huge, &[1.0, 2.0]));
		assert!(!is_usable_pair(&[1.0, 2.0], &huge));
	}

	#[test]
	fn similarity_is_symmetric_and_bounded() {
		let samples: [&[f32]; 4] =
			[&[0.3, -0.7, 2.0], &[1.0, 1.0, 1.0], &[-5.0, 0.25, 0.0], &[1e-3, 4.0, -2.5]];

		for a in samples {
			for b in samples {
				let ab = cosine_similarity(a, b);
				let ba = cosine_similarity(b, a);

				assert!((ab - ba).abs() < 1e-6);
				assert!((-1.0..=1.0).contains(&ab));
			}
		}
	}
}
