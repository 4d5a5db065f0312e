#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{_mm256_add_pd, _mm256_loadu_pd, _mm256_setzero_pd, _mm256_storeu_pd};

const LANES: usize = 4; // __m256d holds 4 f64s

/// Lane totals folded left to right, then the remainder in order. Both sum
/// paths end here so they round identically.
fn reduce_lanes(lanes: [f64; LANES], remainder: &[f64]) -> f64 {
    let mut total = ((lanes[0] + lanes[1]) + lanes[2]) + lanes[3];
    for &v in remainder {
        total += v;
    }
    total
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2_inner(values: &[f64]) -> f64 {
    let mut sum = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        sum = _mm256_add_pd(sum, v);
    }

    let mut lanes = [0f64; LANES];
    unsafe { _mm256_storeu_pd(lanes.as_mut_ptr(), sum) };
    reduce_lanes(lanes, remainder)
}

/// Four independent accumulators in the same order as the AVX2 lanes
fn sum_f64_scalar(values: &[f64]) -> f64 {
    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let mut lanes = [0f64; LANES];
    for chunk in chunks {
        for (lane, &v) in lanes.iter_mut().zip(chunk) {
            *lane += v;
        }
    }
    reduce_lanes(lanes, remainder)
}

/// Sum of f64 values using AVX2 or scalar fallback.
///
/// Both paths add in the same order, so the result is bit-identical on every
/// host.
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2_inner(values) };
        }
    }
    sum_f64_scalar(values)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(sum_f64(values) / values.len() as f64)
}

/// Rounds half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_matches_scalar_with_remainder() {
        let values: Vec<f64> = (1..=11).map(|v| v as f64).collect();
        assert_eq!(sum_f64(&values), 66.0);
        assert_eq!(sum_f64(&[]), 0.0);
        assert_eq!(sum_f64(&[2.5]), 2.5);
    }

    #[test]
    fn test_simd_and_scalar_sums_are_bit_identical() {
        let values: Vec<f64> = (0..1_003)
            .map(|i| (i as f64) * 0.1 + 1.0 / ((i % 7 + 1) as f64) + 1e-9 * (i % 13) as f64)
            .collect();
        for len in [0, 1, 3, 4, 5, 17, 1_003] {
            let slice = &values[..len];
            assert_eq!(sum_f64(slice).to_bits(), sum_f64_scalar(slice).to_bits(), "len {}", len);
        }
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean_f64(&[5.0, 15.0]), Some(10.0));
        assert_eq!(mean_f64(&[]), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(100.0), 100.0);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(12.5), 12.5);
        assert_eq!(round2(0.0), 0.0);
    }
}
