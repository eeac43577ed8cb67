// Math utilities and helper functions

/// Default tolerance for fuzzy float comparisons
pub const EPSILON: f32 = 0.0001;

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Check if two f32 values are approximately equal
pub fn approx_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

/// `a > b` with a tolerance band below `b`
pub fn fuzzy_greater_than(a: f32, b: f32, epsilon: f32) -> bool {
    a > b - epsilon
}

/// `a < b` with a tolerance band above `b`
pub fn fuzzy_less_than(a: f32, b: f32, epsilon: f32) -> bool {
    a < b + epsilon
}

/// Wrap `value` into the half-open range `[min, max)`
pub fn wrap(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return min;
    }
    min + (((value - min) % range) + range) % range
}

/// +1.0 for positive values, -1.0 otherwise (zero counts as negative)
pub fn sign_positive(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(1.0, 1.00001, 0.0001));
        assert!(!approx_equal(1.0, 1.1, 0.01));
    }

    #[test]
    fn test_fuzzy_comparisons() {
        assert!(fuzzy_greater_than(0.995, 1.0, 0.01));
        assert!(!fuzzy_greater_than(0.98, 1.0, 0.01));
        assert!(fuzzy_less_than(1.005, 1.0, 0.01));
        assert!(!fuzzy_less_than(1.02, 1.0, 0.01));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(5.0, 0.0, 10.0), 5.0);
        assert_eq!(wrap(12.0, 0.0, 10.0), 2.0);
        assert_eq!(wrap(-3.0, 0.0, 10.0), 7.0);
        assert_eq!(wrap(10.0, 0.0, 10.0), 0.0);
        assert_eq!(wrap(3.0, 5.0, 5.0), 5.0);
    }

    #[test]
    fn test_sign_positive() {
        assert_eq!(sign_positive(3.0), 1.0);
        assert_eq!(sign_positive(0.0), -1.0);
        assert_eq!(sign_positive(-2.0), -1.0);
    }
}
