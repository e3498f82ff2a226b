use ark_ff::PrimeField;

use crate::{constant::F, errors::math::MathError};

/// Adds a signed 16-bit offset to a register value, failing on wrap-around.
pub(crate) fn safe_offset(value: usize, offset: i16) -> Option<usize> {
    value.checked_add_signed(offset as isize)
}

/// Smallest power of two greater than or equal to `value`.
pub(crate) const fn next_power_of_two(value: usize) -> usize {
    value.next_power_of_two()
}

/// Converts a field element to a `u64`, failing when it does not fit.
pub(crate) fn felt_to_u64(felt: &F) -> Result<u64, MathError> {
    let bigint = felt.into_bigint();
    if bigint.0[1..].iter().any(|&limb| limb != 0) {
        return Err(MathError::FeltDoesNotFitInU64(*felt));
    }
    Ok(bigint.0[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_offset() {
        assert_eq!(safe_offset(10, 5), Some(15));
        assert_eq!(safe_offset(10, -5), Some(5));
        assert_eq!(safe_offset(10, -10), Some(0));
        assert_eq!(safe_offset(10, -11), None);
        assert_eq!(safe_offset(usize::MAX, 1), None);
    }

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(6), 8);
        assert_eq!(next_power_of_two(8), 8);
        assert_eq!(next_power_of_two(9), 16);
    }

    #[test]
    fn test_felt_to_u64() {
        assert_eq!(felt_to_u64(&F::from(42u64)), Ok(42));
        assert_eq!(felt_to_u64(&F::from(u64::MAX)), Ok(u64::MAX));

        // One past u64::MAX needs a second limb.
        let too_big = F::from(u64::MAX) + F::from(1u64);
        assert_eq!(
            felt_to_u64(&too_big),
            Err(MathError::FeltDoesNotFitInU64(too_big))
        );

        // Negative values are huge canonical representatives.
        let minus_one = -F::from(1u64);
        assert!(felt_to_u64(&minus_one).is_err());
    }
}
