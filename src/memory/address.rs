use std::{
    fmt,
    ops::{Add, Sub},
};

#[cfg(test)]
use proptest::prelude::*;

use crate::{constant::F, errors::math::MathError, utils::felt_to_u64};

#[derive(Eq, Ord, Hash, PartialEq, PartialOrd, Clone, Copy, Debug, Default)]
pub struct MemoryAddress {
    pub segment_index: usize,
    pub offset: usize,
}

impl MemoryAddress {
    #[must_use]
    pub const fn new(segment_index: usize, offset: usize) -> Self {
        Self {
            segment_index,
            offset,
        }
    }

    /// Moves the address forward by `rhs` cells within its segment.
    pub fn add_usize(&self, rhs: usize) -> Result<Self, MathError> {
        let offset = self
            .offset
            .checked_add(rhs)
            .ok_or(MathError::MemoryAddressAddUsizeOffsetExceeded(*self, rhs))?;
        Ok(Self::new(self.segment_index, offset))
    }

    /// Moves the address by a field-element delta within its segment.
    ///
    /// The canonical representative decides the direction: values that fit in
    /// `u64` move forward, values whose negation fits in `u64` move backward
    /// (relative jumps of `-k` are encoded as `p - k`). Anything else does not
    /// denote a reachable offset.
    pub fn add_felt(&self, rhs: &F) -> Result<Self, MathError> {
        let overflow = || MathError::MemoryAddressAddFeltOffsetExceeded(*self, *rhs);

        if let Ok(delta) = felt_to_u64(rhs) {
            let delta = usize::try_from(delta).map_err(|_| overflow())?;
            let offset = self.offset.checked_add(delta).ok_or_else(overflow)?;
            return Ok(Self::new(self.segment_index, offset));
        }
        if let Ok(delta) = felt_to_u64(&-*rhs) {
            let delta = usize::try_from(delta).map_err(|_| overflow())?;
            let offset = self.offset.checked_sub(delta).ok_or_else(overflow)?;
            return Ok(Self::new(self.segment_index, offset));
        }
        Err(overflow())
    }

    pub fn sub_felt(&self, rhs: &F) -> Result<Self, MathError> {
        self.add_felt(&-*rhs)
    }
}

impl Add<usize> for MemoryAddress {
    type Output = Result<Self, MathError>;

    fn add(self, rhs: usize) -> Self::Output {
        self.add_usize(rhs)
    }
}

impl Sub for MemoryAddress {
    type Output = Result<F, MathError>;

    /// Distance between two addresses of the same segment, as a field element.
    fn sub(self, rhs: Self) -> Self::Output {
        if self.segment_index != rhs.segment_index {
            return Err(MathError::SubMemoryAddressesDifferentSegments(self, rhs));
        }
        Ok(F::from(self.offset as u64) - F::from(rhs.offset as u64))
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment_index, self.offset)
    }
}

#[cfg(test)]
impl Arbitrary for MemoryAddress {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            // segment_index fits in 29 bits
            0..((1u64 << 29) - 1) as usize,
            // offset fits in 32 bits
            0..((1u64 << 32) - 1) as usize,
        )
            .prop_map(|(segment_index, offset)| Self {
                segment_index,
                offset,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use ark_ff::Field;

    use super::*;

    #[test]
    fn test_add_usize() {
        let addr = MemoryAddress::new(2, 10);
        assert_eq!(addr.add_usize(5), Ok(MemoryAddress::new(2, 15)));
        assert_eq!((addr + 5).unwrap(), MemoryAddress::new(2, 15));

        let err = MemoryAddress::new(0, usize::MAX).add_usize(1).unwrap_err();
        assert_eq!(
            err,
            MathError::MemoryAddressAddUsizeOffsetExceeded(MemoryAddress::new(0, usize::MAX), 1)
        );
    }

    #[test]
    fn test_add_felt_forward() {
        let addr = MemoryAddress::new(0, 7);
        assert_eq!(
            addr.add_felt(&F::from(3u64)),
            Ok(MemoryAddress::new(0, 10))
        );
    }

    #[test]
    fn test_add_felt_backward() {
        // p - 4 acts as a backward jump of 4 cells.
        let addr = MemoryAddress::new(0, 7);
        assert_eq!(
            addr.add_felt(&-F::from(4u64)),
            Ok(MemoryAddress::new(0, 3))
        );

        // Jumping before the start of the segment is an overflow.
        assert!(addr.add_felt(&-F::from(8u64)).is_err());
    }

    #[test]
    fn test_add_felt_too_large() {
        // 2^100 fits in neither direction.
        let delta = F::from(2u64).pow([100u64]);
        assert!(MemoryAddress::new(0, 0).add_felt(&delta).is_err());
    }

    #[test]
    fn test_sub_addresses() {
        let lhs = MemoryAddress::new(1, 10);
        let rhs = MemoryAddress::new(1, 4);
        assert_eq!(lhs - rhs, Ok(F::from(6u64)));
        // Negative distances stay consistent with felt offsets.
        assert_eq!(rhs - lhs, Ok(-F::from(6u64)));

        let err = (MemoryAddress::new(0, 10) - MemoryAddress::new(1, 4)).unwrap_err();
        assert!(matches!(
            err,
            MathError::SubMemoryAddressesDifferentSegments(..)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryAddress::new(1, 42).to_string(), "1:42");
    }
}
