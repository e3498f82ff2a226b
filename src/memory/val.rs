use std::fmt;

use ark_ff::{Field, Zero};
#[cfg(test)]
use proptest::prelude::*;

use super::address::MemoryAddress;
use crate::{
    constant::F,
    errors::{math::MathError, memory::MemoryError},
};

/// A value held by a memory cell: either a field element or an address.
///
/// Unwritten cells are represented by the surrounding `Option`, so a known
/// zero stays distinguishable from an absent value.
#[derive(Eq, Ord, Hash, PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum MemoryValue {
    Address(MemoryAddress),
    Int(F),
}

impl MemoryValue {
    #[must_use]
    pub const fn is_address(&self) -> bool {
        matches!(self, Self::Address(_))
    }

    /// Addition lifted over tags: `Int + Int -> Int`, `Address ± Int -> Address`.
    pub fn add(&self, other: &Self) -> Result<Self, MathError> {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => Ok(Self::Int(*lhs + *rhs)),
            (Self::Address(lhs), Self::Int(rhs)) => Ok(Self::Address(lhs.add_felt(rhs)?)),
            (Self::Int(lhs), Self::Address(rhs)) => Ok(Self::Address(rhs.add_felt(lhs)?)),
            (Self::Address(lhs), Self::Address(rhs)) => {
                Err(MathError::AddMemoryAddresses(*lhs, *rhs))
            }
        }
    }

    /// Subtraction lifted over tags; `Address - Address` yields the distance
    /// between two offsets of the same segment.
    pub fn sub(&self, other: &Self) -> Result<Self, MathError> {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => Ok(Self::Int(*lhs - *rhs)),
            (Self::Address(lhs), Self::Int(rhs)) => Ok(Self::Address(lhs.sub_felt(rhs)?)),
            (Self::Address(lhs), Self::Address(rhs)) => Ok(Self::Int((*lhs - *rhs)?)),
            (Self::Int(lhs), Self::Address(rhs)) => {
                Err(MathError::SubAddressFromFelt(*lhs, *rhs))
            }
        }
    }

    /// Multiplication is only defined between field elements.
    pub fn mul(&self, other: &Self) -> Result<Self, MathError> {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => Ok(Self::Int(*lhs * *rhs)),
            (Self::Address(addr), _) | (_, Self::Address(addr)) => {
                Err(MathError::MulWithMemoryAddress(*addr))
            }
        }
    }

    /// Division is only defined between field elements, with a nonzero divisor.
    pub fn div(&self, other: &Self) -> Result<Self, MathError> {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => {
                let inverse = rhs.inverse().ok_or(MathError::DivisionByZero)?;
                Ok(Self::Int(*lhs * inverse))
            }
            (Self::Address(addr), _) | (_, Self::Address(addr)) => {
                Err(MathError::DivWithMemoryAddress(*addr))
            }
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Int(felt) if felt.is_zero())
    }
}

impl From<F> for MemoryValue {
    fn from(felt: F) -> Self {
        Self::Int(felt)
    }
}

impl From<MemoryAddress> for MemoryValue {
    fn from(address: MemoryAddress) -> Self {
        Self::Address(address)
    }
}

impl TryFrom<MemoryValue> for F {
    type Error = MemoryError;

    fn try_from(value: MemoryValue) -> Result<Self, Self::Error> {
        match value {
            MemoryValue::Int(felt) => Ok(felt),
            MemoryValue::Address(_) => Err(MemoryError::ExpectedInteger(value)),
        }
    }
}

impl TryFrom<MemoryValue> for MemoryAddress {
    type Error = MemoryError;

    fn try_from(value: MemoryValue) -> Result<Self, Self::Error> {
        match value {
            MemoryValue::Address(address) => Ok(address),
            MemoryValue::Int(_) => Err(MemoryError::ExpectedMemoryAddress(value)),
        }
    }
}

impl fmt::Display for MemoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(felt) => write!(f, "{felt}"),
            Self::Address(address) => write!(f, "{address}"),
        }
    }
}

#[cfg(test)]
impl Arbitrary for MemoryValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            // Strategy for Int: any u64
            (0..u64::MAX).prop_map(|n| Self::Int(F::from(n))),
            // Strategy for Address: use the Arbitrary impl
            any::<MemoryAddress>().prop_map(Self::Address),
        ]
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_add() {
        let int = |n: u64| MemoryValue::Int(F::from(n));
        let addr = MemoryValue::Address(MemoryAddress::new(1, 10));

        assert_eq!(int(2).add(&int(3)), Ok(int(5)));
        assert_eq!(
            addr.add(&int(3)),
            Ok(MemoryValue::Address(MemoryAddress::new(1, 13)))
        );
        assert_eq!(
            int(3).add(&addr),
            Ok(MemoryValue::Address(MemoryAddress::new(1, 13)))
        );
        assert!(matches!(
            addr.add(&addr),
            Err(MathError::AddMemoryAddresses(..))
        ));
    }

    #[test]
    fn test_sub() {
        let int = |n: u64| MemoryValue::Int(F::from(n));
        let addr = |offset| MemoryValue::Address(MemoryAddress::new(1, offset));

        assert_eq!(int(5).sub(&int(3)), Ok(int(2)));
        assert_eq!(addr(10).sub(&int(4)), Ok(addr(6)));
        assert_eq!(addr(10).sub(&addr(4)), Ok(int(6)));
        assert!(matches!(
            int(5).sub(&addr(1)),
            Err(MathError::SubAddressFromFelt(..))
        ));
    }

    #[test]
    fn test_mul_and_div() {
        let int = |n: u64| MemoryValue::Int(F::from(n));
        let addr = MemoryValue::Address(MemoryAddress::new(0, 3));

        assert_eq!(int(6).mul(&int(7)), Ok(int(42)));
        assert_eq!(int(42).div(&int(7)), Ok(int(6)));
        assert_eq!(int(1).div(&int(0)), Err(MathError::DivisionByZero));
        assert!(matches!(
            int(2).mul(&addr),
            Err(MathError::MulWithMemoryAddress(_))
        ));
        assert!(matches!(
            addr.div(&int(2)),
            Err(MathError::DivWithMemoryAddress(_))
        ));
    }

    #[test]
    fn test_division_is_exact_in_the_field() {
        // 10 / 4 has no integer solution but a unique field solution.
        let quotient = MemoryValue::Int(F::from(10u64))
            .div(&MemoryValue::Int(F::from(4u64)))
            .unwrap();
        assert_eq!(
            quotient.mul(&MemoryValue::Int(F::from(4u64))),
            Ok(MemoryValue::Int(F::from(10u64)))
        );
    }

    #[test]
    fn test_conversions() {
        let int = MemoryValue::Int(F::from(9u64));
        let addr = MemoryValue::Address(MemoryAddress::new(2, 4));

        assert_eq!(F::try_from(int), Ok(F::from(9u64)));
        assert_eq!(
            MemoryAddress::try_from(addr),
            Ok(MemoryAddress::new(2, 4))
        );
        assert_eq!(F::try_from(addr), Err(MemoryError::ExpectedInteger(addr)));
        assert_eq!(
            MemoryAddress::try_from(int),
            Err(MemoryError::ExpectedMemoryAddress(int))
        );
    }

    #[test]
    fn test_is_zero() {
        assert!(MemoryValue::Int(F::zero()).is_zero());
        assert!(!MemoryValue::Int(F::from(1u64)).is_zero());
        assert!(!MemoryValue::Address(MemoryAddress::new(0, 0)).is_zero());
    }

    proptest! {
        #[test]
        fn proptest_conversions_respect_tags(value in any::<MemoryValue>()) {
            if value.is_address() {
                prop_assert!(MemoryAddress::try_from(value).is_ok());
                prop_assert!(F::try_from(value).is_err());
            } else {
                prop_assert!(F::try_from(value).is_ok());
                prop_assert!(MemoryAddress::try_from(value).is_err());
            }
        }

        #[test]
        fn proptest_add_then_sub_is_identity(
            value in any::<MemoryValue>(),
            delta in 0u64..(1 << 31),
        ) {
            let delta = MemoryValue::Int(F::from(delta));
            let sum = value.add(&delta).unwrap();
            prop_assert_eq!(sum.sub(&delta).unwrap(), value);
        }
    }
}
