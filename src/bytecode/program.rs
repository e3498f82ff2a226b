use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Label, constant::F};

/// A compiled program artifact.
///
/// Compilation is external; the runner only consumes the bytecode plus the
/// symbols it needs: `labels` must contain `__start__` and `__end__` for
/// proof-mode runs, `entrypoints` maps function names to bytecode offsets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(with = "felt_hex")]
    pub bytecode: Vec<F>,
    #[serde(default)]
    pub labels: HashMap<Label, usize>,
    #[serde(default)]
    pub entrypoints: HashMap<Label, usize>,
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("Reading program: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing program: {0}")]
    Json(#[from] serde_json::Error),
}

impl Program {
    pub fn from_file(path: &Path) -> Result<Self, ProgramError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Bytecode words are serialized as hex strings; bare decimal is accepted too.
mod felt_hex {
    use ark_ff::PrimeField;
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeSeq};

    use crate::constant::F;

    pub fn serialize<S>(felts: &[F], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(felts.len()))?;
        for felt in felts {
            seq.serialize_element(&format!("{:#x}", BigUint::from(felt.into_bigint())))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<F>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter().map(|s| parse_felt(s).map_err(D::Error::custom)).collect()
    }

    fn parse_felt(s: &str) -> Result<F, String> {
        let (digits, radix) = match s.strip_prefix("0x") {
            Some(hex) => (hex, 16),
            None => (s, 10),
        };
        let value = BigUint::parse_bytes(digits.as_bytes(), radix)
            .ok_or_else(|| format!("invalid field element: {s}"))?;
        Ok(F::from_le_bytes_mod_order(&value.to_bytes_le()))
    }
}
