use std::{fmt, str::FromStr};

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::errors::ParseProvingSystemError;

/// Proving systems a task can declare, keyed by the on-chain `uint16` code.
///
/// The set of codes is fixed by the service manager contract. Whether the operator can
/// actually check a given system is decided by the verifier registry, not by this enum.
#[repr(u16)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum ProvingSystemId {
    PlonkBls12_381 = 0,
    PlonkBn254 = 1,
    Groth16Bn254 = 2,
    Sp1 = 3,
    Halo2Kzg = 4,
    Halo2Ipa = 5,
}

impl ProvingSystemId {
    pub const ALL: [ProvingSystemId; 6] = [
        ProvingSystemId::PlonkBls12_381,
        ProvingSystemId::PlonkBn254,
        ProvingSystemId::Groth16Bn254,
        ProvingSystemId::Sp1,
        ProvingSystemId::Halo2Kzg,
        ProvingSystemId::Halo2Ipa,
    ];

    pub fn code(self) -> u16 {
        self.into()
    }

    /// Maps a raw on-chain code, `None` for codes the contract does not define.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::try_from(code).ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            ProvingSystemId::PlonkBls12_381 => "PlonkBls12_381",
            ProvingSystemId::PlonkBn254 => "PlonkBn254",
            ProvingSystemId::Groth16Bn254 => "Groth16Bn254",
            ProvingSystemId::Sp1 => "SP1",
            ProvingSystemId::Halo2Kzg => "Halo2KZG",
            ProvingSystemId::Halo2Ipa => "Halo2IPA",
        }
    }
}

impl fmt::Display for ProvingSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProvingSystemId {
    type Err = ParseProvingSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| ParseProvingSystemError {
                given: s.to_owned(),
                available: Self::ALL.map(|id| id.name()).join(", "),
            })
    }
}
