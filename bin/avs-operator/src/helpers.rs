use std::{fs, path::Path};

use avs_operator::{BlsKeyPair, OperatorIdentity};
use avs_verifier::VerifierRegistry;
use zeroize::Zeroizing;

use crate::{
    config::Config,
    errors::{AppError, Result},
};

/// Loads the BLS and ECDSA keys named in `config` and checks them against the operator address.
pub(crate) fn load_identity(config: &Config) -> Result<OperatorIdentity> {
    let bls_secret = read_hex_key(&config.bls_key_path)?;
    let bls = BlsKeyPair::from_secret_bytes(&bls_secret)?;
    let ecdsa_secret = read_hex_key(&config.ecdsa_key_path)?;
    let tx_signer = OperatorIdentity::ecdsa_signer_from_bytes(&ecdsa_secret)?;

    let identity = OperatorIdentity::new(bls, tx_signer, config.operator_address)?;
    Ok(identity)
}

pub(crate) fn build_registry(config: &Config) -> Result<VerifierRegistry> {
    let registry = match &config.enabled_verifiers {
        Some(enabled) => VerifierRegistry::with_enabled(enabled)?,
        None => VerifierRegistry::with_builtin(),
    };
    Ok(registry)
}

/// Reads a hex encoded key, with or without `0x` prefix and surrounding whitespace.
fn read_hex_key(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let contents = Zeroizing::new(fs::read_to_string(path).map_err(|source| {
        AppError::KeyFile {
            path: path.to_owned(),
            source,
        }
    })?);
    let trimmed = contents.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let bytes = hex::decode(digits).map_err(|e| AppError::KeyEncoding {
        path: path.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(Zeroizing::new(bytes))
}
