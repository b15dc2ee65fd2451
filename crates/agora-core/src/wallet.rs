//! Caller identities for the marketplace ledger.
//!
//! Every ledger operation is invoked by an [`Address`]: the base58
//! encoding of an Ed25519 public key. A [`Wallet`] owns the matching
//! signing key, so an address can only be produced by whoever holds
//! the key — callers cannot forge each other's identities.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// A base58-encoded Ed25519 public key identifying a ledger participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parses an address from a base58-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base58 or does not
    /// decode to 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?;

        if bytes.len() != 32 {
            return Err(CoreError::InvalidAddress(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// Creates an address from a raw 32-byte public key.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(CoreError::InvalidAddress(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bs58::encode(bytes).into_string()))
    }

    /// Returns the base58 string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An Ed25519 keypair backing a ledger identity.
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generates a new random wallet.
    ///
    /// Key material comes straight from `OsRng` rather than a userspace
    /// PRNG seeded from system entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if the derived public key cannot be encoded.
    pub fn generate() -> Result<Self> {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::from_secret_key(&secret)
    }

    /// Reconstructs a wallet from a 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if `secret` is not 32 bytes.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let secret: [u8; 32] = secret
            .try_into()
            .map_err(|_| CoreError::InvalidKey(format!("secret key must be 32 bytes, got {}", secret.len())))?;

        let signing_key = SigningKey::from_bytes(&secret);
        let address = Address::from_bytes(signing_key.verifying_key().as_bytes())?;

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Returns this wallet's ledger address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the public verifying key.
    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs a message with this wallet's key.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

/// Verifies that `signature` over `message` was produced by the key
/// behind `address`.
///
/// Uses strict verification to rule out signature malleability.
///
/// # Errors
///
/// Returns an error if the address does not decode to a valid public
/// key or the signature does not verify.
pub fn verify_signature(address: &Address, message: &[u8], signature: &Signature) -> Result<()> {
    let bytes: [u8; 32] = bs58::decode(address.as_str())
        .into_vec()
        .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?
        .try_into()
        .map_err(|_| CoreError::InvalidAddress("address must be 32 bytes".into()))?;

    let key = VerifyingKey::from_bytes(&bytes)
        .map_err(|e| CoreError::InvalidKey(e.to_string()))?;

    key.verify_strict(message, signature)
        .map_err(|_| CoreError::InvalidKey("signature verification failed".into()))
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
