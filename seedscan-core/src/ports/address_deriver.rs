//! Address derivation port

use crate::domain::result::Result;
use crate::domain::DerivedAddress;

/// Turns a mnemonic into a single address
///
/// Fails with `Error::Derivation` when the phrase does not pass wordlist or
/// checksum validation.
pub trait AddressDeriver: Send + Sync {
    fn derive(&self, phrase: &str) -> Result<DerivedAddress>;
}
