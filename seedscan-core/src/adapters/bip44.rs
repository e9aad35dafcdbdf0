//! BIP-44 Ethereum address derivation
//!
//! phrase → BIP-39 seed (empty passphrase) → `m/44'/60'/0'/0/0` → uncompressed
//! secp256k1 public key → Keccak-256 → last 20 bytes → EIP-55 checksum.

use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::domain::result::{Error, Result};
use crate::domain::{DerivedAddress, WalletKind};
use crate::ports::AddressDeriver;

/// First account, first external address
pub const ETHEREUM_PATH: &str = "m/44'/60'/0'/0/0";

/// Derives the first Ethereum account of a BIP-39 phrase
#[derive(Debug, Clone)]
pub struct Bip44EthereumDeriver {
    path: DerivationPath,
}

impl Bip44EthereumDeriver {
    pub fn new() -> Result<Self> {
        let path = ETHEREUM_PATH
            .parse::<DerivationPath>()
            .map_err(|e| Error::derivation(format!("invalid derivation path {}: {}", ETHEREUM_PATH, e)))?;
        Ok(Self { path })
    }

    /// Validate wordlist membership and checksum
    fn parse_phrase(phrase: &str) -> Result<Mnemonic> {
        let normalized = phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        if normalized.is_empty() {
            return Err(Error::derivation("mnemonic phrase is empty"));
        }
        Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| Error::derivation(format!("invalid mnemonic: {}", e)))
    }
}

impl AddressDeriver for Bip44EthereumDeriver {
    fn derive(&self, phrase: &str) -> Result<DerivedAddress> {
        let mnemonic = Self::parse_phrase(phrase)?;
        let seed = mnemonic.to_seed("");

        let xprv = XPrv::derive_from_path(seed, &self.path)
            .map_err(|e| Error::derivation(format!("key derivation failed: {}", e)))?;

        let public_key = k256::PublicKey::from(xprv.private_key().verifying_key());
        let point = public_key.to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        Ok(DerivedAddress {
            address: to_checksum_address(&hash[12..]),
            wallet_kind: WalletKind::Bip44Ethereum,
        })
    }
}

/// Render 20 address bytes as an EIP-55 mixed-case hex string
pub fn to_checksum_address(bytes: &[u8]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_known_vector() {
        let deriver = Bip44EthereumDeriver::new().unwrap();
        let derived = deriver.derive(ABANDON_ABOUT).unwrap();
        assert_eq!(derived.address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(derived.wallet_kind, WalletKind::Bip44Ethereum);
    }

    #[test]
    fn test_whitespace_and_case_are_normalized() {
        let deriver = Bip44EthereumDeriver::new().unwrap();
        let messy = format!("  {}\n", ABANDON_ABOUT.to_uppercase().replace(' ', "   "));
        let derived = deriver.derive(&messy).unwrap();
        assert_eq!(derived.address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn test_bad_checksum_is_derivation_error() {
        let deriver = Bip44EthereumDeriver::new().unwrap();
        let phrase = ABANDON_ABOUT.replace("about", "abandon");
        assert!(matches!(deriver.derive(&phrase), Err(Error::Derivation(_))));
    }

    #[test]
    fn test_unknown_word_is_derivation_error() {
        let deriver = Bip44EthereumDeriver::new().unwrap();
        assert!(matches!(deriver.derive("not a real phrase at all"), Err(Error::Derivation(_))));
        assert!(matches!(deriver.derive("   "), Err(Error::Derivation(_))));
    }

    #[test]
    fn test_eip55_reference_addresses() {
        // Vectors from the EIP-55 document
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let bytes = hex::decode(&expected[2..]).unwrap();
            assert_eq!(to_checksum_address(&bytes), expected);
        }
    }
}
