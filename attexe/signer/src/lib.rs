// This file is part of Gear.
//
// Copyright (C) 2025 Gear Technologies Inc.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Signer library for attexe.
//!
//! Defines private/public key types, recoverable ECDSA signatures and the
//! role-separated key bundles simulated participants hold. Cryptography is
//! based on the secp256k1 standard via the
//! [secp256k1](https://crates.io/crates/secp256k1) crate, wrapped in the
//! crate's own types.
//!
//! Keys live in an in-memory store: participants are provisioned at startup
//! and key persistence is out of scope for the simulation.

mod private_key;
mod public_key;
mod roles;
mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use roles::{
    IdentityKey, Participant, PolicySignerKey, RoleKeys, SubmitKey, SubmitSignaturesKey,
};
pub use signature::{Signature, SignedData};

use anyhow::{Result, bail};
use attexe_common::{Address, Digest, ToDigest};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// Signer which signs data using an owned in-memory key store.
#[derive(Debug, Clone, Default)]
pub struct Signer {
    key_store: Arc<RwLock<HashMap<PublicKey, PrivateKey>>>,
}

impl Signer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a private key to the key store.
    pub fn add_key(&self, key: PrivateKey) -> PublicKey {
        let public_key: PublicKey = key.into();
        self.key_store.write().insert(public_key, key);
        public_key
    }

    /// Generate a new private key and return a public key for it.
    pub fn generate_key(&self) -> PublicKey {
        let (secret_key, _) = secp256k1::generate_keypair(&mut secp256k1::rand::thread_rng());
        self.add_key(PrivateKey(secret_key.secret_bytes()))
    }

    /// Check if a key exists in the key store.
    pub fn has_key(&self, key: PublicKey) -> bool {
        self.key_store.read().contains_key(&key)
    }

    /// Get a public key for the provided address. If no key is found,
    /// `None` is returned.
    pub fn get_key_by_addr(&self, address: Address) -> Option<PublicKey> {
        self.key_store
            .read()
            .keys()
            .find(|key| key.to_address() == address)
            .copied()
    }

    /// Create a recoverable ECDSA signature over the digest.
    pub fn sign_digest(&self, public_key: PublicKey, digest: Digest) -> Result<Signature> {
        let private_key = self.get_private_key(public_key)?;

        Signature::create_for_digest(private_key, digest)
    }

    /// Create a recoverable ECDSA signature over the raw bytes data.
    pub fn sign(&self, public_key: PublicKey, data: &[u8]) -> Result<Signature> {
        self.sign_digest(public_key, data.to_digest())
    }

    /// Sign `data` and bundle it with the signature.
    pub fn signed_data<T: ToDigest>(&self, public_key: PublicKey, data: T) -> Result<SignedData<T>> {
        let signature = self.sign_digest(public_key, data.to_digest())?;

        Ok(SignedData::new(data, signature))
    }

    fn get_private_key(&self, key: PublicKey) -> Result<PrivateKey> {
        let Some(private_key) = self.key_store.read().get(&key).copied() else {
            bail!("key not found in store: {key}");
        };

        Ok(private_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sign_and_recover() {
        let signer = Signer::new();
        let public_key = signer.generate_key();

        let message = b"hello world";
        let signature = signer.sign(public_key, message).expect("failed to sign");

        let recovered = signature
            .recover_from_digest(message.as_slice().to_digest())
            .expect("failed to recover public key");

        assert_eq!(recovered, public_key);
    }

    #[test]
    fn sign_with_known_vector() {
        let signer = Signer::new();
        let private_key =
            PrivateKey::from_str("4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f")
                .expect("invalid private key hex");
        let public_key = signer.add_key(private_key);
        assert!(signer.has_key(public_key));

        let digest = b"hello world".as_slice().to_digest();
        let signature = signer.sign_digest(public_key, digest).unwrap();

        signature
            .verify_address(public_key.to_address(), digest)
            .expect("recovered address must match");
    }

    #[test]
    fn lookup_by_address() {
        let signer = Signer::new();
        let public_key = signer.generate_key();

        assert_eq!(
            signer.get_key_by_addr(public_key.to_address()),
            Some(public_key)
        );
        assert_eq!(signer.get_key_by_addr(Address([0; 20])), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let signer = Signer::new();
        let foreign = Signer::new().generate_key();

        assert!(signer.sign(foreign, b"data").is_err());
    }
}
