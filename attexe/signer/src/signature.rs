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

//! Secp256k1 signature types and utilities.

use crate::{PrivateKey, PublicKey};
use anyhow::{Result, bail};
use attexe_common::{Address, Digest, ToDigest};
use parity_scale_codec::{Decode, Encode};
use secp256k1::{
    Message,
    ecdsa::{RecoverableSignature, RecoveryId},
};
use std::fmt;

/// A recoverable ECDSA signature with the `v` value in pre-EIP-155 notation
/// (`{27; 28}`).
#[derive(Clone, Copy, Encode, Decode, PartialEq, Eq, Hash)]
pub struct Signature([u8; 65]);

impl Signature {
    /// Create a recoverable signature for the provided digest using the
    /// private key.
    pub fn create_for_digest(private_key: PrivateKey, digest: Digest) -> Result<Self> {
        let message = Message::from_digest(digest.into());

        let recoverable = secp256k1::global::SECP256K1
            .sign_ecdsa_recoverable(&message, &private_key.into());
        let (id, signature) = recoverable.serialize_compact();

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(signature.as_ref());
        bytes[64] = (id.to_i32() as u8) + 27;

        Ok(Self(bytes))
    }

    /// Recovers the public key which was used to create the signature for the
    /// signed digest.
    pub fn recover_from_digest(&self, digest: Digest) -> Result<PublicKey> {
        let signature: RecoverableSignature = (*self).try_into()?;
        let message = Message::from_digest(digest.into());

        secp256k1::global::SECP256K1
            .recover_ecdsa(&message, &signature)
            .map(PublicKey::from)
            .map_err(Into::into)
    }

    /// Verifies the signature against the public key and digest.
    pub fn verify(&self, public_key: PublicKey, digest: Digest) -> Result<()> {
        let signature: RecoverableSignature = (*self).try_into()?;
        let message = Message::from_digest(digest.into());

        secp256k1::global::SECP256K1
            .verify_ecdsa(&message, &signature.to_standard(), &public_key.into())
            .map_err(Into::into)
    }

    /// Verifies that the signature over the digest was produced by the key
    /// behind `address`.
    pub fn verify_address(&self, address: Address, digest: Digest) -> Result<()> {
        let public_key = self.recover_from_digest(digest)?;

        if public_key.to_address() != address {
            bail!("signature verification failed: recovered key does not match {address}");
        }

        self.verify(public_key, digest)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<Signature> for RecoverableSignature {
    type Error = anyhow::Error;

    fn try_from(sig: Signature) -> Result<Self> {
        let Some(v) = sig.0[64].checked_sub(27) else {
            bail!("invalid signature `v` value: {}", sig.0[64]);
        };

        RecoverableSignature::from_compact(&sig.0[..64], RecoveryId::from_i32(v as i32)?)
            .map_err(Into::into)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// A signed data structure that carries the data and its signature.
#[derive(Clone, Debug, Encode, Decode, PartialEq, Eq)]
pub struct SignedData<T: Sized> {
    data: T,
    signature: Signature,
}

impl<T: ToDigest + Sized> SignedData<T> {
    pub fn new(data: T, signature: Signature) -> Self {
        Self { data, signature }
    }

    /// Recovers the public key which was used to sign the data.
    pub fn recover(&self) -> Result<PublicKey> {
        self.signature.recover_from_digest(self.data.to_digest())
    }

    /// Recovers the address of the signing key.
    pub fn address(&self) -> Result<Address> {
        self.recover().map(|key| key.to_address())
    }

    /// Verifies that the data was signed by `public_key`.
    pub fn verify(&self, public_key: PublicKey) -> Result<()> {
        self.signature.verify(public_key, self.data.to_digest())
    }

    /// Verifies that the data was signed by the key behind `address`.
    pub fn verify_address(&self, address: Address) -> Result<()> {
        self.signature
            .verify_address(address, self.data.to_digest())
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn into_parts(self) -> (T, Signature) {
        (self.data, self.signature)
    }
}
