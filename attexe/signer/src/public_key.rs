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

use crate::PrivateKey;
use anyhow::{Error, Result};
use attexe_common::{Address, keccak256};
use parity_scale_codec::{Decode, Encode};
use std::{fmt, str::FromStr};

/// A secp256k1 public key in compressed SEC1 form, 33 bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    /// The address of the key: the least significant 20 bytes of the
    /// keccak256 hashed uncompressed public key.
    pub fn to_address(&self) -> Address {
        let uncompressed = secp256k1::PublicKey::from(*self).serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        let mut address = Address::default();
        address.0.copy_from_slice(&hash[12..]);
        address
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(key: secp256k1::PublicKey) -> Self {
        Self(key.serialize())
    }
}

impl From<PublicKey> for secp256k1::PublicKey {
    fn from(key: PublicKey) -> Self {
        secp256k1::PublicKey::from_slice(&key.0).expect("33 bytes; valid compressed point")
    }
}

impl From<PrivateKey> for PublicKey {
    fn from(key: PrivateKey) -> Self {
        secp256k1::SecretKey::from(key)
            .public_key(secp256k1::global::SECP256K1)
            .into()
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);

        let mut buf = [0u8; 33];
        hex::decode_to_slice(s, &mut buf)?;

        Ok(Self(buf))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
