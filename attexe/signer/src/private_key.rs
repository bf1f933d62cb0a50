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

use anyhow::{Error, Result};
use secp256k1::SecretKey;
use std::str::FromStr;

/// A secp256k1 secret key, a 32 bytes buffer assumed to be valid
/// for the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey(pub [u8; 32]);

impl From<PrivateKey> for SecretKey {
    fn from(key: PrivateKey) -> Self {
        SecretKey::from_slice(&key.0).expect("32 bytes, within curve order")
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);

        let mut buf = [0u8; 32];
        hex::decode_to_slice(s, &mut buf)?;

        Ok(Self(buf))
    }
}
