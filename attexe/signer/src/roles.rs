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

//! Role-separated key bundles of a registered participant.
//!
//! Each protocol action is scoped to one of four key roles. The roles are
//! distinct types, so signing a submission with the policy key (or vice
//! versa) is a compile error rather than a runtime possibility.

use crate::{PublicKey, Signature, SignedData, Signer};
use anyhow::Result;
use attexe_common::{Address, Digest, RewardEpochId, ToDigest, policy::VoterRegistration};

macro_rules! role_key {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name(PublicKey);

        impl $name {
            pub fn new(public_key: PublicKey) -> Self {
                Self(public_key)
            }

            pub fn public_key(&self) -> PublicKey {
                self.0
            }

            pub fn address(&self) -> Address {
                self.0.to_address()
            }

            /// Sign `data` in this role.
            pub fn sign<T: ToDigest>(&self, signer: &Signer, data: T) -> Result<SignedData<T>> {
                signer.signed_data(self.0, data)
            }
        }
    };
}

role_key! {
    /// Identifies the participant; never used for protocol submissions.
    IdentityKey
}

role_key! {
    /// Signs first- and second-phase round submissions.
    SubmitKey
}

role_key! {
    /// Signs signature-phase round submissions.
    SubmitSignaturesKey
}

role_key! {
    /// Signs registrations, policy ratifications and finalizations.
    PolicySignerKey
}

impl PolicySignerKey {
    /// Bare signature over a digest, for policy-ordered signature lists.
    pub fn sign_digest(&self, signer: &Signer, digest: Digest) -> Result<Signature> {
        signer.sign_digest(self.0, digest)
    }
}

/// One voter's role-separated key material. Created once at startup and
/// immutable afterwards.
#[derive(Clone, Copy, Debug)]
pub struct RoleKeys {
    pub identity: IdentityKey,
    pub submit: SubmitKey,
    pub submit_signatures: SubmitSignaturesKey,
    pub policy_signer: PolicySignerKey,
}

impl RoleKeys {
    /// Provision a fresh bundle of four distinct keys into `signer`.
    pub fn generate(signer: &Signer) -> Self {
        Self {
            identity: IdentityKey::new(signer.generate_key()),
            submit: SubmitKey::new(signer.generate_key()),
            submit_signatures: SubmitSignaturesKey::new(signer.generate_key()),
            policy_signer: PolicySignerKey::new(signer.generate_key()),
        }
    }
}

/// A simulated voter.
#[derive(Clone, Copy, Debug)]
pub struct Participant {
    keys: RoleKeys,
}

impl Participant {
    pub fn new(keys: RoleKeys) -> Self {
        Self { keys }
    }

    /// Provision a participant with freshly generated role keys.
    pub fn generate(signer: &Signer) -> Self {
        Self::new(RoleKeys::generate(signer))
    }

    pub fn keys(&self) -> &RoleKeys {
        &self.keys
    }

    pub fn identity_address(&self) -> Address {
        self.keys.identity.address()
    }

    /// The registration record this participant submits for `reward_epoch_id`.
    pub fn registration(&self, reward_epoch_id: RewardEpochId) -> VoterRegistration {
        VoterRegistration {
            reward_epoch_id,
            identity: self.keys.identity.address(),
            submit: self.keys.submit.address(),
            submit_signatures: self.keys.submit_signatures.address(),
            policy_signer: self.keys.policy_signer.address(),
        }
    }
}
