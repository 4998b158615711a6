//! Sealed card values.
//!
//! The session machine only ever holds ciphertext handles. Game-affecting
//! decisions go through [`CardCipher::equal`] and [`select`]. Plaintext leaves
//! this module two ways:
//!
//! - [`CardCipher::reveal`]: owner-gated, for any card the owner asks about.
//! - [`CardCipher::disclose`]: ungated, only for values the game has already
//!   made public (face-up cards, boards of ended sessions). Callers must check
//!   that condition first.
//!
//! A handle is `keccak256(domain || key || slot || value)`. Binding the slot
//! keeps two cards of the same symbol from sharing a handle, so the stored
//! board does not expose its pairs. Opening scans the symbol alphabet with
//! masked accumulation instead of an early return.

use soroban_sdk::{Address, Bytes, BytesN, Env};

use crate::board::SYMBOL_COUNT;
use crate::MemoryMatchError;

const SEAL_DOMAIN: &[u8] = b"MM_SEAL_V1";
const KEY_DOMAIN: &[u8] = b"MM_KEY_V1";

/// Result of opening a handle that matches no symbol.
const UNSEALED: u32 = u32::MAX;

/// Comparison result that cannot be inspected, only fed to [`select`].
///
/// Internally an all-ones or all-zeros mask.
pub struct EncryptedBool(u32);

/// `cond ? a : b` without branching on `cond`.
pub fn select(cond: &EncryptedBool, a: u32, b: u32) -> u32 {
    b ^ ((a ^ b) & cond.0)
}

/// All-ones when `a == b`, zero otherwise.
fn eq_mask(a: u32, b: u32) -> u32 {
    let diff = a ^ b;
    let nonzero = (diff | diff.wrapping_neg()) >> 31;
    nonzero.wrapping_sub(1)
}

fn bool_mask(bit: bool) -> u32 {
    (bit as u32).wrapping_neg()
}

pub struct CardCipher<'a> {
    env: &'a Env,
    key: BytesN<32>,
}

impl<'a> CardCipher<'a> {
    pub fn new(env: &'a Env, key: BytesN<32>) -> Self {
        Self { env, key }
    }

    /// Session key from the board seed plus host entropy drawn before the
    /// PRNG is re-seeded for the shuffle.
    pub fn derive_key(env: &Env, seed: &BytesN<32>, entropy: u64) -> BytesN<32> {
        let mut data = Bytes::from_slice(env, KEY_DOMAIN);
        data.append(&Bytes::from_array(env, &seed.to_array()));
        data.append(&Bytes::from_array(env, &entropy.to_be_bytes()));
        env.crypto().keccak256(&data).into()
    }

    pub fn key(&self) -> &BytesN<32> {
        &self.key
    }

    pub fn seal(&self, slot: u32, plain: u32) -> BytesN<32> {
        let mut data = Bytes::from_slice(self.env, SEAL_DOMAIN);
        data.append(&Bytes::from_array(self.env, &self.key.to_array()));
        data.append(&Bytes::from_array(self.env, &slot.to_be_bytes()));
        data.append(&Bytes::from_array(self.env, &plain.to_be_bytes()));
        self.env.crypto().keccak256(&data).into()
    }

    pub fn equal(
        &self,
        slot_a: u32,
        a: &BytesN<32>,
        slot_b: u32,
        b: &BytesN<32>,
    ) -> EncryptedBool {
        EncryptedBool(eq_mask(self.open(slot_a, a), self.open(slot_b, b)))
    }

    /// Plaintext for display. Only the session owner may look.
    pub fn reveal(
        &self,
        owner: &Address,
        viewer: &Address,
        slot: u32,
        sealed: &BytesN<32>,
    ) -> Result<u32, MemoryMatchError> {
        if viewer != owner {
            return Err(MemoryMatchError::NotAuthorized);
        }
        Ok(self.open(slot, sealed))
    }

    /// Plaintext of a card whose value is already public.
    pub fn disclose(&self, slot: u32, sealed: &BytesN<32>) -> u32 {
        self.open(slot, sealed)
    }

    fn open(&self, slot: u32, sealed: &BytesN<32>) -> u32 {
        let mut acc = UNSEALED;
        for value in 0..SYMBOL_COUNT {
            let hit = EncryptedBool(bool_mask(self.seal(slot, value) == *sealed));
            acc = select(&hit, value, acc);
        }
        acc
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eq_mask_is_all_or_nothing() {
        assert_eq!(eq_mask(0, 0), u32::MAX);
        assert_eq!(eq_mask(7, 7), u32::MAX);
        assert_eq!(eq_mask(3, 4), 0);
        assert_eq!(eq_mask(0, u32::MAX), 0);
        assert_eq!(eq_mask(1 << 31, 0), 0);
    }

    #[test]
    fn select_picks_by_mask() {
        let yes = EncryptedBool(eq_mask(2, 2));
        let no = EncryptedBool(eq_mask(2, 3));
        assert_eq!(select(&yes, 11, 22), 11);
        assert_eq!(select(&no, 11, 22), 22);
        assert_eq!(select(&yes, 0b0110, 0), 0b0110);
        assert_eq!(select(&no, 0b0110, 0), 0);
    }

    #[test]
    fn same_symbol_in_different_slots_seals_differently() {
        let env = Env::default();
        let cipher = CardCipher::new(&env, BytesN::from_array(&env, &[9u8; 32]));
        let a = cipher.seal(0, 3);
        let b = cipher.seal(1, 3);
        assert_ne!(a, b);

        let m = cipher.equal(0, &a, 1, &b);
        assert_eq!(select(&m, 1, 0), 1);

        let c = cipher.seal(2, 4);
        let m = cipher.equal(0, &a, 2, &c);
        assert_eq!(select(&m, 1, 0), 0);
    }

    #[test]
    fn reveal_is_owner_only() {
        use soroban_sdk::testutils::Address as _;

        let env = Env::default();
        let cipher = CardCipher::new(&env, BytesN::from_array(&env, &[5u8; 32]));
        let owner = Address::generate(&env);
        let stranger = Address::generate(&env);
        let sealed = cipher.seal(6, 2);

        assert_eq!(cipher.reveal(&owner, &owner, 6, &sealed), Ok(2));
        assert_eq!(
            cipher.reveal(&owner, &stranger, 6, &sealed),
            Err(MemoryMatchError::NotAuthorized)
        );
    }

    #[test]
    fn disclose_agrees_with_owner_reveal() {
        use soroban_sdk::testutils::Address as _;

        let env = Env::default();
        let cipher = CardCipher::new(&env, BytesN::from_array(&env, &[3u8; 32]));
        let owner = Address::generate(&env);
        for slot in 0..4u32 {
            let sealed = cipher.seal(slot, slot % SYMBOL_COUNT);
            assert_eq!(
                Ok(cipher.disclose(slot, &sealed)),
                cipher.reveal(&owner, &owner, slot, &sealed)
            );
        }
    }

    #[test]
    fn foreign_key_does_not_open() {
        let env = Env::default();
        let mine = CardCipher::new(&env, BytesN::from_array(&env, &[1u8; 32]));
        let theirs = CardCipher::new(&env, BytesN::from_array(&env, &[2u8; 32]));
        let sealed = theirs.seal(0, 1);
        assert_eq!(mine.open(0, &sealed), UNSEALED);
    }
}
