//! Board generation: paired symbols, shuffled deterministically from seed
//! material bound to the player, the session and the ledger.

use soroban_sdk::{Address, Bytes, BytesN, Env};

/// Distinct symbols on a board; each appears exactly twice.
pub const PAIR_COUNT: u32 = 5;
pub const BOARD_SIZE: u32 = PAIR_COUNT * 2;
pub const SYMBOL_COUNT: u32 = PAIR_COUNT;

pub(crate) const BOARD_LEN: usize = BOARD_SIZE as usize;

/// `keccak256(player || session_id || ledger timestamp || ledger sequence || entropy)`
///
/// `entropy` comes from the host PRNG and is never stored or published, so the
/// seed cannot be rebuilt from the session record or its events.
pub fn seed_material(env: &Env, player: &Address, session_id: u32, entropy: u64) -> BytesN<32> {
    let mut data = player.to_string().to_bytes();
    data.append(&Bytes::from_array(env, &session_id.to_be_bytes()));
    data.append(&Bytes::from_array(env, &env.ledger().timestamp().to_be_bytes()));
    data.append(&Bytes::from_array(env, &env.ledger().sequence().to_be_bytes()));
    data.append(&Bytes::from_array(env, &entropy.to_be_bytes()));
    env.crypto().keccak256(&data).into()
}

/// Lay out `PAIR_COUNT` pairs and Fisher-Yates shuffle them with the host PRNG
/// re-seeded from `seed`. Identical seeds give identical boards.
///
/// The returned plaintext is meant to be sealed slot by slot and dropped.
pub fn generate(env: &Env, seed: &BytesN<32>) -> [u32; BOARD_LEN] {
    env.prng().seed(seed.clone().into());

    let mut board = [0u32; BOARD_LEN];
    let mut i = 0usize;
    while i < BOARD_LEN {
        board[i] = (i / 2) as u32;
        i += 1;
    }

    let mut idx = BOARD_SIZE;
    while idx > 1 {
        idx -= 1;
        let j = env.prng().gen_range::<u64>(0..=(idx as u64)) as usize;
        board.swap(idx as usize, j);
    }

    board
}
