#![no_std]

//! # Encrypted Memory Match
//!
//! A single-player memory game. Each player owns at most one session: a board
//! of 10 sealed cards (5 symbols, each twice). The player flips two cards, then
//! resolves them; a match retires the pair and scores points.
//!
//! ## Game flow
//! 1. `start_game` seals a freshly shuffled board for the player.
//! 2. `flip_card` fills the first free flip slot (two slots per pair).
//! 3. `resolve_match` compares the two sealed cards, commits the outcome,
//!    counts one step and clears both slots.
//! 4. The session ends as a win when every pair is matched, or as a loss when
//!    the step budget runs out. Either way the player's stats are updated and
//!    the final score is offered to the leaderboard contract.
//! 5. `abandon_game` ends a session with no credit and no stats change;
//!    `reset_game` discards the session slot entirely.
//!
//! ## Sealed values
//! Card values are only held as ciphertext handles (see [`cipher`]). Match
//! decisions use the cipher's `equal` result through branch-free `select`;
//! plaintext is revealed only to the session owner for display.
//!
//! ## Unset flip slots
//! An empty flip slot is stored and reported as `UNSET_INDEX` (255), one past
//! the largest index an 8-bit board could address.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, log,
    Address, Bytes, BytesN, Env, Vec,
};

pub mod board;
pub mod cipher;
pub mod scoring;

use board::{BOARD_SIZE, PAIR_COUNT};
use cipher::{select, CardCipher};
use scoring::MAX_STEPS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvSessionStarted {
    pub player: Address,
    pub session_id: u32,
}

/// Emitted when a card is turned face up. `value` is the owner's reveal.
#[contractevent]
pub struct EvCardFlipped {
    pub player: Address,
    pub index: u32,
    pub value: u32,
}

#[contractevent]
pub struct EvCardsMatched {
    pub player: Address,
    pub index1: u32,
    pub index2: u32,
}

#[contractevent]
pub struct EvCardsNotMatched {
    pub player: Address,
    pub index1: u32,
    pub index2: u32,
}

/// Emitted on win, loss and abandon. Abandon always reports `(false, 0)`.
#[contractevent]
pub struct EvSessionEnded {
    pub player: Address,
    pub won: bool,
    pub final_score: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Column view of the leaderboard, padded to 10 slots.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeaderboardView {
    pub players: Vec<Option<Address>>,
    pub scores: Vec<u32>,
    pub timestamps: Vec<u64>,
}

#[contractclient(name = "LeaderboardClient")]
pub trait ScoreLeaderboard {
    fn qualify(env: Env, caller: Address, player: Address, score: u32, timestamp: u64) -> u32;

    fn get_leaderboard(env: Env) -> LeaderboardView;

    fn get_rank(env: Env, player: Address) -> (u32, u32);
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MemoryMatchError {
    AlreadyActive = 1,
    InvalidState = 2,
    InvalidIndex = 3,
    AlreadyFlipped = 4,
    BothSlotsFull = 5,
    NotAuthorized = 6,
    AdminNotSet = 7,
    LeaderboardNotSet = 8,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Session state & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

pub const UNSET_INDEX: u32 = 255;

/// Board placeholder for a face-down card in `get_game_state`.
pub const HIDDEN_CARD: u32 = 255;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameSession {
    pub player: Address,
    pub session_id: u32,
    /// Sealed card handles, one per board slot
    pub board: Vec<BytesN<32>>,
    pub flipped_index1: u32,
    pub flipped_index2: u32,
    pub steps: u32,
    pub score: u32,
    pub matched_pairs: u32,
    /// Bit `i` set once slot `i` has been matched
    pub matched_mask: u32,
    pub ended: bool,
    pub won: bool,
    pub start_time: u64,
    /// 0 until the session ends
    pub end_time: u64,
}

/// Session as shown to its owner: face-up cards carry their symbol, every
/// other slot reads `HIDDEN_CARD`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameView {
    pub session_id: u32,
    pub board: Vec<u32>,
    pub flipped_index1: u32,
    pub flipped_index2: u32,
    pub steps: u32,
    pub score: u32,
    pub matched_pairs: u32,
    pub ended: bool,
    pub won: bool,
    pub start_time: u64,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlayerStats {
    pub total_score: u64,
    pub games_played: u32,
    pub games_won: u32,
    pub best_score: u32,
    pub last_played: u64,
}

#[contracttype]
#[derive(Clone)]
enum StorageKey {
    Admin,
    LeaderboardAddress,
    SessionCounter,
    Session(Address),
    /// Cipher key of the player's current session. Never returned by a view.
    SealKey(Address),
    Stats(Address),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Session TTL: 30 days
const SESSION_TTL_SECONDS: u32 = 30 * 24 * 60 * 60;
const SESSION_TTL_LEDGERS: u32 = SESSION_TTL_SECONDS / LEDGER_RATE_SECS;

// Stats TTL: 120 days
const STATS_TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
const STATS_TTL_LEDGERS: u32 = STATS_TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct MemoryMatchContract;

#[contractimpl]
impl MemoryMatchContract {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor & Lifecycle
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(env: Env, admin: Address, leaderboard: Address) {
        env.storage()
            .instance()
            .set(&StorageKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&StorageKey::LeaderboardAddress, &leaderboard);
        env.storage()
            .instance()
            .set(&StorageKey::SessionCounter, &0u32);
    }

    /// Start a new session. Rejected while the player's previous session is
    /// still running; an ended session is simply superseded.
    pub fn start_game(env: Env, player: Address) -> Result<(), MemoryMatchError> {
        player.require_auth();

        if let Some(existing) = Self::read_session(&env, &player) {
            if !existing.ended {
                return Err(MemoryMatchError::AlreadyActive);
            }
        }

        let session_id = Self::next_session_id(&env);

        // Private to this call; drawn before the PRNG is re-seeded for the shuffle
        let entropy = env.prng().gen::<u64>();
        let seed = board::seed_material(&env, &player, session_id, entropy);
        let cipher = CardCipher::new(&env, CardCipher::derive_key(&env, &seed, entropy));

        let plain = board::generate(&env, &seed);
        let mut sealed: Vec<BytesN<32>> = Vec::new(&env);
        for (slot, value) in plain.iter().enumerate() {
            sealed.push_back(cipher.seal(slot as u32, *value));
        }

        let session = GameSession {
            player: player.clone(),
            session_id,
            board: sealed,
            flipped_index1: UNSET_INDEX,
            flipped_index2: UNSET_INDEX,
            steps: 0,
            score: 0,
            matched_pairs: 0,
            matched_mask: 0,
            ended: false,
            won: false,
            start_time: env.ledger().timestamp(),
            end_time: 0,
        };

        Self::write_seal_key(&env, &player, cipher.key());
        Self::write_session(&env, &session);

        EvSessionStarted { player, session_id }.publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Flip / Resolve
    // ───────────────────────────────────────────────────────────────────────────

    /// Turn a card face up into the first free flip slot.
    ///
    /// `_index_proof` is the opaque blob a confidential client relays with the
    /// index; the contract accepts it as-is.
    pub fn flip_card(
        env: Env,
        player: Address,
        index: u32,
        _index_proof: Bytes,
    ) -> Result<(), MemoryMatchError> {
        player.require_auth();

        let mut session = Self::read_active(&env, &player)?;

        if index >= BOARD_SIZE || Self::is_matched(&session, index) {
            return Err(MemoryMatchError::InvalidIndex);
        }
        if index == session.flipped_index1 {
            return Err(MemoryMatchError::AlreadyFlipped);
        }

        if session.flipped_index1 == UNSET_INDEX {
            session.flipped_index1 = index;
        } else if session.flipped_index2 == UNSET_INDEX {
            session.flipped_index2 = index;
        } else {
            return Err(MemoryMatchError::BothSlotsFull);
        }

        let cipher = Self::load_cipher(&env, &player)?;
        let value = cipher.reveal(
            &session.player,
            &player,
            index,
            &session.board.get_unchecked(index),
        )?;

        Self::write_session(&env, &session);

        EvCardFlipped {
            player,
            index,
            value,
        }
        .publish(&env);
        Ok(())
    }

    /// Compare the two flipped cards and commit the outcome.
    ///
    /// Always counts one step and clears both slots. Ends the session on the
    /// last pair (win) or when the step budget is spent (loss).
    pub fn resolve_match(env: Env, player: Address) -> Result<(), MemoryMatchError> {
        player.require_auth();

        let mut session = Self::read_active(&env, &player)?;
        if session.flipped_index1 == UNSET_INDEX || session.flipped_index2 == UNSET_INDEX {
            return Err(MemoryMatchError::InvalidState);
        }

        let i1 = session.flipped_index1;
        let i2 = session.flipped_index2;
        let cipher = Self::load_cipher(&env, &player)?;
        let is_match = cipher.equal(
            i1,
            &session.board.get_unchecked(i1),
            i2,
            &session.board.get_unchecked(i2),
        );

        let pairs_before = session.matched_pairs;
        let points = scoring::score_for_match(session.steps);
        session.matched_mask |= select(&is_match, (1 << i1) | (1 << i2), 0);
        session.matched_pairs += select(&is_match, 1, 0);
        session.score += select(&is_match, points, 0);
        session.steps += 1;
        session.flipped_index1 = UNSET_INDEX;
        session.flipped_index2 = UNSET_INDEX;

        if session.matched_pairs != pairs_before {
            EvCardsMatched {
                player: player.clone(),
                index1: i1,
                index2: i2,
            }
            .publish(&env);
        } else {
            EvCardsNotMatched {
                player: player.clone(),
                index1: i1,
                index2: i2,
            }
            .publish(&env);
        }

        let won = session.matched_pairs == PAIR_COUNT;
        if won || session.steps >= MAX_STEPS {
            Self::complete_session(&env, &mut session, won)?;
        }

        Self::write_session(&env, &session);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Abandon / Reset
    // ───────────────────────────────────────────────────────────────────────────

    /// End the running session with no credit: score drops to zero and
    /// neither stats nor leaderboard are touched.
    pub fn abandon_game(env: Env, player: Address) -> Result<(), MemoryMatchError> {
        player.require_auth();

        let mut session = Self::read_active(&env, &player)?;
        session.ended = true;
        session.won = false;
        session.score = 0;
        session.flipped_index1 = UNSET_INDEX;
        session.flipped_index2 = UNSET_INDEX;
        session.end_time = env.ledger().timestamp();

        Self::write_session(&env, &session);

        EvSessionEnded {
            player,
            won: false,
            final_score: 0,
        }
        .publish(&env);
        Ok(())
    }

    /// Drop the player's session slot, whatever its state.
    pub fn reset_game(env: Env, player: Address) {
        player.require_auth();

        env.storage()
            .temporary()
            .remove(&StorageKey::Session(player.clone()));
        env.storage()
            .temporary()
            .remove(&StorageKey::SealKey(player.clone()));

        log!(&env, "session slot cleared", player);
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    /// Public view of the player's slot. Face-up cards show their symbol (the
    /// same value `EvCardFlipped` already published); every other card reads
    /// `HIDDEN_CARD`.
    ///
    /// With no session the view is zeroed: `session_id` 0, an empty board and
    /// both flip slots `UNSET_INDEX`.
    pub fn get_game_state(env: Env, player: Address) -> Result<GameView, MemoryMatchError> {
        let session = match Self::read_session(&env, &player) {
            Some(session) => session,
            None => return Ok(Self::empty_view(&env)),
        };
        let cipher = Self::load_cipher(&env, &player)?;

        let mut board: Vec<u32> = Vec::new(&env);
        for slot in 0..session.board.len() {
            if Self::is_face_up(&session, slot) {
                board.push_back(cipher.disclose(slot, &session.board.get_unchecked(slot)));
            } else {
                board.push_back(HIDDEN_CARD);
            }
        }

        Ok(GameView {
            session_id: session.session_id,
            board,
            flipped_index1: session.flipped_index1,
            flipped_index2: session.flipped_index2,
            steps: session.steps,
            score: session.score,
            matched_pairs: session.matched_pairs,
            ended: session.ended,
            won: session.won,
            start_time: session.start_time,
            end_time: session.end_time,
        })
    }

    /// Owner-only reveal of a face-up card (flipped or matched).
    pub fn reveal_card(
        env: Env,
        player: Address,
        viewer: Address,
        index: u32,
    ) -> Result<u32, MemoryMatchError> {
        viewer.require_auth();

        let session = Self::read_session(&env, &player).ok_or(MemoryMatchError::InvalidState)?;
        if index >= session.board.len() {
            return Err(MemoryMatchError::InvalidIndex);
        }
        let cipher = Self::load_cipher(&env, &player)?;
        let value = cipher.reveal(
            &session.player,
            &viewer,
            index,
            &session.board.get_unchecked(index),
        )?;

        if !Self::is_face_up(&session, index) {
            return Err(MemoryMatchError::InvalidIndex);
        }
        Ok(value)
    }

    /// Full plaintext board of a finished session, for anyone to audit the
    /// pairing and the recorded outcome.
    pub fn verify_board(env: Env, player: Address) -> Result<Vec<u32>, MemoryMatchError> {
        let session = Self::read_session(&env, &player).ok_or(MemoryMatchError::InvalidState)?;
        if !session.ended {
            return Err(MemoryMatchError::InvalidState);
        }
        let cipher = Self::load_cipher(&env, &player)?;
        Ok(Self::plain_board(&env, &cipher, &session))
    }

    pub fn get_player_stats(env: Env, player: Address) -> PlayerStats {
        env.storage()
            .persistent()
            .get(&StorageKey::Stats(player))
            .unwrap_or_default()
    }

    pub fn get_leaderboard(env: Env) -> Result<LeaderboardView, MemoryMatchError> {
        let addr = Self::load_leaderboard(&env)?;
        Ok(LeaderboardClient::new(&env, &addr).get_leaderboard())
    }

    /// `(rank, score)`; `(0, 0)` when the player is not on the board.
    pub fn get_player_rank(env: Env, player: Address) -> Result<(u32, u32), MemoryMatchError> {
        let addr = Self::load_leaderboard(&env)?;
        Ok(LeaderboardClient::new(&env, &addr).get_rank(&player))
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, MemoryMatchError> {
        Self::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), MemoryMatchError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage()
            .instance()
            .set(&StorageKey::Admin, &new_admin);
        Ok(())
    }

    pub fn get_leaderboard_address(env: Env) -> Result<Address, MemoryMatchError> {
        Self::load_leaderboard(&env)
    }

    pub fn set_leaderboard_address(
        env: Env,
        new_leaderboard: Address,
    ) -> Result<(), MemoryMatchError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage()
            .instance()
            .set(&StorageKey::LeaderboardAddress, &new_leaderboard);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), MemoryMatchError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Completion (single stats/leaderboard call-site)
    // ═══════════════════════════════════════════════════════════════════════════

    fn complete_session(
        env: &Env,
        session: &mut GameSession,
        won: bool,
    ) -> Result<(), MemoryMatchError> {
        let board_addr = Self::load_leaderboard(env)?;
        let now = env.ledger().timestamp();

        session.ended = true;
        session.won = won;
        session.end_time = now;

        Self::record_completion(env, &session.player, won, session.score, now);

        LeaderboardClient::new(env, &board_addr).qualify(
            &env.current_contract_address(),
            &session.player,
            &session.score,
            &now,
        );

        EvSessionEnded {
            player: session.player.clone(),
            won,
            final_score: session.score,
        }
        .publish(env);
        Ok(())
    }

    fn record_completion(env: &Env, player: &Address, won: bool, final_score: u32, now: u64) {
        let key = StorageKey::Stats(player.clone());
        let mut stats: PlayerStats = env
            .storage()
            .persistent()
            .get(&key)
            .unwrap_or_default();

        stats.games_played += 1;
        if won {
            stats.games_won += 1;
        }
        stats.total_score += final_score as u64;
        if final_score > stats.best_score {
            stats.best_score = final_score;
        }
        stats.last_played = now;

        env.storage().persistent().set(&key, &stats);
        env.storage()
            .persistent()
            .extend_ttl(&key, STATS_TTL_LEDGERS, STATS_TTL_LEDGERS);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Board helpers
    // ═══════════════════════════════════════════════════════════════════════════

    fn is_matched(session: &GameSession, slot: u32) -> bool {
        session.matched_mask & (1 << slot) != 0
    }

    fn is_face_up(session: &GameSession, slot: u32) -> bool {
        Self::is_matched(session, slot)
            || slot == session.flipped_index1
            || slot == session.flipped_index2
    }

    /// Every card in the clear. Only for sessions whose board is public.
    fn plain_board(env: &Env, cipher: &CardCipher, session: &GameSession) -> Vec<u32> {
        let mut values: Vec<u32> = Vec::new(env);
        for slot in 0..session.board.len() {
            values.push_back(cipher.disclose(slot, &session.board.get_unchecked(slot)));
        }
        values
    }

    fn empty_view(env: &Env) -> GameView {
        GameView {
            session_id: 0,
            board: Vec::new(env),
            flipped_index1: UNSET_INDEX,
            flipped_index2: UNSET_INDEX,
            steps: 0,
            score: 0,
            matched_pairs: 0,
            ended: false,
            won: false,
            start_time: 0,
            end_time: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn next_session_id(env: &Env) -> u32 {
        let last: u32 = env
            .storage()
            .instance()
            .get(&StorageKey::SessionCounter)
            .unwrap_or(0);
        let next = last + 1;
        env.storage()
            .instance()
            .set(&StorageKey::SessionCounter, &next);
        next
    }

    fn read_session(env: &Env, player: &Address) -> Option<GameSession> {
        env.storage()
            .temporary()
            .get(&StorageKey::Session(player.clone()))
    }

    /// Session that still accepts flips and resolves.
    fn read_active(env: &Env, player: &Address) -> Result<GameSession, MemoryMatchError> {
        match Self::read_session(env, player) {
            Some(session) if !session.ended => Ok(session),
            _ => Err(MemoryMatchError::InvalidState),
        }
    }

    fn write_session(env: &Env, session: &GameSession) {
        let key = StorageKey::Session(session.player.clone());
        env.storage().temporary().set(&key, session);
        env.storage()
            .temporary()
            .extend_ttl(&key, SESSION_TTL_LEDGERS, SESSION_TTL_LEDGERS);
        // Keep instance storage (admin, leaderboard, counter) alive
        env.storage()
            .instance()
            .extend_ttl(SESSION_TTL_LEDGERS, SESSION_TTL_LEDGERS);
    }

    fn write_seal_key(env: &Env, player: &Address, key: &BytesN<32>) {
        let storage_key = StorageKey::SealKey(player.clone());
        env.storage().temporary().set(&storage_key, key);
        env.storage()
            .temporary()
            .extend_ttl(&storage_key, SESSION_TTL_LEDGERS, SESSION_TTL_LEDGERS);
    }

    fn load_cipher<'a>(env: &'a Env, player: &Address) -> Result<CardCipher<'a>, MemoryMatchError> {
        let key: BytesN<32> = env
            .storage()
            .temporary()
            .get(&StorageKey::SealKey(player.clone()))
            .ok_or(MemoryMatchError::InvalidState)?;
        Ok(CardCipher::new(env, key))
    }

    fn load_admin(env: &Env) -> Result<Address, MemoryMatchError> {
        env.storage()
            .instance()
            .get(&StorageKey::Admin)
            .ok_or(MemoryMatchError::AdminNotSet)
    }

    fn load_leaderboard(env: &Env) -> Result<Address, MemoryMatchError> {
        env.storage()
            .instance()
            .get(&StorageKey::LeaderboardAddress)
            .ok_or(MemoryMatchError::LeaderboardNotSet)
    }
}
