#![no_std]

//! # Leaderboard Contract
//!
//! Global top-10 table for Memory Match final scores. Game contracts (or the
//! admin) report a finished session's score through `qualify`; the table keeps
//! at most one entry per player and never lowers a player's stored score.
//!
//! ## Ordering
//! Entries are ranked by score (descending), then by the ledger timestamp at
//! which the score was achieved (ascending), so the first achiever of a score
//! outranks later ones. Entries with identical keys keep insertion order.
//!
//! ## Qualification
//! 1. Player already listed: replaced only by a strictly higher score.
//! 2. Table not full: inserted.
//! 3. Table full: inserted only if the score beats the 10th-ranked score,
//!    evicting the lowest entry.
//! 4. Otherwise nothing changes.
//!
//! A score of zero never qualifies; zero is the empty-slot sentinel of
//! `get_leaderboard`.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, panic_with_error,
    Address, Env, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeaderboardEntry {
    pub player: Address,
    pub score: u32,
    pub timestamp: u64,
}

/// Fixed-width snapshot of the table. Always `CAPACITY` long; unused slots are
/// `None` / `0` / `0`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeaderboardView {
    pub players: Vec<Option<Address>>,
    pub scores: Vec<u32>,
    pub timestamps: Vec<u64>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    /// Game contracts allowed to report scores
    AuthorizedGames,
    /// Ranked entries, best first, at most `CAPACITY`
    Entries,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LeaderboardError {
    NotAdmin = 1,
    NotAuthorized = 2,
    AdminNotSet = 3,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvLeaderboardUpdated {
    pub player: Address,
    pub score: u32,
    pub rank: u32,
}

#[contractevent]
pub struct EvGameAuthorized {
    pub game_contract: Address,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

pub const CAPACITY: u32 = 10;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Table lives as long as the contract is used (120 days between touches)
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
const TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct Leaderboard;

#[contractimpl]
impl Leaderboard {
    /// Initialize with admin address
    pub fn __constructor(env: Env, admin: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        let empty_games: Vec<Address> = Vec::new(&env);
        env.storage().instance().set(&DataKey::AuthorizedGames, &empty_games);
        let empty_entries: Vec<LeaderboardEntry> = Vec::new(&env);
        env.storage().instance().set(&DataKey::Entries, &empty_entries);
    }

    /// Add a game contract address that's allowed to report scores
    pub fn authorize_game(env: Env, caller: Address, game_contract: Address) {
        caller.require_auth();
        let admin = Self::load_admin(&env);
        if caller != admin {
            panic_with_error!(&env, LeaderboardError::NotAdmin);
        }
        let mut games: Vec<Address> = env
            .storage()
            .instance()
            .get(&DataKey::AuthorizedGames)
            .unwrap_or(Vec::new(&env));
        if !games.contains(&game_contract) {
            games.push_back(game_contract.clone());
            env.storage().instance().set(&DataKey::AuthorizedGames, &games);
            EvGameAuthorized { game_contract }.publish(&env);
        }
    }

    /// Offer a final score for the table. Called by an authorized game
    /// contract or the admin.
    ///
    /// Returns the player's new 1-based rank, or 0 when the table is unchanged.
    pub fn qualify(
        env: Env,
        caller: Address,
        player: Address,
        score: u32,
        timestamp: u64,
    ) -> u32 {
        caller.require_auth();

        let admin = Self::load_admin(&env);
        if caller != admin {
            let games: Vec<Address> = env
                .storage()
                .instance()
                .get(&DataKey::AuthorizedGames)
                .unwrap_or(Vec::new(&env));
            if !games.contains(&caller) {
                panic_with_error!(&env, LeaderboardError::NotAuthorized);
            }
        }

        if score == 0 {
            return 0;
        }

        let mut entries = Self::load_entries(&env);

        match Self::position_of(&entries, &player) {
            Some(idx) => {
                let existing = entries.get_unchecked(idx);
                if score <= existing.score {
                    return 0;
                }
                entries.remove(idx);
            }
            None => {
                if entries.len() >= CAPACITY {
                    let last = entries.get_unchecked(entries.len() - 1);
                    if score <= last.score {
                        return 0;
                    }
                    entries.pop_back();
                }
            }
        }

        let entry = LeaderboardEntry {
            player: player.clone(),
            score,
            timestamp,
        };
        let at = Self::insertion_point(&entries, &entry);
        entries.insert(at, entry);

        env.storage().instance().set(&DataKey::Entries, &entries);
        env.storage().instance().extend_ttl(TTL_LEDGERS, TTL_LEDGERS);

        let rank = at + 1;
        EvLeaderboardUpdated {
            player,
            score,
            rank,
        }
        .publish(&env);
        rank
    }

    /// Ranked entries, best first. Only occupied slots are returned.
    pub fn get_top(env: Env) -> Vec<LeaderboardEntry> {
        Self::load_entries(&env)
    }

    /// Column view padded to `CAPACITY` with empty sentinels.
    pub fn get_leaderboard(env: Env) -> LeaderboardView {
        let entries = Self::load_entries(&env);
        let mut players = Vec::new(&env);
        let mut scores = Vec::new(&env);
        let mut timestamps = Vec::new(&env);
        for i in 0..CAPACITY {
            match entries.get(i) {
                Some(e) => {
                    players.push_back(Some(e.player));
                    scores.push_back(e.score);
                    timestamps.push_back(e.timestamp);
                }
                None => {
                    players.push_back(None);
                    scores.push_back(0);
                    timestamps.push_back(0);
                }
            }
        }
        LeaderboardView {
            players,
            scores,
            timestamps,
        }
    }

    /// `(rank, score)` for a player, `(0, 0)` when not listed.
    pub fn get_rank(env: Env, player: Address) -> (u32, u32) {
        let entries = Self::load_entries(&env);
        match Self::position_of(&entries, &player) {
            Some(idx) => (idx + 1, entries.get_unchecked(idx).score),
            None => (0, 0),
        }
    }

    pub fn total_entries(env: Env) -> u32 {
        Self::load_entries(&env).len()
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    fn load_admin(env: &Env) -> Address {
        match env.storage().instance().get(&DataKey::Admin) {
            Some(admin) => admin,
            None => panic_with_error!(env, LeaderboardError::AdminNotSet),
        }
    }

    fn load_entries(env: &Env) -> Vec<LeaderboardEntry> {
        env.storage()
            .instance()
            .get(&DataKey::Entries)
            .unwrap_or(Vec::new(env))
    }

    fn position_of(entries: &Vec<LeaderboardEntry>, player: &Address) -> Option<u32> {
        for i in 0..entries.len() {
            if entries.get_unchecked(i).player == *player {
                return Some(i);
            }
        }
        None
    }

    /// First index whose entry ranks strictly below `entry`.
    fn insertion_point(entries: &Vec<LeaderboardEntry>, entry: &LeaderboardEntry) -> u32 {
        for i in 0..entries.len() {
            let other = entries.get_unchecked(i);
            if Self::outranks(entry, &other) {
                return i;
            }
        }
        entries.len()
    }

    fn outranks(a: &LeaderboardEntry, b: &LeaderboardEntry) -> bool {
        a.score > b.score || (a.score == b.score && a.timestamp < b.timestamp)
    }
}

#[cfg(test)]
mod test;
