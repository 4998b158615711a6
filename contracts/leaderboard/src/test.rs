#![cfg(test)]

use crate::{Leaderboard, LeaderboardClient, LeaderboardEntry, CAPACITY};
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{Address, Env, Vec};

// ════════════════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════════════════

fn setup() -> (Env, LeaderboardClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    env.ledger().set(soroban_sdk::testutils::LedgerInfo {
        timestamp: 1_700_000_000,
        protocol_version: 25,
        sequence_number: 100,
        network_id: Default::default(),
        base_reserve: 10,
        min_temp_entry_ttl: u32::MAX / 2,
        min_persistent_entry_ttl: u32::MAX / 2,
        max_entry_ttl: u32::MAX / 2,
    });

    let admin = Address::generate(&env);
    let contract_id = env.register(Leaderboard, (&admin,));
    let client = LeaderboardClient::new(&env, &contract_id);

    (env, client, admin)
}

/// Table must be sorted by (score desc, timestamp asc) with unique players.
fn assert_well_formed(entries: &Vec<LeaderboardEntry>) {
    assert!(entries.len() <= CAPACITY);
    for i in 1..entries.len() {
        let prev = entries.get(i - 1).unwrap();
        let cur = entries.get(i).unwrap();
        assert!(
            prev.score > cur.score || (prev.score == cur.score && prev.timestamp <= cur.timestamp),
            "entries out of order at {}",
            i
        );
        for j in 0..i {
            assert_ne!(entries.get(j).unwrap().player, cur.player, "duplicate player");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
//  Initialization
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_init_empty() {
    let (env, client, _admin) = setup();
    assert_eq!(client.total_entries(), 0);
    assert_eq!(client.get_top().len(), 0);

    let view = client.get_leaderboard();
    assert_eq!(view.players.len(), CAPACITY);
    assert_eq!(view.scores.len(), CAPACITY);
    assert_eq!(view.timestamps.len(), CAPACITY);
    for i in 0..CAPACITY {
        assert_eq!(view.players.get(i).unwrap(), None);
        assert_eq!(view.scores.get(i).unwrap(), 0);
        assert_eq!(view.timestamps.get(i).unwrap(), 0);
    }

    let nobody = Address::generate(&env);
    assert_eq!(client.get_rank(&nobody), (0, 0));
}

// ════════════════════════════════════════════════════════════════════════════
//  Qualify: insertion and ordering
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_qualify_inserts_and_ranks() {
    let (env, client, admin) = setup();
    let p1 = Address::generate(&env);
    let p2 = Address::generate(&env);
    let p3 = Address::generate(&env);

    assert_eq!(client.qualify(&admin, &p1, &40, &100), 1);
    assert_eq!(client.qualify(&admin, &p2, &60, &101), 1);
    assert_eq!(client.qualify(&admin, &p3, &50, &102), 2);

    let top = client.get_top();
    assert_eq!(top.len(), 3);
    assert_eq!(top.get(0).unwrap().player, p2);
    assert_eq!(top.get(1).unwrap().player, p3);
    assert_eq!(top.get(2).unwrap().player, p1);

    assert_eq!(client.get_rank(&p2), (1, 60));
    assert_eq!(client.get_rank(&p3), (2, 50));
    assert_eq!(client.get_rank(&p1), (3, 40));
}

#[test]
fn test_tie_goes_to_earlier_timestamp() {
    let (env, client, admin) = setup();
    let early = Address::generate(&env);
    let late = Address::generate(&env);

    // Reported out of order: the later achiever arrives first
    client.qualify(&admin, &late, &55, &2_000);
    client.qualify(&admin, &early, &55, &1_000);

    let top = client.get_top();
    assert_eq!(top.get(0).unwrap().player, early);
    assert_eq!(top.get(1).unwrap().player, late);
}

#[test]
fn test_identical_keys_keep_first_reporter_ahead() {
    let (env, client, admin) = setup();
    let first = Address::generate(&env);
    let second = Address::generate(&env);

    client.qualify(&admin, &first, &50, &1_000);
    assert_eq!(client.qualify(&admin, &second, &50, &1_000), 2);
    assert_eq!(client.get_rank(&first), (1, 50));
}

#[test]
fn test_zero_score_never_qualifies() {
    let (env, client, admin) = setup();
    let p = Address::generate(&env);

    assert_eq!(client.qualify(&admin, &p, &0, &100), 0);
    assert_eq!(client.total_entries(), 0);
    assert_eq!(client.get_rank(&p), (0, 0));
}

// ════════════════════════════════════════════════════════════════════════════
//  Qualify: per-player replacement
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_higher_score_replaces_existing_entry() {
    let (env, client, admin) = setup();
    let p = Address::generate(&env);
    let other = Address::generate(&env);

    client.qualify(&admin, &p, &30, &100);
    client.qualify(&admin, &other, &45, &101);
    assert_eq!(client.get_rank(&p), (2, 30));

    assert_eq!(client.qualify(&admin, &p, &58, &200), 1);
    assert_eq!(client.total_entries(), 2);

    let top = client.get_top();
    let entry = top.get(0).unwrap();
    assert_eq!(entry.player, p);
    assert_eq!(entry.score, 58);
    assert_eq!(entry.timestamp, 200);
}

#[test]
fn test_lower_or_equal_score_is_ignored() {
    let (env, client, admin) = setup();
    let p = Address::generate(&env);

    client.qualify(&admin, &p, &50, &100);
    assert_eq!(client.qualify(&admin, &p, &40, &200), 0);
    assert_eq!(client.qualify(&admin, &p, &50, &50), 0);

    let top = client.get_top();
    assert_eq!(top.len(), 1);
    let entry = top.get(0).unwrap();
    assert_eq!(entry.score, 50);
    assert_eq!(entry.timestamp, 100);
}

// ════════════════════════════════════════════════════════════════════════════
//  Capacity & eviction
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_table_evicts_lowest() {
    let (env, client, admin) = setup();

    let mut first_ten: Vec<Address> = Vec::new(&env);
    for i in 0..CAPACITY {
        let p = Address::generate(&env);
        client.qualify(&admin, &p, &(10 + i), &(100 + i as u64));
        first_ten.push_back(p);
    }
    assert_eq!(client.total_entries(), CAPACITY);

    // Lowest entry holds score 10
    let lowest = first_ten.get(0).unwrap();
    assert_eq!(client.get_rank(&lowest), (CAPACITY, 10));

    // Equal to the 10th score: not enough
    let tie = Address::generate(&env);
    assert_eq!(client.qualify(&admin, &tie, &10, &1), 0);
    assert_eq!(client.get_rank(&tie), (0, 0));

    // Strictly better: evicts the lowest
    let newcomer = Address::generate(&env);
    assert_eq!(client.qualify(&admin, &newcomer, &11, &500), CAPACITY);
    assert_eq!(client.total_entries(), CAPACITY);
    assert_eq!(client.get_rank(&lowest), (0, 0));

    assert_well_formed(&client.get_top());
}

#[test]
fn test_listed_player_improving_in_full_table_does_not_evict() {
    let (env, client, admin) = setup();

    let mut players: Vec<Address> = Vec::new(&env);
    for i in 0..CAPACITY {
        let p = Address::generate(&env);
        client.qualify(&admin, &p, &(20 + i), &(100 + i as u64));
        players.push_back(p);
    }

    let bottom = players.get(0).unwrap();
    let second_bottom = players.get(1).unwrap();
    assert_eq!(client.qualify(&admin, &bottom, &99, &300), 1);
    assert_eq!(client.total_entries(), CAPACITY);
    assert_eq!(client.get_rank(&second_bottom), (CAPACITY, 21));
}

#[test]
fn test_view_matches_top_order() {
    let (env, client, admin) = setup();
    let p1 = Address::generate(&env);
    let p2 = Address::generate(&env);

    client.qualify(&admin, &p1, &33, &100);
    client.qualify(&admin, &p2, &44, &150);

    let view = client.get_leaderboard();
    assert_eq!(view.players.get(0).unwrap(), Some(p2.clone()));
    assert_eq!(view.scores.get(0).unwrap(), 44);
    assert_eq!(view.timestamps.get(0).unwrap(), 150);
    assert_eq!(view.players.get(1).unwrap(), Some(p1.clone()));
    assert_eq!(view.scores.get(1).unwrap(), 33);
    assert_eq!(view.players.get(2).unwrap(), None);
    assert_eq!(view.scores.get(2).unwrap(), 0);
}

// ════════════════════════════════════════════════════════════════════════════
//  Invariants under a long mixed sequence
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_sequence_keeps_order_uniqueness_and_monotonic_scores() {
    let (env, client, admin) = setup();

    let mut pool: Vec<Address> = Vec::new(&env);
    for _ in 0..14 {
        pool.push_back(Address::generate(&env));
    }

    // Deterministic pseudo-random score stream
    let mut x: u32 = 7;
    for step in 0..120u32 {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let who = pool.get((x >> 8) % pool.len()).unwrap();
        let score = (x >> 16) % 61;

        let (_, before) = client.get_rank(&who);
        client.qualify(&admin, &who, &score, &(1_000 + step as u64));
        let (rank_after, after) = client.get_rank(&who);

        if before > 0 {
            assert!(rank_after > 0, "listed player must not be evicted by own report");
            assert!(after >= before, "stored score must never decrease");
        }

        let top = client.get_top();
        assert_well_formed(&top);

        // Rank lookup agrees with position for every listed player
        for i in 0..top.len() {
            let e = top.get(i).unwrap();
            assert_eq!(client.get_rank(&e.player), (i + 1, e.score));
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
//  Authorization
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_authorized_game_can_report() {
    let (env, client, admin) = setup();
    let game_contract = Address::generate(&env);
    let p = Address::generate(&env);

    client.authorize_game(&admin, &game_contract);
    assert_eq!(client.qualify(&game_contract, &p, &42, &100), 1);
    assert_eq!(client.get_rank(&p), (1, 42));
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")] // NotAuthorized
fn test_unauthorized_caller_rejected() {
    let (env, client, _admin) = setup();
    let rando = Address::generate(&env);
    let p = Address::generate(&env);

    client.qualify(&rando, &p, &42, &100);
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")] // NotAdmin
fn test_non_admin_cannot_authorize() {
    let (env, client, _admin) = setup();
    let rando = Address::generate(&env);
    let game = Address::generate(&env);

    client.authorize_game(&rando, &game);
}
