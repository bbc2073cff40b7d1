//! Integration test: trust path queries end to end.
//!
//! Builds small attestation graphs through the engine and exercises
//! fresh search, the persisted path cache, single-step lookups, and
//! identifier resolution together.

use credence_core::{Identifier, PacketHash};
use credence_engine::{Engine, EngineError};
use credence_graph::GraphError;
use credence_integration_tests::temp_engine_config;

fn email(v: &str) -> Identifier {
    Identifier::new("email", v)
}

fn key(v: &str) -> Identifier {
    Identifier::new("keyID", v)
}

fn hashes_of(packets: &[credence_core::Packet]) -> Vec<PacketHash> {
    packets.iter().map(|p| p.hash().unwrap()).collect()
}

// =========================================================================
// Search
// =========================================================================

#[test]
fn test_two_packet_chain_in_order() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let a = engine
        .save_review(email("a@x"), email("b@x"), None, 5, true)
        .unwrap();
    let b = engine
        .save_review(email("b@x"), key("k1"), None, 5, true)
        .unwrap();

    let path = engine.find_path(&email("a@x"), &key("k1"), Some(3)).unwrap();
    assert_eq!(hashes_of(&path), vec![a, b]);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_search_is_deterministic_across_parallel_routes() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    // Two disjoint two-hop routes from a@x to d@x.
    engine
        .save_review(email("a@x"), email("b@x"), None, 2, true)
        .unwrap();
    engine
        .save_review(email("b@x"), email("d@x"), None, 2, true)
        .unwrap();
    engine
        .save_review(email("a@x"), email("c@x"), None, 9, true)
        .unwrap();
    engine
        .save_review(email("c@x"), email("d@x"), None, 9, true)
        .unwrap();

    let first = hashes_of(&engine.find_path(&email("a@x"), &email("d@x"), None).unwrap());
    for _ in 0..5 {
        let again = hashes_of(&engine.find_path(&email("a@x"), &email("d@x"), None).unwrap());
        assert_eq!(again, first);
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_depth_bounds() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("a@x"), email("b@x"), None, 1, true)
        .unwrap();

    // Depth zero only succeeds for identical endpoints.
    assert!(engine
        .find_path(&email("a@x"), &email("a@x"), Some(0))
        .unwrap()
        .is_empty());
    assert!(matches!(
        engine.find_path(&email("a@x"), &email("b@x"), Some(0)),
        Err(EngineError::Graph(GraphError::NotFound))
    ));
    assert!(matches!(
        engine.find_path(&email("a@x"), &email("b@x"), Some(17)),
        Err(EngineError::Graph(GraphError::InvalidDepth(17)))
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_unpublished_packets_never_form_paths() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("a@x"), email("b@x"), None, 1, false)
        .unwrap();

    assert!(engine.find_path(&email("a@x"), &email("b@x"), None).is_err());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_trust_step_prefers_higher_rating() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("a@x"), email("b@x"), None, 1, true)
        .unwrap();
    let strong = engine
        .save_review(email("a@x"), email("b@x"), Some("vouch".into()), 9, true)
        .unwrap();

    assert_eq!(
        engine.trust_step(&email("a@x"), &email("b@x")).unwrap(),
        strong
    );

    std::fs::remove_dir_all(&dir).ok();
}

// =========================================================================
// Path cache coherence
// =========================================================================

#[test]
fn test_saved_path_survives_unrelated_writes() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("a@x"), email("b@x"), None, 1, true)
        .unwrap();
    engine
        .save_review(email("b@x"), key("k1"), None, 1, true)
        .unwrap();

    let cached = engine.saved_path(&email("a@x"), &key("k1"), None).unwrap();
    assert_eq!(cached.len(), 2);

    // A packet touching none of the chain's identifiers leaves the
    // cached entry usable.
    engine
        .save_review(email("p@x"), email("q@x"), None, 1, true)
        .unwrap();
    let again = engine.saved_path(&email("a@x"), &key("k1"), None).unwrap();
    assert_eq!(hashes_of(&again), hashes_of(&cached));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_saved_path_never_serves_removed_packet() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let middle = engine
        .save_review(email("a@x"), email("b@x"), None, 1, true)
        .unwrap();
    engine
        .save_review(email("b@x"), key("k1"), None, 1, true)
        .unwrap();
    engine.saved_path(&email("a@x"), &key("k1"), None).unwrap();

    engine.remove_packet(&middle).unwrap();

    // The chain is broken; the stale entry must not come back.
    assert!(engine.saved_path(&email("a@x"), &key("k1"), None).is_err());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_saved_path_recomputes_after_better_route_appears() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("a@x"), email("b@x"), None, 1, true)
        .unwrap();
    engine
        .save_review(email("b@x"), email("c@x"), None, 1, true)
        .unwrap();
    let indirect = engine.saved_path(&email("a@x"), &email("c@x"), None).unwrap();
    assert_eq!(indirect.len(), 2);

    // A direct attestation invalidates the cached two-hop chain.
    let direct = engine
        .save_review(email("a@x"), email("c@x"), None, 9, true)
        .unwrap();
    let refreshed = engine.saved_path(&email("a@x"), &email("c@x"), None).unwrap();
    assert_eq!(hashes_of(&refreshed), vec![direct]);

    std::fs::remove_dir_all(&dir).ok();
}

// =========================================================================
// Identifier resolution
// =========================================================================

#[test]
fn test_resolver_follows_connections() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_connection(key("signer"), key("k1"), email("alice@x"), true)
        .unwrap();
    engine
        .save_connection(key("signer"), key("k1"), Identifier::new("nickname", "alice"), true)
        .unwrap();

    // Candidate order wins over discovery order.
    let found = engine
        .resolve_identifier(&key("k1"), &["email", "nickname"])
        .unwrap();
    assert_eq!(found, Some(email("alice@x")));

    let found = engine
        .resolve_identifier(&key("k1"), &["nickname", "email"])
        .unwrap();
    assert_eq!(found, Some(Identifier::new("nickname", "alice")));

    let none = engine.resolve_identifier(&key("k1"), &["phone"]).unwrap();
    assert!(none.is_none());

    std::fs::remove_dir_all(&dir).ok();
}
