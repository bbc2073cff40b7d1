//! Integration test: packet lifecycle through the engine.
//!
//! Exercises composing, signing, publishing, countersigning, and
//! listing packets across credence-engine, credence-crypto, and
//! credence-store together.

use credence_core::{Identifier, Packet, Side};
use credence_crypto::{sign_packet, verify_signature, KeyPair};
use credence_engine::{Engine, EngineError};
use credence_integration_tests::temp_engine_config;

fn email(v: &str) -> Identifier {
    Identifier::new("email", v)
}

// =========================================================================
// Save, sign, publish
// =========================================================================

#[test]
fn test_save_review_signs_with_default_key() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let hash = engine
        .save_review(email("a@x"), email("b@x"), Some("solid".into()), 7, false)
        .unwrap();
    let packet = engine.get_packet(&hash).unwrap();

    assert_eq!(packet.signatures.len(), 1);
    assert_eq!(
        packet.signatures[0].signer,
        engine.default_key().unwrap()
    );
    assert!(verify_signature(&packet, &packet.signatures[0]).is_ok());
    assert!(!packet.published);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_publish_requires_verifying_signature() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let draft = Packet::review(
        Side::single(email("a@x")),
        Side::single(email("b@x")),
        None,
        1,
        1_700_000_000,
    )
    .unwrap();
    let hash = engine.save_packet(draft, false, false).unwrap();

    assert!(matches!(
        engine.publish(&hash),
        Err(EngineError::NoVerifyingSignature(_))
    ));

    // After signing via the normal path, publication succeeds and the
    // published packet is handed back for relay.
    let signed = engine
        .save_review(email("a@x"), email("b@x"), None, 1, false)
        .unwrap();
    let relayed = engine.publish(&signed).unwrap();
    assert!(relayed.published);
    assert!(engine.get_packet(&signed).unwrap().published);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_countersignature_merges_without_changing_hash() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let hash = engine
        .save_review(email("a@x"), email("b@x"), None, 3, false)
        .unwrap();
    let packet = engine.get_packet(&hash).unwrap();

    let witness = KeyPair::from_seed(&[42u8; 32]);
    let sig = sign_packet(&packet, &witness).unwrap();
    engine
        .add_signature(&hash, &sig.signer, &sig.signature)
        .unwrap();

    let updated = engine.get_packet(&hash).unwrap();
    assert_eq!(updated.signatures.len(), 2);
    assert_eq!(updated.hash().unwrap(), hash);

    // Re-adding the same signature is a no-op.
    engine
        .add_signature(&hash, &sig.signer, &sig.signature)
        .unwrap();
    assert_eq!(engine.get_packet(&hash).unwrap().signatures.len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_duplicate_save_is_idempotent() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let packet = Packet::review(
        Side::single(email("a@x")),
        Side::single(email("b@x")),
        None,
        1,
        1_700_000_000,
    )
    .unwrap();
    let h1 = engine.save_packet(packet.clone(), false, false).unwrap();
    let h2 = engine.save_packet(packet, false, false).unwrap();

    assert_eq!(h1, h2);
    assert_eq!(engine.packet_count().unwrap(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_remove_is_idempotent_and_cleans_up() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    let hash = engine
        .save_review(email("a@x"), email("b@x"), None, 1, false)
        .unwrap();
    engine.remove_packet(&hash).unwrap();
    engine.remove_packet(&hash).unwrap();

    assert!(matches!(
        engine.get_packet(&hash),
        Err(EngineError::Store(credence_store::StoreError::NotFound(_)))
    ));
    assert_eq!(engine.packet_count().unwrap(), 0);
    assert_eq!(engine.identifier_count().unwrap(), 0);

    std::fs::remove_dir_all(&dir).ok();
}

// =========================================================================
// Listings
// =========================================================================

#[test]
fn test_listings_across_indices() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("a@x"), email("b@x"), None, 1, false)
        .unwrap();
    engine
        .save_review(email("a@x"), email("c@x"), None, 2, false)
        .unwrap();
    engine
        .save_review(email("c@x"), email("b@x"), None, 3, false)
        .unwrap();

    assert_eq!(engine.packets_by_author(&email("a@x"), 10, 0).unwrap().len(), 2);
    assert_eq!(
        engine
            .packets_by_recipient(&email("b@x"), 10, 0)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(engine.latest_packets(2, 0).unwrap().len(), 2);
    assert_eq!(engine.packets_after(0, 10).unwrap().len(), 3);
    assert_eq!(engine.packet_count().unwrap(), 3);

    // Zero limits are rejected, not silently unbounded.
    assert!(engine.latest_packets(0, 0).is_err());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_text_search_spans_all_stored_identifiers() {
    let (config, dir) = temp_engine_config();
    let engine = Engine::open(config).unwrap();

    engine
        .save_review(email("alice@example.com"), email("bob@example.com"), None, 1, false)
        .unwrap();
    engine
        .save_connection(
            Identifier::new("keyID", "signer"),
            email("alice@example.com"),
            Identifier::new("nickname", "alice"),
            true,
        )
        .unwrap();

    let hits = engine.search_identifiers("alice", None, 10, 0).unwrap();
    assert_eq!(hits.len(), 2);

    let hits = engine
        .search_identifiers("alice", Some("nickname"), 10, 0)
        .unwrap();
    assert_eq!(hits, vec![Identifier::new("nickname", "alice")]);

    std::fs::remove_dir_all(&dir).ok();
}
