//! Integration test: key material and default-key state across reopen.

use credence_crypto::KeyPair;
use credence_engine::Engine;
use credence_integration_tests::temp_engine_config;

#[test]
fn test_generated_default_key_survives_reopen() {
    let (config, dir) = temp_engine_config();

    let public = {
        let engine = Engine::open(config.clone()).unwrap();
        engine.default_key().unwrap()
    };

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.default_key().unwrap(), public);
    assert_eq!(engine.list_keys().len(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_imported_key_signs_after_reopen() {
    let (config, dir) = temp_engine_config();
    let seed = [11u8; 32];
    let expected_public = KeyPair::from_seed(&seed).public_key().to_bs58();

    {
        let engine = Engine::open(config.clone()).unwrap();
        let public = engine.import_key(&seed).unwrap();
        assert_eq!(public, expected_public);
        engine.set_default_key(&public).unwrap();
    }

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.default_key().unwrap(), expected_public);

    // A packet saved now is signed by the restored key.
    let hash = engine
        .save_review(
            credence_core::Identifier::new("email", "a@x"),
            credence_core::Identifier::new("email", "b@x"),
            None,
            1,
            false,
        )
        .unwrap();
    let packet = engine.get_packet(&hash).unwrap();
    assert_eq!(packet.signatures[0].signer, expected_public);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_packets_and_cache_survive_reopen() {
    let (config, dir) = temp_engine_config();
    let email = |v: &str| credence_core::Identifier::new("email", v);

    let (h1, h2) = {
        let engine = Engine::open(config.clone()).unwrap();
        let h1 = engine.save_review(email("a@x"), email("b@x"), None, 1, true).unwrap();
        let h2 = engine.save_review(email("b@x"), email("c@x"), None, 1, true).unwrap();
        engine.saved_path(&email("a@x"), &email("c@x"), None).unwrap();
        (h1, h2)
    };

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.packet_count().unwrap(), 2);
    let path = engine.saved_path(&email("a@x"), &email("c@x"), None).unwrap();
    let hashes: Vec<_> = path.iter().map(|p| p.hash().unwrap()).collect();
    assert_eq!(hashes, vec![h1, h2]);

    std::fs::remove_dir_all(&dir).ok();
}
