//! Integration tests for the keystore workflow
//!
//! These tests drive the public API end to end:
//! - Registry creation, import and unlock across reloads
//! - Signing with an unlocked secret and recovering the sender
//! - Envelope protection of an exported record

use keyvault_crypto::{
    decode_raw, AccountLabel, CipherEnvelope, ExposeSecret, FixedPassword, KdfConfig, NoPassword,
    Registry, RegistryError, RegistryOptions, SecretRecord, TransactionSigner,
    TransactionSkeleton,
};
use tempfile::TempDir;

const K1: [u8; 32] = [0x11; 32];

fn options(dir: &TempDir) -> RegistryOptions {
    RegistryOptions::new(dir.path().join("registry.json"), dir.path().join("secrets"))
        .with_kdf(KdfConfig::LIGHT_SCRYPT)
}

/// Import -> reload -> unlock with wrong and right passwords
#[test]
fn test_unlock_after_reload() {
    let dir = TempDir::new().expect("failed to create temp dir");

    let address = {
        let registry = Registry::create(options(&dir), "abc123").unwrap();
        let id = registry
            .import(&K1, AccountLabel::from("Alice"), "alicepw", "pet name")
            .unwrap();
        registry.address(&id).unwrap()
    };

    // Fresh process: nothing cached except the master
    let registry = Registry::load(options(&dir), "abc123").unwrap();
    assert_eq!(registry.label(&address).unwrap().display_name(), "Alice");
    assert_eq!(registry.password_hint(&address).unwrap(), "pet name");

    let wrong = registry.secret(address.into(), &FixedPassword::new("wrongpw"), true);
    assert!(matches!(wrong, Err(RegistryError::InvalidPassword)));

    let secret = registry
        .secret(address.into(), &FixedPassword::new("alicepw"), true)
        .unwrap();
    assert_eq!(secret.expose_secret().as_slice(), &K1);

    // Now cached: no provider needed
    let again = registry.secret(address.into(), &NoPassword, true).unwrap();
    assert_eq!(again.expose_secret().as_slice(), &K1);
}

/// Unlock -> build -> sign -> decode
#[test]
fn test_sign_with_registry_secret() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let registry = Registry::create(options(&dir), "abc123").unwrap();
    let id = registry
        .import(&K1, AccountLabel::from("Alice"), "alicepw", "")
        .unwrap();
    let address = registry.address(&id).unwrap();

    let secret = registry
        .secret(id.into(), &|| Some("alicepw".to_string()), false)
        .unwrap();

    let skeleton = TransactionSkeleton::build(
        "0xabcabcabcabcabcabcabcabcabcabcabcabcabca",
        "1000000000000000000",
        "21000",
        "225",
        "5",
        "",
    )
    .unwrap()
    .with_from(address);

    let signed = TransactionSigner::default().sign(&skeleton, &secret).unwrap();
    let decoded = decode_raw(&signed.raw).unwrap();

    assert_eq!(signed.from, address);
    assert_eq!(decoded.skeleton.from, Some(address));
    assert_eq!(decoded.hash, signed.hash);
}

/// A record exported through an envelope can be re-imported elsewhere
#[test]
fn test_envelope_protected_backup() {
    let source = TempDir::new().expect("failed to create temp dir");
    let target = TempDir::new().expect("failed to create temp dir");

    let registry = Registry::create(options(&source), "abc123").unwrap();
    let id = registry
        .import(&K1, AccountLabel::from("Alice"), "alicepw", "")
        .unwrap();
    let record = registry.store().load(&id).unwrap();

    let envelope = CipherEnvelope::default();
    let exported = source.path().join("alice.json");
    let backup = source.path().join("alice.backup");
    let restored_path = target.path().join("alice.json");
    std::fs::write(&exported, record.to_json().unwrap()).unwrap();

    envelope
        .encrypt_file(&exported, &backup, "backup-pw", &[])
        .unwrap();
    envelope
        .decrypt_file(&backup, &restored_path, "backup-pw", &[])
        .unwrap();

    let restored = SecretRecord::load(&restored_path).unwrap();
    assert_eq!(restored.id(), id);

    let other = Registry::create(options(&target), "other-master").unwrap();
    let address = other
        .import_existing(&restored, AccountLabel::from("Alice"), Some("alicepw"), "")
        .unwrap();
    assert_eq!(address, registry.address(&id).unwrap());

    let secret = other.secret(address.into(), &NoPassword, true).unwrap();
    assert_eq!(secret.expose_secret().as_slice(), &K1);
}
