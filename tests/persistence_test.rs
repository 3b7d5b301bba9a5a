#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use uuid::Uuid;

mod common;

fn run(cart: &std::path::Path, world: &std::path::Path, buyer: Uuid, db: &std::path::Path) -> std::process::Output {
    Command::new(cargo_bin!("lapak-checkout"))
        .arg(cart)
        .arg("--world")
        .arg(world)
        .arg("--buyer")
        .arg(buyer.to_string())
        .arg("--method")
        .arg("transfer")
        .arg("--delivery-type")
        .arg("pickup")
        .arg("--name")
        .arg("Rina Wati")
        .arg("--phone")
        .arg("081234567890")
        .arg("--db-path")
        .arg(db)
        .output()
        .expect("failed to run binary")
}

/// Re-running the same cart against the same database must reuse the order
/// committed in the first run, not create a duplicate.
#[test]
fn test_identical_cart_is_idempotent_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let world = dir.path().join("world.json");
    let cart = dir.path().join("cart.csv");
    let db = dir.path().join("db");
    let seller = Uuid::new_v4();
    let buyer = Uuid::new_v4();
    common::write_world(&world, seller, buyer, 100, 0).unwrap();
    common::write_cart(&cart, seller, "45000", 1).unwrap();

    let first = run(&cart, &world, buyer, &db);
    let second = run(&cart, &world, buyer, &db);

    assert!(first.status.success());
    assert!(second.status.success());
    // Same order id, same redirect, same totals.
    assert_eq!(first.stdout, second.stdout);

    let stdout = String::from_utf8(first.stdout).unwrap();
    assert!(stdout.contains("status=PENDING_PAYMENT"));
    assert!(stdout.contains("total=45000"));
}
