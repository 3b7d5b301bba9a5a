use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use uuid::Uuid;

mod common;

#[test]
fn test_cli_transfer_checkout_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let world = dir.path().join("world.json");
    let cart = dir.path().join("cart.csv");
    let seller = Uuid::new_v4();
    let buyer = Uuid::new_v4();

    common::write_world(&world, seller, buyer, 100, 0)?;
    common::write_cart(&cart, seller, "35000", 2)?;

    let mut cmd = Command::new(cargo_bin!("lapak-checkout"));
    cmd.arg(&cart)
        .arg("--world")
        .arg(&world)
        .arg("--buyer")
        .arg(buyer.to_string())
        .arg("--method")
        .arg("transfer")
        .arg("--delivery-type")
        .arg("pickup")
        .arg("--name")
        .arg("Rina Wati")
        .arg("--phone")
        .arg("081234567890");

    cmd.assert()
        .success()
        // Both cart lines share one seller, so a single order is created.
        .stdout(predicate::str::contains("method=transfer"))
        .stdout(predicate::str::contains("status=PENDING_PAYMENT"))
        .stdout(predicate::str::contains("subtotal=70000"))
        // Pickup ships for free.
        .stdout(predicate::str::contains("shipping=0"))
        .stdout(predicate::str::contains("total=70000"))
        .stdout(predicate::str::contains("redirect: /payment/confirm?orders="))
        .stdout(predicate::str::contains("cart cleared"));

    Ok(())
}

#[test]
fn test_cli_rejects_seller_out_of_quota() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let world = dir.path().join("world.json");
    let cart = dir.path().join("cart.csv");
    let seller = Uuid::new_v4();
    let buyer = Uuid::new_v4();

    common::write_world(&world, seller, buyer, 10, 10)?;
    common::write_cart(&cart, seller, "35000", 1)?;

    let mut cmd = Command::new(cargo_bin!("lapak-checkout"));
    cmd.arg(&cart)
        .arg("--world")
        .arg(&world)
        .arg("--buyer")
        .arg(buyer.to_string())
        .arg("--method")
        .arg("transfer")
        .arg("--delivery-type")
        .arg("pickup")
        .arg("--name")
        .arg("Rina Wati")
        .arg("--phone")
        .arg("081234567890");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Checkout is currently unavailable"))
        .stderr(predicate::str::contains("out of transaction quota"));

    Ok(())
}

#[test]
fn test_cli_cod_delivery_requires_map_point() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let world = dir.path().join("world.json");
    let cart = dir.path().join("cart.csv");
    let seller = Uuid::new_v4();
    let buyer = Uuid::new_v4();

    common::write_world(&world, seller, buyer, 100, 0)?;
    common::write_cart(&cart, seller, "35000", 1)?;

    // Delivery with an address but no coordinates must be rejected before
    // any order is written.
    let mut cmd = Command::new(cargo_bin!("lapak-checkout"));
    cmd.arg(&cart)
        .arg("--world")
        .arg(&world)
        .arg("--buyer")
        .arg(buyer.to_string())
        .arg("--method")
        .arg("cod")
        .arg("--delivery-type")
        .arg("delivery")
        .arg("--name")
        .arg("Rina Wati")
        .arg("--phone")
        .arg("081234567890")
        .arg("--province")
        .arg("Jawa Tengah")
        .arg("--city")
        .arg("Semarang")
        .arg("--district")
        .arg("Tembalang")
        .arg("--village")
        .arg("Bulusan");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Please check your input"));

    Ok(())
}
