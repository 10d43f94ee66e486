//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and a few coupons.
//!
//! ## Usage
//! ```bash
//! # Seed ./bites.db
//! cargo run -p bites-db --bin seed
//!
//! # Specify database path
//! cargo run -p bites-db --bin seed -- --db ./data/bites.db
//!
//! # Skip coupons
//! cargo run -p bites-db --bin seed -- --no-coupons
//! ```
//!
//! ## Generated Data
//! - One product per (snack, pack size): SKU `{CODE}-{SIZE}`, price grows
//!   with the pack, stock varies from 0 to 60 so out-of-stock paths can be
//!   exercised.
//! - Coupons: `WELCOME10` (10%, capped at ₹100), `FLAT50` (₹50 off orders
//!   from ₹499, 100 uses), `FESTIVE25` (25%, starts in a week).

use bites_core::coupon::NewCoupon;
use bites_core::{DiscountType, Money, Product};
use bites_db::{Database, DbConfig};
use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

/// (SKU code, name, base price in paise)
const SNACKS: &[(&str, &str, i64)] = &[
    ("RGC", "Ragi Choco Cookies", 14_900),
    ("JWP", "Jowar Puffs Peri Peri", 9_900),
    ("FXM", "Foxtail Millet Mixture", 12_900),
    ("BJB", "Bajra Protein Bar", 4_900),
    ("KDC", "Kodo Millet Chips", 8_900),
    ("LTL", "Little Millet Laddoo", 19_900),
    ("MLM", "Multi Millet Muesli", 29_900),
    ("RGN", "Ragi Nachos", 10_900),
];

/// (label, price multiplier in percent)
const PACKS: &[(&str, i64)] = &[("100G", 100), ("250G", 230), ("500G", 420)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bites.db");
    let mut with_coupons = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-coupons" => with_coupons = false,
            "--help" | "-h" => {
                println!("18 Bites Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bites.db)");
                println!("      --no-coupons   Only seed products");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("18 Bites Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut generated = 0;
    for (snack_idx, (code, name, base_price)) in SNACKS.iter().enumerate() {
        for (pack_idx, (pack, multiplier)) in PACKS.iter().enumerate() {
            let product = generate_product(
                code,
                name,
                *base_price,
                pack,
                *multiplier,
                snack_idx * PACKS.len() + pack_idx,
            );

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} products", generated);

    if with_coupons {
        let mut created = 0;
        for mut coupon in demo_coupons() {
            if let Err(e) = coupon.validate() {
                eprintln!("Skipping {}: {}", coupon.code, e);
                continue;
            }
            match db.coupons().insert(&coupon).await {
                Ok(c) => {
                    println!("  {} ({})", c.code, c.description.unwrap_or_default());
                    created += 1;
                }
                Err(e) => eprintln!("Failed to insert {}: {}", coupon.code, e),
            }
        }
        println!("✓ Created {} coupons", created);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds one catalog entry for a snack in a pack size.
fn generate_product(
    code: &str,
    name: &str,
    base_price: i64,
    pack: &str,
    multiplier: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    // price points end in .99
    let raw = base_price * multiplier / 100;
    let price = (raw / 100) * 100 - 1;

    Product {
        id: Uuid::new_v4().to_string(),
        sku: format!("{}-{}", code, pack),
        name: format!("{} {}", name, pack.to_lowercase()),
        description: Some(format!("{} made with whole millets, {} pack", name, pack)),
        price: Money::from_minor(price.max(99)),
        stock: ((seed * 13) % 61) as i64,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn demo_coupons() -> Vec<NewCoupon> {
    let now = Utc::now();
    vec![
        NewCoupon {
            code: "welcome10".to_string(),
            description: Some("10% off your first order".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 1_000,
            min_order_value: Money::zero(),
            max_discount: Some(Money::from_major(100)),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(90),
            max_uses: None,
            is_active: true,
        },
        NewCoupon {
            code: "FLAT50".to_string(),
            description: Some("₹50 off orders above ₹499".to_string()),
            discount_type: DiscountType::Flat,
            discount_value: 5_000,
            min_order_value: Money::from_major(499),
            max_discount: None,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            max_uses: Some(100),
            is_active: true,
        },
        NewCoupon {
            code: "FESTIVE25".to_string(),
            description: Some("Festive week: 25% off".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 2_500,
            min_order_value: Money::from_major(299),
            max_discount: Some(Money::from_major(250)),
            valid_from: now + Duration::days(7),
            valid_until: now + Duration::days(14),
            max_uses: Some(500),
            is_active: true,
        },
    ]
}
