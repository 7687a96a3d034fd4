//! # Seed Data Generator
//!
//! Populates the database with demo products and clients for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database (./mostrador_dev.db)
//! cargo run -p mostrador-db --bin seed
//!
//! # Specify database path and opening float
//! cargo run -p mostrador-db --bin seed -- --db ./data/mostrador.db --open-session 50000
//! ```
//!
//! ## Generated Data
//! - A small grocery catalogue with prices and stock
//! - Clients with and without store credit
//! - Optionally, an open cash session for today

use chrono::Utc;
use mostrador_core::{Money, NewClient};
use mostrador_db::{Database, DbConfig};
use std::env;
use tracing_subscriber::EnvFilter;

/// (name, price in cents, stock)
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Yerba Mate 1kg", 4_500, 40),
    ("Harina 000 1kg", 1_200, 60),
    ("Azucar 1kg", 1_350, 50),
    ("Aceite Girasol 1.5L", 3_900, 24),
    ("Leche Entera 1L", 1_100, 48),
    ("Fideos Spaghetti 500g", 950, 80),
    ("Arroz Largo Fino 1kg", 1_600, 45),
    ("Cafe Molido 250g", 3_200, 20),
    ("Galletitas Dulces 300g", 1_450, 36),
    ("Gaseosa Cola 2.25L", 2_700, 30),
    ("Agua Mineral 2L", 900, 60),
    ("Pan Lactal", 2_100, 15),
    ("Dulce de Leche 400g", 2_300, 25),
    ("Queso Cremoso 1kg", 8_900, 10),
    ("Detergente 750ml", 1_800, 22),
];

/// (name, phone, address, credit limit in cents)
const CLIENTS: &[(&str, &str, &str, i64)] = &[
    ("Marta Gomez", "555-0101", "Av. San Martin 1450", 50_000),
    ("Luis Fernandez", "555-0102", "Belgrano 233", 20_000),
    ("Rosa Diaz", "555-0103", "Mitre 780, Dpto 4", 100_000),
    ("Jorge Alvarez", "555-0104", "Sarmiento 55", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mostrador_db=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./mostrador_dev.db");
    let mut opening_float: Option<i64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--open-session" | "-o" => {
                if i + 1 < args.len() {
                    opening_float = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mostrador Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>            Database file path (default: ./mostrador_dev.db)");
                println!("  -o, --open-session <CENTS> Open a cash session for today with this float");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Mostrador Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Inserting products...");
    for (name, price_cents, stock) in PRODUCTS {
        let product = db
            .products()
            .insert(name, Money::from_cents(*price_cents), *stock)
            .await?;
        println!("  {:<28} {:>10}  stock {:>3}  {}", product.name, product.price(), product.stock, product.id);
    }

    println!();
    println!("Inserting clients...");
    for (name, phone, address, limit) in CLIENTS {
        let client = db
            .clients()
            .insert(&NewClient {
                name: name.to_string(),
                phone: phone.to_string(),
                email: String::new(),
                address: address.to_string(),
                credit_limit_cents: *limit,
            })
            .await?;
        println!("  {:<28} limit {:>10}  {}", client.name, client.credit_limit(), client.id);
    }

    if let Some(float) = opening_float {
        let session = db
            .cash_sessions()
            .open(Utc::now().date_naive(), Money::from_cents(float), "seed")
            .await?;
        println!();
        println!("✓ Opened cash session {} with {}", session.id, session.opening_balance());
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
