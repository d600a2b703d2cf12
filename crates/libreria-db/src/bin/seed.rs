//! # Seed Data Generator
//!
//! Populates the database with a small development catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p libreria-db --bin seed
//!
//! # Specify database path
//! cargo run -p libreria-db --bin seed -- --db ./data/libreria.db
//! ```
//!
//! Creates a handful of categories, publishers, authors, and books, plus
//! two coupons (one active, one disabled) for exercising the checkout.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use libreria_core::Book;
use libreria_db::{Database, DbConfig};

const CATEGORIES: &[&str] = &["Novela", "Ensayo", "Poesía", "Infantil"];

const PUBLISHERS: &[&str] = &["Cátedra", "Anagrama", "Alfaguara", "Espasa"];

/// (title, author, isbn, price_cents, stock, category index, publisher index)
const BOOKS: &[(&str, &str, &str, i64, i64, usize, usize)] = &[
    ("La Regenta", "Leopoldo Alas Clarín", "9788437604947", 1495, 12, 0, 0),
    ("Cien años de soledad", "Gabriel García Márquez", "9788437615264", 1995, 8, 0, 0),
    ("Rayuela", "Julio Cortázar", "9788437624747", 1850, 5, 0, 0),
    ("Ficciones", "Jorge Luis Borges", "9788420633121", 1250, 20, 0, 3),
    ("La casa de los espíritus", "Isabel Allende", "9788401337468", 1675, 7, 0, 2),
    ("El laberinto de la soledad", "Octavio Paz", "9788437505756", 1395, 10, 1, 0),
    ("Contra la interpretación", "Susan Sontag", "9788433964809", 1790, 4, 1, 1),
    ("Veinte poemas de amor", "Pablo Neruda", "9788437606187", 995, 30, 2, 0),
    ("Romancero gitano", "Federico García Lorca", "9788437604168", 1095, 15, 2, 0),
    ("Platero y yo", "Juan Ramón Jiménez", "9788437601618", 895, 25, 3, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./libreria_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Librería Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./libreria_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Librería Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let mut category_ids = Vec::new();
    for name in CATEGORIES {
        category_ids.push(db.categories().insert(name).await?.id);
    }
    println!("  {} categories", category_ids.len());

    let mut publisher_ids = Vec::new();
    for name in PUBLISHERS {
        publisher_ids.push(db.publishers().insert(name).await?.id);
    }
    println!("  {} publishers", publisher_ids.len());

    let mut seeded = 0;
    for (idx, (title, author, isbn, price_cents, stock, cat, publ)) in BOOKS.iter().enumerate() {
        let author_id = db.authors().insert(author).await?.id;

        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            isbn: isbn.to_string(),
            title: title.to_string(),
            description: None,
            price_cents: *price_cents,
            stock: *stock,
            category_id: category_ids.get(*cat).cloned(),
            publisher_id: publisher_ids.get(*publ).cloned(),
            is_active: true,
            // Every third book goes on sale for variety
            on_sale: idx % 3 == 0,
            sale_discount_pct: if idx % 3 == 0 { Some(15) } else { None },
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.books().insert(&book).await {
            eprintln!("Failed to insert {}: {}", book.isbn, e);
            continue;
        }
        db.books().set_authors(&book.id, &[author_id]).await?;
        seeded += 1;
    }
    println!("  {} books", seeded);

    db.coupons().insert("VERANO10", 10, true).await?;
    db.coupons().insert("NAVIDAD25", 25, false).await?;
    println!("  2 coupons (VERANO10 active, NAVIDAD25 disabled)");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
