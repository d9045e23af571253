use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use finanzas::initialize_db;

/// A utility for creating a test database for the REST API server of finanzas.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Adding banks, concepts and payment methods...");
    conn.execute_batch(
        "INSERT INTO bank (name) VALUES ('Banco Estado'), ('BCI'), ('Santander');
        INSERT INTO concept (name, category) VALUES
            ('Water', 'Utilities'),
            ('Electricity', 'Utilities'),
            ('Rent', 'Housing'),
            ('Groceries', 'Food');
        INSERT INTO payment_method (name) VALUES ('Cash'), ('Debit card'), ('Bank transfer');",
    )?;

    println!("Adding cards and statements...");
    conn.execute_batch(
        "INSERT INTO card (name, bank, kind, credit_limit, closing_day, due_day)
        VALUES ('Visa Gold', 'BCI', 'credit', 1500000, 20, 5),
            ('Debit', 'Banco Estado', 'debit', NULL, NULL, NULL);
        INSERT INTO statement (card_id, month, year, total) VALUES
            (1, 1, 2025, 320500),
            (1, 2, 2025, 287990);",
    )?;

    println!("Adding a loan...");
    conn.execute(
        "INSERT INTO loan (name, installment_amount, total_installments, first_month, \
            first_year, due_day, bank, total_amount, amount_paid, remaining_debt)
        VALUES ('Car', 150000, 24, 1, 2025, 10, 'Santander', 3600000, 0, 3600000)",
        (),
    )?;

    println!("Adding expenses...");
    conn.execute_batch(
        "INSERT INTO expense (name, amount, month, year, paid, recurring) VALUES
            ('Rent', 450000, 1, 2025, 1, 1),
            ('Internet', 25990, 1, 2025, 1, 1),
            ('Groceries', 180000, 1, 2025, 0, 0);
        INSERT INTO expense (name, amount, month, year, card_id, installments, with_card)
        VALUES ('Laptop', 899990, 1, 2025, 1, 12, 1);",
    )?;

    println!("Success!");

    Ok(())
}
