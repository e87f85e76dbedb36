use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use banking_rs::{Amount, create_account, create_account_type, create_user, deposit, initialize_db};

/// A utility for creating a test database for the REST API server of banking_rs.
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
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating account types...");
    let savings = create_account_type("Savings", 12, &conn)?;
    let term_deposit = create_account_type("Term Deposit", 4, &conn)?;

    println!("Creating test customers...");
    let now = OffsetDateTime::now_utc();

    for (email, account_type, opening_deposit) in [
        ("alice@example.com", &savings, Decimal::new(500, 0)),
        ("bob@example.com", &term_deposit, Decimal::new(100, 0)),
    ] {
        let user = create_user(email, &conn)?;
        create_account(user.id, account_type, &conn)?;
        let account = deposit(user.id, Amount::new(opening_deposit)?, now, &conn)?;
        println!("  {email}: {} account with ${}", account_type.name, account.balance);
    }

    println!("Success!");

    Ok(())
}
