//! services/api/src/bin/hash_password.rs
//!
//! Prints an Argon2 hash for a password, for use as a `password_hash` entry in
//! the file named by `CREDENTIALS_PATH`.
//!
//! Usage: `hash_password <username> <password>`

use api_lib::adapters::credentials::hash_password;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(username), Some(password)) = (args.next(), args.next()) else {
        eprintln!("Usage: hash_password <username> <password>");
        std::process::exit(2);
    };

    let entry = serde_json::json!({
        "username": username,
        "password_hash": hash_password(&password)?,
    });
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
