//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::crypto::seal::IdentityKeyPair;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the vaults whose key is stored at `location`.
pub fn print_vault_keys_table(vault_ids: &[String], location: &str) {
    if vault_ids.is_empty() {
        info("No vault keys stored on this device.");
        tip("Run `legacyvault encrypt --vault <ID> <FILE>` or `legacyvault recover --vault <ID>`.");
        return;
    }

    info(&format!("Key store: {location}"));

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Vault"]);

    for (i, id) in vault_ids.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), id.clone()]);
    }

    println!("{table}");
}

/// Print the public half of an identity.
pub fn print_identity(user: Option<&str>, identity: &IdentityKeyPair) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if let Some(user) = user {
        table.add_row(vec!["User".to_string(), user.to_string()]);
    }
    table.add_row(vec!["Public key".to_string(), identity.public_text()]);
    table.add_row(vec!["Fingerprint".to_string(), identity.fingerprint()]);
    println!("{table}");
}
