//! `legacyvault version` — display version information.

use console::style;

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("legacyvault {current}");
    println!(
        "{}",
        style("AES-256-GCM · AES-KW · Argon2id · X25519/XSalsa20-Poly1305").dim()
    );

    #[cfg(feature = "keyring-store")]
    println!("{}", style("OS keyring backend available").dim());

    Ok(())
}
