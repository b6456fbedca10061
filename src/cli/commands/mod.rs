pub mod decrypt;
pub mod encrypt;
pub mod identity;
pub mod key;
pub mod recover;
pub mod seal;
pub mod unseal;
pub mod version;
