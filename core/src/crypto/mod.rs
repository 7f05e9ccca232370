
pub mod types;
pub mod cipher;
pub mod aead;
pub mod kdf;
pub mod nonce;

pub use types::*;
pub use cipher::*;
pub use aead::*;
pub use kdf::*;
pub use nonce::*;
