//! Random opaque identifiers for object names and saved files.
//!
//! Identifiers are drawn character-by-character from the 62-symbol
//! alphanumeric alphabet. They are not meant to be secret; they only need
//! to make name collisions in the shared content bucket vanishingly rare.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Default identifier length for uploaded object names.
pub const UPLOAD_ID_LENGTH: usize = 21;

/// Default identifier length for downloaded artifact filenames.
pub const DOWNLOAD_ID_LENGTH: usize = 8;

/// The alphabet every generated identifier is drawn from.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate an identifier of exactly `length` alphanumeric characters.
pub fn generate_id(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
