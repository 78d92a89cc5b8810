//! Record identifiers

use uuid::Uuid;

/// Length of every generated identifier
pub const ID_LEN: usize = 32;

/// Generate a random identifier: 32 lowercase hex characters.
///
/// Backed by a v4 UUID, so 122 of the 128 bits come from the OS random
/// source.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
