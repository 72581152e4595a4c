//! SHA256 checksums of migration SQL

use sha2::{Digest, Sha256};

/// Lower-case hex SHA256 of `content`
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
