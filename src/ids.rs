use std::collections::HashSet;

use uuid::Uuid;

/// Flickr base58 alphabet, as used by short-uuid style tokens.
const ALPHABET: &[u8; 58] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

/// Base58-encode a UUID.
pub fn short_uuid(id: Uuid) -> String {
    let mut n = id.as_u128();
    let mut out = Vec::with_capacity(22);
    while n > 0 {
        out.push(ALPHABET[(n % 58) as usize]);
        n /= 58;
    }
    if out.is_empty() {
        out.push(ALPHABET[0]);
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// `count` distinct random identifiers, upper-cased.
pub fn generate_ids(count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let id = short_uuid(Uuid::new_v4()).to_uppercase();
        if seen.insert(id.clone()) {
            ids.push(id);
        } else {
            log::debug!("Regenerating colliding identifier {id}");
        }
    }
    ids
}
