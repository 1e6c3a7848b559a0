//! `A1`-style cell addresses.

/// Split an address like `"B12"` into a 0-based column and a 1-based row.
/// `$` anchors are ignored. Returns `None` for anything that is not
/// letters followed by digits (sheet metadata keys such as `!ref` included).
pub fn parse(address: &str) -> Option<(u32, u32)> {
    let address = address.trim();
    let digits_at = address.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = address.split_at(digits_at);

    let mut col: u32 = 0;
    let mut saw_col = false;
    for ch in letters.chars() {
        if ch == '$' {
            continue;
        }
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let n = u32::from(ch.to_ascii_uppercase() as u8 - b'A') + 1;
        col = col.checked_mul(26)?.checked_add(n)?;
        saw_col = true;
    }
    if !saw_col || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col - 1, row))
}

/// Inverse of [`parse`]: 0-based column, 1-based row.
pub fn format(col: u32, row: u32) -> String {
    let mut letters = Vec::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{row}", String::from_utf8_lossy(&letters))
}
