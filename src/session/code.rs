use rand::Rng;

/// Code alphabet: uppercase alphanumerics minus I, O, 0 and 1, which read
/// ambiguously on a shared screen.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LEN: usize = 6;

pub fn generate_code() -> String {
  let mut rng = rand::thread_rng();
  (0..CODE_LEN)
    .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
    .collect()
}

/// Codes are matched case-insensitively everywhere; normalize before any
/// store lookup.
pub fn normalize_code(code: &str) -> String {
  code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_are_six_chars_from_alphabet() {
    for _ in 0..200 {
      let code = generate_code();
      assert_eq!(code.len(), CODE_LEN);
      assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }
  }

  #[test]
  fn alphabet_excludes_ambiguous_glyphs() {
    assert_eq!(CODE_ALPHABET.len(), 32);
    for b in [b'I', b'O', b'0', b'1'] {
      assert!(!CODE_ALPHABET.contains(&b));
    }
  }

  #[test]
  fn normalize_uppercases_and_trims() {
    assert_eq!(normalize_code(" abc234 "), "ABC234");
    assert_eq!(normalize_code("ABC234"), "ABC234");
  }
}
