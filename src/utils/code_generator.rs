//! Short code generation.
//!
//! Codes are drawn from OS randomness and encoded with the URL-safe base64
//! alphabet (`A-Z`, `a-z`, `0-9`, `-`, `_`), so every character carries six
//! uniformly distributed bits and codes have no structural prefix.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Code length used when none is configured.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Accepted range for configured code lengths.
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 32;

/// Upper bound for codes accepted on lookup paths.
const MAX_LOOKUP_CODE_LENGTH: usize = 64;

/// Source of candidate short codes.
///
/// Implementations only promise statistical uniqueness; the mapping store
/// resolves collisions.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    /// Produces a fresh candidate code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the randomness source is unavailable.
    fn generate(&self) -> Result<String, AppError>;
}

/// Generates fixed-length random codes from the system RNG.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    /// Creates a generator producing codes of `length` characters.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    /// Fills `ceil(length / 4) * 3` random bytes, encodes them as unpadded
    /// URL-safe base64 and truncates to `length` characters.
    fn generate(&self) -> Result<String, AppError> {
        let mut buffer = vec![0u8; self.length.div_ceil(4) * 3];

        getrandom::fill(&mut buffer).map_err(|e| {
            AppError::internal(
                "Random source unavailable",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buffer);
        code.truncate(self.length);

        Ok(code)
    }
}

/// Returns true if `code` could have been produced by a code generator.
///
/// Used to reject obviously invalid lookups before they reach storage.
pub fn is_well_formed_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_LOOKUP_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_generate_code_has_default_length() {
        let code = RandomCodeGenerator::default().generate().unwrap();
        assert_eq!(code.len(), DEFAULT_CODE_LENGTH);
    }

    #[test]
    fn test_generate_code_respects_configured_length() {
        for length in MIN_CODE_LENGTH..=MAX_CODE_LENGTH {
            let code = RandomCodeGenerator::new(length).generate().unwrap();
            assert_eq!(code.len(), length, "length {}", length);
        }
    }

    #[test]
    fn test_generate_code_url_safe_characters() {
        let generator = RandomCodeGenerator::default();
        for _ in 0..100 {
            let code = generator.generate().unwrap();
            assert!(is_well_formed_code(&code), "unexpected code {}", code);
            assert!(!code.contains('='));
        }
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let generator = RandomCodeGenerator::default();
        let codes: HashSet<String> = (0..1000).map(|_| generator.generate().unwrap()).collect();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_generate_code_uses_whole_alphabet() {
        let generator = RandomCodeGenerator::default();
        let mut seen: HashMap<char, usize> = HashMap::new();

        for _ in 0..2000 {
            for c in generator.generate().unwrap().chars() {
                *seen.entry(c).or_default() += 1;
            }
        }

        // 16000 draws over 64 symbols: every symbol shows up.
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_well_formed_code() {
        assert!(is_well_formed_code("Ab3dK9pQ"));
        assert!(is_well_formed_code("a-b_c"));
        assert!(!is_well_formed_code(""));
        assert!(!is_well_formed_code("has space"));
        assert!(!is_well_formed_code("slash/es"));
        assert!(!is_well_formed_code(&"a".repeat(65)));
    }
}
