use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

pub const DEFAULT_MAX_RESULTS: u32 = 100;
pub const MAX_MAX_RESULTS: u32 = 100;

/// Opaque continuation token: the last key seen under a stable ordering, so
/// resuming a traversal skips straight past it regardless of rows added or
/// removed elsewhere in the index since the token was issued.
#[derive(Serialize, Deserialize)]
struct Token {
    last_key: String,
}

pub fn encode(last_key: &str) -> String {
    let json = serde_json::to_vec(&Token {
        last_key: last_key.to_string(),
    })
    .expect("Token always serializes");
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode(token: &str) -> StoreResult<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StoreError::InvalidToken)?;
    let parsed: Token = serde_json::from_slice(&bytes).map_err(|_| StoreError::InvalidToken)?;
    Ok(parsed.last_key)
}

pub fn clamp_max_results(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_MAX_RESULTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let token = encode("idx/list/cluster/000042");
        assert_eq!(decode(&token).unwrap(), "idx/list/cluster/000042");
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(decode("not-a-valid-token!!").is_err());
    }

    #[test]
    fn max_results_is_clamped() {
        assert_eq!(clamp_max_results(None), DEFAULT_MAX_RESULTS);
        assert_eq!(clamp_max_results(Some(5)), 5);
        assert_eq!(clamp_max_results(Some(10_000)), MAX_MAX_RESULTS);
        assert_eq!(clamp_max_results(Some(0)), 1);
    }
}
