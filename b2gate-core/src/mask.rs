// Copyright 2026 B2Gate Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Masked previews of secret values for logs and diagnostics.

/// Characters kept visible at each end of a long secret.
const VISIBLE_CHARS: usize = 5;

/// Fixed replacement for the hidden middle of a long secret.
const MASK: &str = "*****";

/// Masks a secret for display.
///
/// Values longer than 10 characters keep their first and last 5 characters
/// with the middle replaced by a fixed-length mask; shorter values are fully
/// masked, one `*` per character.
///
/// Lengths are counted in characters, so multi-byte input never splits.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 2 * VISIBLE_CHARS {
        let head: String = chars[..VISIBLE_CHARS].iter().collect();
        let tail: String = chars[chars.len() - VISIBLE_CHARS..].iter().collect();
        format!("{}{}{}", head, MASK, tail)
    } else {
        "*".repeat(chars.len())
    }
}

/// Preview of a key id for debug contexts, `N/A` when too short to preview.
pub fn key_id_preview(value: &str) -> String {
    if value.chars().count() > 2 * VISIBLE_CHARS {
        mask_secret(value)
    } else {
        "N/A".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_value() {
        assert_eq!(mask_secret("0050428f1a906270000000001"), "00504*****00001");
        assert_eq!(mask_secret("abcdefghijk"), "abcde*****ghijk");
    }

    #[test]
    fn test_mask_short_value() {
        assert_eq!(mask_secret("abcdefghij"), "**********");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_mask_multibyte() {
        assert_eq!(mask_secret("äöüäöüäöüäöü"), "äöüäö*****öüäöü");
    }

    #[test]
    fn test_mask_never_leaks_middle() {
        let secrets = [
            "K005rH1B5kjFA6QgKtyAbzl1F80qMeY",
            "0050428f1a906270000000001",
            "abcdefghijklmnopqrstuvwxyz0123456789",
            "aaaaaaaaaaaaaaaaaaaa",
        ];
        for secret in secrets {
            let masked = mask_secret(secret);
            assert!(masked.starts_with(&secret[..5]));
            assert!(masked.ends_with(&secret[secret.len() - 5..]));
            let masked_chars: Vec<char> = masked.chars().collect();
            for window in masked_chars.windows(6) {
                let piece: String = window.iter().collect();
                assert!(!secret.contains(&piece), "{} leaked from {}", piece, secret);
            }
        }
    }

    #[test]
    fn test_key_id_preview() {
        assert_eq!(key_id_preview("short"), "N/A");
        assert_eq!(key_id_preview("0050428f1a906270000000001"), "00504*****00001");
    }
}
