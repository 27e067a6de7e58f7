// ── Payload encoding normalisation and negotiation ──
//
// Devices report encodings in whatever case their vendor prefers
// ("JSON_IETF", "json_ietf", "Json"). Everything past the fetcher works on
// canonical `Encoding` values only.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Canonical payload encoding name.
///
/// Unknown encodings are preserved (lowercased) rather than rejected so that
/// a device advertising something new still round-trips through the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Encoding {
    JsonIetf,
    Json,
    Ascii,
    Proto,
    Bytes,
    Other(String),
}

impl Encoding {
    /// Case-insensitive normalisation of a raw encoding name.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "json_ietf" => Self::JsonIetf,
            "json" => Self::Json,
            "ascii" => Self::Ascii,
            "proto" => Self::Proto,
            "bytes" => Self::Bytes,
            _ => Self::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::JsonIetf => "json_ietf",
            Self::Json => "json",
            Self::Ascii => "ascii",
            Self::Proto => "proto",
            Self::Bytes => "bytes",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<String> for Encoding {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<&str> for Encoding {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<Encoding> for String {
    fn from(e: Encoding) -> Self {
        e.as_str().to_owned()
    }
}

// ── EncodingPolicy ──────────────────────────────────────────────────

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingChoice {
    pub encoding: Encoding,
    /// `true` when the requested encoding was unavailable and a preferred
    /// alternative was picked instead.
    pub was_fallback: bool,
}

/// Negotiates a mutually supported encoding.
///
/// Selection is a pure function of `(requested, supported, preference)`.
#[derive(Debug, Clone)]
pub struct EncodingPolicy {
    preference: Vec<Encoding>,
}

impl Default for EncodingPolicy {
    /// Richest-structured first: `json_ietf`, `json`, `ascii`.
    fn default() -> Self {
        Self {
            preference: vec![Encoding::JsonIetf, Encoding::Json, Encoding::Ascii],
        }
    }
}

impl EncodingPolicy {
    /// Policy with a custom fallback order.
    pub fn with_preference(preference: Vec<Encoding>) -> Self {
        Self { preference }
    }

    pub fn preference(&self) -> &[Encoding] {
        &self.preference
    }

    pub fn normalize(&self, raw: &str) -> Encoding {
        Encoding::normalize(raw)
    }

    /// Pick the encoding to use against a device.
    ///
    /// 1. The requested encoding, if the device supports it.
    /// 2. Otherwise the first preferred encoding the device supports,
    ///    flagged as a fallback.
    /// 3. `None` when nothing in the preference order is supported.
    ///
    /// With no request at all the first supported preferred encoding is
    /// returned and is not considered a fallback.
    pub fn choose_supported(
        &self,
        requested: Option<&Encoding>,
        supported: &IndexSet<Encoding>,
    ) -> Option<EncodingChoice> {
        if let Some(requested) = requested {
            if supported.contains(requested) {
                return Some(EncodingChoice {
                    encoding: requested.clone(),
                    was_fallback: false,
                });
            }
        }

        self.preference
            .iter()
            .find(|candidate| supported.contains(*candidate))
            .map(|encoding| EncodingChoice {
                encoding: encoding.clone(),
                was_fallback: requested.is_some(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> IndexSet<Encoding> {
        items.iter().map(|s| Encoding::normalize(s)).collect()
    }

    #[test]
    fn normalize_is_case_insensitive() {
        assert_eq!(Encoding::normalize("JSON_IETF"), Encoding::JsonIetf);
        assert_eq!(Encoding::normalize(" Json "), Encoding::Json);
        assert_eq!(Encoding::normalize("ASCII"), Encoding::Ascii);
    }

    #[test]
    fn unknown_encoding_passes_through_lowercased() {
        let e = Encoding::normalize("CBOR");
        assert_eq!(e, Encoding::Other("cbor".into()));
        assert_eq!(e.to_string(), "cbor");
    }

    #[test]
    fn requested_encoding_wins_when_supported() {
        let policy = EncodingPolicy::default();
        let choice = policy
            .choose_supported(Some(&Encoding::Ascii), &set(&["json_ietf", "ascii"]))
            .unwrap();
        assert_eq!(choice.encoding, Encoding::Ascii);
        assert!(!choice.was_fallback);
    }

    #[test]
    fn falls_back_in_preference_order() {
        let policy = EncodingPolicy::default();
        let choice = policy
            .choose_supported(Some(&Encoding::JsonIetf), &set(&["ascii", "json"]))
            .unwrap();
        assert_eq!(choice.encoding, Encoding::Json);
        assert!(choice.was_fallback);
    }

    #[test]
    fn nothing_usable_yields_none() {
        let policy = EncodingPolicy::default();
        assert!(
            policy
                .choose_supported(Some(&Encoding::JsonIetf), &set(&["proto", "bytes"]))
                .is_none()
        );
        assert!(policy.choose_supported(None, &IndexSet::new()).is_none());
    }

    #[test]
    fn no_request_picks_best_without_fallback_flag() {
        let policy = EncodingPolicy::default();
        let choice = policy
            .choose_supported(None, &set(&["ascii", "json_ietf"]))
            .unwrap();
        assert_eq!(choice.encoding, Encoding::JsonIetf);
        assert!(!choice.was_fallback);
    }

    #[test]
    fn selection_is_deterministic() {
        let policy = EncodingPolicy::default();
        let supported = set(&["ascii", "json"]);
        let first = policy.choose_supported(Some(&Encoding::Proto), &supported);
        for _ in 0..10 {
            assert_eq!(policy.choose_supported(Some(&Encoding::Proto), &supported), first);
        }
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&Encoding::JsonIetf).unwrap();
        assert_eq!(json, "\"json_ietf\"");
        let back: Encoding = serde_json::from_str("\"JSON\"").unwrap();
        assert_eq!(back, Encoding::Json);
    }
}
