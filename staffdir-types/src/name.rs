//! Name guessing.
//!
//! When a person record is synthesized from an account, only a display name
//! may be available. `guess_name` splits it into given/family parts using a
//! configurable surname bias and a list of surname markers ("van", "de", ...).

use serde::{Deserialize, Serialize};

/// A common-name / given-name / surname triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameParts {
    pub cn: String,
    pub given_name: String,
    pub sn: String,
}

/// Tunables for `guess_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameGuessConfig {
    /// How many trailing words of the display name form the surname.
    pub sn_bias: usize,
    /// Markers which, found as a standalone word, start the surname.
    /// Matched case-insensitively.
    pub sn_marks: Vec<String>,
}

impl Default for NameGuessConfig {
    fn default() -> Self {
        Self {
            sn_bias: 1,
            sn_marks: ["van", "von", "de", "del", "di", "da", "st."]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fills in missing given/family name parts from the display name.
///
/// When both parts are given they pass through untouched. When one part is
/// missing, it is taken as the display name minus the known part. When both
/// are missing, the display name is split at the first surname marker, or
/// failing that at the last `sn_bias` words. A single-word name becomes both
/// parts.
#[must_use]
pub fn guess_name(
    cn: &str,
    given_name: Option<&str>,
    sn: Option<&str>,
    config: &NameGuessConfig,
) -> NameParts {
    let mut result = NameParts {
        cn: cn.to_string(),
        given_name: given_name.unwrap_or_default().to_string(),
        sn: sn.unwrap_or_default().to_string(),
    };

    match (given_name, sn) {
        (Some(_), Some(_)) => result,
        (None, Some(sn)) => {
            result.given_name = collapse_ws(&cn.replace(sn, ""));
            result
        }
        (Some(given), None) => {
            result.sn = collapse_ws(&cn.replace(given, ""));
            result
        }
        (None, None) => {
            let parts: Vec<&str> = cn.split_whitespace().collect();
            if parts.is_empty() {
                return result;
            }
            // a marker only counts as a standalone interior word
            for i in 1..parts.len() - 1 {
                let word = parts[i].to_lowercase();
                if config.sn_marks.iter().any(|m| *m == word) {
                    result.given_name = parts[..i].join(" ");
                    result.sn = parts[i..].join(" ");
                    return result;
                }
            }
            if parts.len() == 1 {
                result.given_name = parts[0].to_string();
                result.sn = parts[0].to_string();
                return result;
            }
            // shrink the bias until it leaves at least one given-name word
            let bias = config.sn_bias.clamp(1, parts.len() - 1);
            result.given_name = parts[..parts.len() - bias].join(" ");
            result.sn = parts[parts.len() - bias..].join(" ");
            result
        }
    }
}
