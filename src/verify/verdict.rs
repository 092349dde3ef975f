use std::fmt;

use serde::{Deserialize, Serialize};

const FAKE_MARKER: &str = "final result: fake";
const REAL_MARKER: &str = "final result: real";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Real,
    Fake,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "REAL",
            Verdict::Fake => "FAKE",
            Verdict::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan synthesized text for the terminal marker. FAKE is checked first, so
/// text carrying both markers is FAKE.
pub fn check_result(text: &str) -> Verdict {
    let lower = text.to_lowercase();
    if lower.contains(FAKE_MARKER) {
        Verdict::Fake
    } else if lower.contains(REAL_MARKER) {
        Verdict::Real
    } else {
        Verdict::Unknown
    }
}
