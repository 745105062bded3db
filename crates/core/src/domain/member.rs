use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical workspace member identity.
///
/// Construction trims whitespace, unwraps Slack's `<@U123|label>` mention syntax,
/// strips the leading `@` and upper-cases the result, so identities compare equal
/// regardless of how they were typed or stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let unwrapped =
            trimmed.strip_prefix('<').and_then(|inner| inner.strip_suffix('>')).unwrap_or(trimmed);
        let without_label = unwrapped.split('|').next().unwrap_or_default();
        let bare = without_label.trim().trim_start_matches('@').trim();
        Self(bare.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: MemberId,
    pub display_name: String,
}
