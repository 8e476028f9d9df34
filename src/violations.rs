use std::fmt;

use serde::Serialize;

use crate::config::ViolationCategories;
use crate::map::OrderedMap;
use crate::protocol::ProtocolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    Misbehavior,
    OffTopic,
}

impl ViolationType {
    pub const ALL: [ViolationType; 2] = [ViolationType::Misbehavior, ViolationType::OffTopic];

    pub fn as_str(self) -> &'static str {
        match self {
            ViolationType::Misbehavior => "misbehavior",
            ViolationType::OffTopic => "off_topic",
        }
    }

    fn source<'a>(self, sources: &'a ViolationCategories) -> &'a str {
        match self {
            ViolationType::Misbehavior => &sources.misbehavior,
            ViolationType::OffTopic => &sources.off_topic,
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbatim matches of negative-category phrases, keyed by violation type.
/// Types without matches are left out.
pub type Violations = OrderedMap<Vec<String>>;

/// Scan normalized text for phrases of the designated negative categories.
///
/// This is plain substring containment, not semantic matching. Phrases are
/// reported as authored, in protocol order.
pub fn detect(
    normalized_text: &str,
    protocol: &ProtocolDefinition,
    sources: &ViolationCategories,
) -> Violations {
    let mut found = Violations::new();
    for kind in ViolationType::ALL {
        let Some(category) = protocol.get(kind.source(sources)) else {
            continue;
        };
        let hits: Vec<String> = category
            .matches_in(normalized_text)
            .map(str::to_string)
            .collect();
        if !hits.is_empty() {
            tracing::debug!(violation = %kind, matches = hits.len(), "protocol violation");
            found.insert(kind.as_str(), hits);
        }
    }
    found
}
