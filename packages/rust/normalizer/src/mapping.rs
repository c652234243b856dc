//! Fixed translation tables between the service vocabulary and canonical ids.

use scorecard_shared::{ComponentId, TagType};

/// External component keys, in the order components are built.
///
/// `competition` has no external key and is never produced from a live
/// response.
pub const COMPONENT_KEYS: [(&str, ComponentId); 7] = [
    ("metrics", ComponentId::Metrics),
    ("economic_buyer", ComponentId::EconomicBuyer),
    ("decision_criteria", ComponentId::DecisionCriteria),
    ("decision_process", ComponentId::DecisionProcess),
    ("paper_process", ComponentId::PaperProcess),
    ("identify_pain", ComponentId::IdentifyPain),
    ("champion", ComponentId::Champion),
];

/// External tag types with a canonical counterpart.
pub const TAG_TYPES: [(&str, TagType); 4] = [
    (CLOUD_PROVIDER_TAG, TagType::Cloud),
    ("technology", TagType::Tech),
    ("compliance", TagType::Compliance),
    ("integration", TagType::Integration),
];

/// External tag type that carries the account's cloud provider.
pub const CLOUD_PROVIDER_TAG: &str = "cloud_provider";

pub fn component_for_key(key: &str) -> Option<ComponentId> {
    COMPONENT_KEYS
        .iter()
        .find(|(external, _)| *external == key)
        .map(|(_, id)| *id)
}

/// Unknown external types fall back to [`TagType::Integration`].
pub fn tag_type_for(external: &str) -> TagType {
    TAG_TYPES
        .iter()
        .find(|(name, _)| *name == external)
        .map(|(_, tag_type)| *tag_type)
        .unwrap_or(TagType::Integration)
}
