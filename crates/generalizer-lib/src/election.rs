//! Representative election and visibility offsets
//!
//! At every level each cluster with more than one member elects the member with the
//! extremal selection value among those that have no offset yet. The election is pure:
//! it reads the current [`VisibilityOffsets`] and returns an [`ElectedSet`], which
//! [`advance_offsets`] then folds into a new offsets value.

use crate::{AttributeValue, ClusterAssignment, FeatureId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Which extremal value wins an election
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    #[default]
    Max,
    Min,
}

impl SelectionMethod {
    /// True if `candidate` beats `current`, breaking ties towards the lower feature id
    #[inline]
    pub fn prefers(self, candidate: (f64, FeatureId), current: (f64, FeatureId)) -> bool {
        let (cv, cid) = candidate;
        let (bv, bid) = current;
        match self {
            SelectionMethod::Max => cv > bv || (cv == bv && cid < bid),
            SelectionMethod::Min => cv < bv || (cv == bv && cid < bid),
        }
    }
}

impl std::str::FromStr for SelectionMethod {
    type Err = crate::GeneralizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(SelectionMethod::Max),
            "min" => Ok(SelectionMethod::Min),
            other => Err(crate::GeneralizeError::InvalidParameter(format!(
                "Unknown selection method '{other}', expected 'max' or 'min'"
            ))),
        }
    }
}

/// Features elected at one level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElectedSet {
    level: u32,
    elected: BTreeSet<FeatureId>,
}

impl ElectedSet {
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn contains(&self, feature: FeatureId) -> bool {
        self.elected.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.elected.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elected.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elected.is_empty()
    }
}

/// Per-feature "visible from level" annotation; unassigned features are absent
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityOffsets {
    offsets: HashMap<FeatureId, u32>,
}

impl VisibilityOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, feature: FeatureId) -> Option<u32> {
        self.offsets.get(&feature).copied()
    }

    #[inline]
    pub fn is_assigned(&self, feature: FeatureId) -> bool {
        self.offsets.contains_key(&feature)
    }

    /// Set the offset of an unassigned feature; an existing offset is never overwritten.
    ///
    /// Returns true if the offset was assigned by this call.
    pub fn assign(&mut self, feature: FeatureId, level: u32) -> bool {
        match self.offsets.entry(feature) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(level);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, u32)> + '_ {
        self.offsets.iter().map(|(&fid, &level)| (fid, level))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Annotation map, ready for [`Dataset::update_attribute`](crate::Dataset::update_attribute)
    pub fn to_attribute_map(&self) -> HashMap<FeatureId, AttributeValue> {
        self.offsets
            .iter()
            .map(|(&fid, &level)| (fid, AttributeValue::from(level)))
            .collect()
    }
}

/// Flags controlling how offsets advance besides ordinary elections
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OffsetPolicy {
    /// Isolated features (cluster size < 2) get the current level immediately
    pub isolated_features_always_visible: bool,
    /// The terminal sweep assigns the last level instead of the level after it
    pub show_all_at_last_zoom_level: bool,
}

/// Elect one representative per non-isolated cluster.
///
/// Candidates are members without an offset and with a numeric selection value
/// (`selection_values`); members with a null value never win. Clusters without
/// candidates elect nobody.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn elect(
    assignment: &ClusterAssignment,
    selection_values: &HashMap<FeatureId, f64>,
    method: SelectionMethod,
    offsets: &VisibilityOffsets,
) -> ElectedSet {
    let mut elected = BTreeSet::new();

    for (_, members) in assignment.clusters() {
        if members.len() < 2 {
            continue;
        }

        let mut winner: Option<(f64, FeatureId)> = None;
        for &fid in members {
            if offsets.is_assigned(fid) {
                continue;
            }
            let Some(&value) = selection_values.get(&fid) else {
                continue;
            };
            if winner.is_none_or(|current| method.prefers((value, fid), current)) {
                winner = Some((value, fid));
            }
        }

        if let Some((_, fid)) = winner {
            elected.insert(fid);
        }
    }

    ElectedSet {
        level: assignment.level(),
        elected,
    }
}

/// Fold one level's election into the offsets.
///
/// Elected features get `level`; isolated features get `level` too when the policy
/// says so. On the last level the terminal sweep of [`finalize_offsets`] runs as well.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn advance_offsets(
    mut offsets: VisibilityOffsets,
    elected: &ElectedSet,
    assignment: &ClusterAssignment,
    level: u32,
    is_last_level: bool,
    policy: OffsetPolicy,
) -> VisibilityOffsets {
    for fid in elected.iter() {
        offsets.assign(fid, level);
    }

    if policy.isolated_features_always_visible {
        for (_, members) in assignment.clusters() {
            if let [fid] = members {
                offsets.assign(*fid, level);
            }
        }
    }

    if is_last_level {
        let all = assignment.clusters().flat_map(|(_, members)| members.iter().copied());
        offsets = finalize_offsets(offsets, all, level, policy.show_all_at_last_zoom_level);
    }

    offsets
}

/// Terminal sweep: every still unassigned feature gets `level` (if `show_all_at_last`)
/// or `level + 1`
pub fn finalize_offsets(
    mut offsets: VisibilityOffsets,
    features: impl IntoIterator<Item = FeatureId>,
    level: u32,
    show_all_at_last: bool,
) -> VisibilityOffsets {
    let terminal = if show_all_at_last { level } else { level + 1 };
    let mut swept = 0usize;
    for fid in features {
        if offsets.assign(fid, terminal) {
            swept += 1;
        }
    }
    tracing::debug!("Terminal sweep assigned offset {} to {} features", terminal, swept);
    offsets
}
