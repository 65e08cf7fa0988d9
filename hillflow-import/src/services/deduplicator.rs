//! Duplicate-length resolution for one flowpath
//!
//! Some samples are emitted twice when two field boundaries overlap, giving
//! two points with the same cumulative length. Resolution looks at how the
//! flowpath's points split across field boundary groups and applies an
//! ordered rule table; the first rule that matches wins:
//!
//! 1. `singleton_boundary`: exactly two groups and exactly one has a single
//!    point → discard that point's group.
//! 2. `perfect_duplicate`: two or more groups, all of the same size →
//!    discard the first group.
//! 3. `high_field_wins`: keep only the largest group.
//!
//! Rule 3 has only been exercised on two-group inputs. With three or more
//! groups it is a heuristic, and duplicates that survive it are reported by
//! the builder as a geometric contradiction.

use crate::models::PointRecord;

/// Field boundary groups ordered by size (descending), ties by first appearance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCensus {
    groups: Vec<(String, usize)>,
}

impl GroupCensus {
    /// Count points per field boundary id, preserving first-appearance order on ties
    pub fn from_points(points: &[PointRecord]) -> Self {
        let mut groups: Vec<(String, usize)> = Vec::new();
        for point in points {
            match groups.iter_mut().find(|(id, _)| *id == point.field_boundary_id) {
                Some((_, count)) => *count += 1,
                None => groups.push((point.field_boundary_id.clone(), 1)),
            }
        }
        // Stable sort keeps first appearance among equal counts
        groups.sort_by(|a, b| b.1.cmp(&a.1));
        Self { groups }
    }

    pub fn groups(&self) -> &[(String, usize)] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// What to do with the points of one field boundary group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Drop every point of this group
    DiscardGroup(String),
    /// Drop every point outside this group
    KeepOnlyGroup(String),
}

impl Resolution {
    fn retains(&self, point: &PointRecord) -> bool {
        match self {
            Resolution::DiscardGroup(id) => point.field_boundary_id != *id,
            Resolution::KeepOnlyGroup(id) => point.field_boundary_id == *id,
        }
    }
}

/// One entry of the policy table
#[derive(Clone, Copy)]
pub struct DedupRule {
    pub name: &'static str,
    pub resolve: fn(&GroupCensus) -> Option<Resolution>,
}

impl std::fmt::Debug for DedupRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupRule").field("name", &self.name).finish()
    }
}

fn singleton_boundary(census: &GroupCensus) -> Option<Resolution> {
    if census.len() != 2 {
        return None;
    }
    let singletons: Vec<&(String, usize)> =
        census.groups().iter().filter(|(_, count)| *count == 1).collect();
    match singletons.as_slice() {
        [(id, _)] => Some(Resolution::DiscardGroup(id.clone())),
        _ => None,
    }
}

fn perfect_duplicate(census: &GroupCensus) -> Option<Resolution> {
    // A lone group has nothing to be a duplicate of
    if census.len() < 2 {
        return None;
    }
    let (first_id, first_count) = census.groups().first()?;
    census
        .groups()
        .iter()
        .all(|(_, count)| count == first_count)
        .then(|| Resolution::DiscardGroup(first_id.clone()))
}

fn high_field_wins(census: &GroupCensus) -> Option<Resolution> {
    census
        .groups()
        .first()
        .map(|(id, _)| Resolution::KeepOnlyGroup(id.clone()))
}

/// Default policy table, evaluated top to bottom
pub const DEFAULT_RULES: [DedupRule; 3] = [
    DedupRule {
        name: "singleton_boundary",
        resolve: singleton_boundary,
    },
    DedupRule {
        name: "perfect_duplicate",
        resolve: perfect_duplicate,
    },
    DedupRule {
        name: "high_field_wins",
        resolve: high_field_wins,
    },
];

/// Result of applying the policy table
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    pub points: Vec<PointRecord>,
    pub rule: &'static str,
    pub resolution: Resolution,
}

/// Resolves duplicate cumulative lengths within one flowpath
#[derive(Debug, Clone)]
pub struct Deduplicator {
    rules: Vec<DedupRule>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two or more points share a cumulative length
    pub fn has_duplicate_lengths(points: &[PointRecord]) -> bool {
        let mut lengths: Vec<f64> = points.iter().filter_map(|p| p.cumulative_length).collect();
        lengths.sort_by(f64::total_cmp);
        lengths.windows(2).any(|pair| pair[0] == pair[1])
    }

    /// Apply the first matching rule
    ///
    /// Returns `None` when there are no duplicate lengths or no rule matched;
    /// the caller keeps the input unchanged in that case.
    pub fn dedupe(&self, points: &[PointRecord]) -> Option<DedupOutcome> {
        if !Self::has_duplicate_lengths(points) {
            return None;
        }

        let census = GroupCensus::from_points(points);
        let (rule, resolution) = self
            .rules
            .iter()
            .find_map(|rule| (rule.resolve)(&census).map(|resolution| (rule.name, resolution)))?;

        tracing::debug!(
            rule,
            resolution = ?resolution,
            groups = ?census.groups(),
            "Resolved duplicate cumulative lengths"
        );

        let points = points
            .iter()
            .filter(|point| resolution.retains(point))
            .cloned()
            .collect();

        Some(DedupOutcome {
            points,
            rule,
            resolution,
        })
    }
}
