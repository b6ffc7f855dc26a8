use crate::time::{TimeMerge, TimeRange};
use itertools::Itertools;
use num::Integer;
use std::collections::BTreeSet;

/// An atomic stretch of time during which the same set of members is free.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment<N>
where
    N: Integer + Copy,
{
    pub range: TimeRange<N>,
    /// Indices into the member list given to [`sweep`], ascending
    pub members: Vec<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    End,
    Start,
}

/// Partitions the time covered by `members` into segments, cutting every
/// time the set of free members changes. `members[i]` holds the free
/// intervals of member `i`; they need not be sorted or disjoint.
///
/// Only segments where at least one member is free are returned, in
/// chronological order.
///
/// # Examples
/// ```
/// use rehearsal_libs::coverage::sweep;
/// use rehearsal_libs::time::TimeRange;
///
/// let segments = sweep(&[
///     vec![TimeRange::new(18, 22)],
///     vec![TimeRange::new(19, 21)],
/// ]);
///
/// let summary: Vec<_> = segments.iter().map(|s| (s.range, s.members.clone())).collect();
/// assert_eq!(
///     summary,
///     vec![
///         (TimeRange::new(18, 19), vec![0]),
///         (TimeRange::new(19, 21), vec![0, 1]),
///         (TimeRange::new(21, 22), vec![0]),
///     ]
/// );
/// ```
pub fn sweep<N>(members: &[Vec<TimeRange<N>>]) -> Vec<Segment<N>>
where
    N: Integer + Copy,
{
    let events = members
        .iter()
        .enumerate()
        .flat_map(|(member, times)| {
            times
                .iter()
                .time_merge()
                .into_iter()
                .flat_map(move |time| {
                    [
                        (time.start(), Edge::Start, member),
                        (time.end(), Edge::End, member),
                    ]
                })
        })
        .sorted_unstable();

    let mut active: BTreeSet<usize> = BTreeSet::new();
    let mut segments: Vec<Segment<N>> = Vec::new();
    let mut cursor: Option<N> = None;

    let grouped = events.group_by(|&(at, _, _)| at);
    for (at, edges) in &grouped {
        if let Some(from) = cursor {
            if !active.is_empty() && from < at {
                segments.push(Segment {
                    range: TimeRange::new(from, at),
                    members: active.iter().copied().collect(),
                });
            }
        }

        for (_, edge, member) in edges {
            match edge {
                Edge::Start => {
                    active.insert(member);
                }
                Edge::End => {
                    active.remove(&member);
                }
            }
        }

        cursor = Some(at);
    }

    segments
        .into_iter()
        .coalesce(|last, curr| {
            if last.range.end() == curr.range.start() && last.members == curr.members {
                Ok(Segment {
                    range: TimeRange::new(last.range.start(), curr.range.end()),
                    members: last.members,
                })
            } else {
                Err((last, curr))
            }
        })
        .collect()
}
