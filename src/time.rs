use core::fmt::{self, Display};
use itertools::Itertools;
use num::{CheckedAdd, Integer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open [start, end) time range
/// <N>: Any integer type
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct TimeRange<N>(pub N, pub N);

impl<N> TimeRange<N>
where
    N: Integer + Copy,
{
    /// Construct a new Time Range
    /// Range is half-open on [start, end)
    /// # Examples
    /// ```
    /// use rehearsal_libs::time::TimeRange;
    ///
    /// let test = TimeRange::new(0, 100);
    ///
    /// assert_eq!(test.0, 0);
    /// assert_eq!(test.1, 100);
    /// ```
    pub fn new(start: N, end: N) -> TimeRange<N> {
        TimeRange(start, end)
    }

    /// Returns the start of the TimeRange
    pub fn start(self) -> N {
        self.0
    }

    /// Returns the (exclusive) end of the TimeRange
    pub fn end(self) -> N {
        self.1
    }

    /// A range whose end is not after its start holds no time at all.
    pub fn is_empty(self) -> bool {
        self.1 <= self.0
    }

    /// Length of the range, zero for empty ranges
    ///
    /// # Examples
    /// ```
    /// use rehearsal_libs::time::TimeRange;
    ///
    /// assert_eq!(TimeRange::new(18, 22).len(), 4);
    /// assert_eq!(TimeRange::new(22, 18).len(), 0);
    /// ```
    pub fn len(self) -> N {
        if self.is_empty() {
            N::zero()
        } else {
            self.1 - self.0
        }
    }

    pub fn overlaps(self, other: TimeRange<N>) -> bool {
        self.0 < other.1 && other.0 < self.1
    }

    /// Common part of two ranges, if they share any time
    ///
    /// # Examples
    /// ```
    /// use rehearsal_libs::time::TimeRange;
    ///
    /// let a = TimeRange::new(0, 10);
    ///
    /// assert_eq!(a.intersect(TimeRange::new(5, 20)), Some(TimeRange::new(5, 10)));
    /// assert_eq!(a.intersect(TimeRange::new(10, 20)), None);
    /// ```
    pub fn intersect(self, other: TimeRange<N>) -> Option<TimeRange<N>> {
        let range = TimeRange(self.0.max(other.0), self.1.min(other.1));
        if range.is_empty() {
            None
        } else {
            Some(range)
        }
    }

    pub fn contains(self, other: TimeRange<N>) -> bool {
        self.0 <= other.0 && other.1 <= self.1
    }
}

impl<N> Display for TimeRange<N>
where
    N: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.0, self.1)
    }
}

pub trait TimeMerge<N>
where
    N: Integer + Copy,
{
    fn time_merge(self) -> Vec<TimeRange<N>>;
}

impl<'a, T, N> TimeMerge<N> for T
where
    T: Iterator<Item = &'a TimeRange<N>>,
    N: 'a + Integer + Copy,
{
    /// Combines overlapping and touching TimeRanges together.
    /// Empty ranges are dropped and the result is sorted.
    ///
    /// # Examples
    /// ```
    /// use rehearsal_libs::time::{TimeMerge, TimeRange};
    ///
    /// let time_merge = vec![
    ///     TimeRange::new(6, 7),
    ///     TimeRange::new(0, 1),
    ///     TimeRange::new(1, 3),
    ///     TimeRange::new(2, 4),
    ///     TimeRange::new(9, 9),
    /// ];
    ///
    /// assert_eq!(
    ///     time_merge.iter().time_merge(),
    ///     vec![TimeRange::new(0, 4), TimeRange::new(6, 7)]
    /// );
    /// ```
    fn time_merge(self) -> Vec<TimeRange<N>> {
        self.filter(|time| !time.is_empty())
            .sorted_unstable()
            .copied()
            .coalesce(|last, curr| {
                if curr.start() <= last.end() {
                    Ok(TimeRange(last.start(), last.end().max(curr.end())))
                } else {
                    Err((last, curr))
                }
            })
            .collect_vec()
    }
}

pub trait Blocks<N>
where
    N: Integer + Copy,
{
    fn blocks<'b, B>(self, blocked: B) -> Vec<TimeRange<N>>
    where
        B: Iterator<Item = &'b TimeRange<N>>,
        N: 'b;
}

impl<'a, T, N> Blocks<N> for T
where
    T: Iterator<Item = &'a TimeRange<N>>,
    N: 'a + Integer + Copy,
{
    /// Self is available time, `blocked` is time that cannot be scheduled.
    /// This performs a set exclusion: `self - blocked`
    ///
    /// # Examples
    /// ```
    /// use rehearsal_libs::time::{Blocks, TimeRange};
    ///
    /// let available = vec![TimeRange::new(0, 10), TimeRange::new(20, 30)];
    /// let blocked = vec![TimeRange::new(2, 4), TimeRange::new(8, 22)];
    ///
    /// assert_eq!(
    ///     available.iter().blocks(blocked.iter()),
    ///     vec![
    ///         TimeRange::new(0, 2),
    ///         TimeRange::new(4, 8),
    ///         TimeRange::new(22, 30),
    ///     ]
    /// );
    /// ```
    fn blocks<'b, B>(self, blocked: B) -> Vec<TimeRange<N>>
    where
        B: Iterator<Item = &'b TimeRange<N>>,
        N: 'b,
    {
        let blocked = blocked.time_merge();
        let mut blocking_times = blocked.iter().peekable();
        let mut sub_times = vec![];

        for available_time in self.time_merge() {
            let mut start = available_time.start();
            let end = available_time.end();

            while let Some(&&block) = blocking_times.peek() {
                if block.end() <= start {
                    blocking_times.next();
                    continue;
                }

                if block.start() >= end {
                    break;
                }

                if block.start() > start {
                    sub_times.push(TimeRange(start, block.start()));
                }
                start = start.max(block.end());

                // The block may also cover the next available range
                if block.end() > end {
                    break;
                }
                blocking_times.next();
            }

            if start < end {
                sub_times.push(TimeRange(start, end));
            }
        }

        sub_times
    }
}

pub trait Windowed<N>
where
    N: Integer + Copy,
{
    fn windowed_by(self, duration: N, step: N) -> Vec<TimeRange<N>>;

    fn windowed(self, duration: N) -> Vec<TimeRange<N>>
    where
        Self: Sized,
    {
        self.windowed_by(duration, N::one())
    }
}

impl<'a, T, N> Windowed<N> for T
where
    T: Iterator<Item = &'a TimeRange<N>>,
    N: 'a + Integer + CheckedAdd + Copy,
{
    /// Splits each `TimeRange` into windows of exactly `duration`,
    /// with window starts `step` apart.
    ///
    /// # Example
    /// ```
    /// use rehearsal_libs::time::{Windowed, TimeRange};
    ///
    /// let times = vec![ TimeRange::new(0, 4) ];
    ///
    /// assert_eq!(times.iter().windowed(3),
    ///     vec![
    ///         TimeRange::new(0, 3),
    ///         TimeRange::new(1, 4),
    ///     ]
    /// );
    ///
    /// assert_eq!(times.iter().windowed_by(2, 2),
    ///     vec![
    ///         TimeRange::new(0, 2),
    ///         TimeRange::new(2, 4),
    ///     ]
    /// );
    /// ```
    fn windowed_by(self, duration: N, step: N) -> Vec<TimeRange<N>> {
        let mut windows: Vec<TimeRange<N>> = Vec::with_capacity(self.size_hint().1.unwrap_or(0));

        if duration.is_zero() {
            return windows;
        }
        let step = if step.is_zero() { N::one() } else { step };

        for time in self {
            let mut start = time.start();

            while let Some(window_end) = start.checked_add(&duration) {
                if window_end > time.end() {
                    break;
                }
                windows.push(TimeRange(start, window_end));

                match start.checked_add(&step) {
                    Some(next) => start = next,
                    None => break,
                }
            }
        }

        windows
    }
}
