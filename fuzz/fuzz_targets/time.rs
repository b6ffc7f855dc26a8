#![no_main]
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;
use rehearsal_libs::time::{Blocks, TimeMerge, TimeRange, Windowed};

fuzz_target!(|data: (Vec<TimeRange<u8>>, u8, Vec<TimeRange<u8>>)| {
    let (available, duration, blocks) = data;

    let windows = available.iter().windowed(duration);
    assert!(
        windows.iter().all(|w| w.len() == duration),
        "Duration should be the same for all windows"
    );

    let merged = available.iter().time_merge();
    assert!(merged.iter().all(|t| !t.is_empty()), "Merged ranges are never empty");
    assert!(
        merged.iter().zip(merged.iter().skip(1)).all(|(l, r)| l.end() < r.start()),
        "Merged ranges should be sorted and apart"
    );

    let availability = available.iter().blocks(blocks.iter());
    let original = merged.iter().windowed(1).into_iter().collect::<HashSet<_>>();
    let blocked = blocks.iter().windowed(1).into_iter().collect::<HashSet<_>>();

    for minute in availability.iter().windowed(1) {
        assert!(original.contains(&minute), "{} is not in the original time", minute);
        assert!(!blocked.contains(&minute), "{} is blocked", minute);
    }

    for minute in original.difference(&blocked) {
        assert!(
            availability.iter().any(|a| a.contains(*minute)),
            "{} was free but dropped",
            minute
        );
    }
});
