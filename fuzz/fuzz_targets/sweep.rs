#![no_main]
use libfuzzer_sys::fuzz_target;
use rehearsal_libs::{
    coverage::sweep,
    time::{TimeMerge, TimeRange},
};

fuzz_target!(|members: Vec<Vec<TimeRange<u8>>>| {
    #[cfg(feature = "log")]
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply();

    let segments = sweep(&members);

    for pair in segments.windows(2) {
        assert!(
            pair[0].range.end() <= pair[1].range.start(),
            "Segments overlap or are out of order: {} then {}",
            pair[0].range,
            pair[1].range
        );
        if pair[0].range.end() == pair[1].range.start() {
            assert_ne!(pair[0].members, pair[1].members, "Adjacent segments were not merged");
        }
    }

    for segment in &segments {
        assert!(!segment.range.is_empty(), "Empty segment {}", segment.range);
        assert!(!segment.members.is_empty(), "Segment {} has nobody free", segment.range);

        for (index, times) in members.iter().enumerate() {
            let free = times.iter().time_merge().iter().any(|t| t.contains(segment.range));
            let listed = segment.members.binary_search(&index).is_ok();
            assert_eq!(
                free, listed,
                "Member {} membership wrong for {}",
                index, segment.range
            );
        }
    }
});
