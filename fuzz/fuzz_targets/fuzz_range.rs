#![no_main]

use fitview::range::{is_range, parse, parse_strict};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&count_byte, rest)) = data.split_first() else {
        return;
    };
    let Ok(spec) = std::str::from_utf8(rest) else {
        return;
    };
    let page_count = usize::from(count_byte);

    // Lenient parsing never panics and only yields real pages.
    let ranges = parse(spec, page_count);
    if page_count == 0 || spec.is_empty() {
        assert!(ranges.is_empty());
    }
    for iv in ranges.intervals() {
        assert!(
            1 <= iv.start && iv.start <= iv.end && iv.end <= page_count,
            "interval {iv:?} invalid for {page_count} pages (spec {spec:?})"
        );
    }
    assert!(ranges.pages().all(|p| (1..=page_count).contains(&p)));
    assert!(ranges.len() <= spec.split(',').count());

    // Strict parsing agrees with lenient parsing whenever it accepts.
    if let Ok(strict) = parse_strict(spec, page_count) {
        assert_eq!(strict, ranges);
        assert!(spec.is_empty() || is_range(spec));
    }
});
