use log::info;
use fitview::range::{parse, parse_strict};

fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: reproduce <fuzz_range-artifact>");
        std::process::exit(1);
    });

    let data = std::fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read {path}: {e}");
        std::process::exit(1);
    });

    let Some((&count_byte, rest)) = data.split_first() else {
        eprintln!("Artifact is empty");
        std::process::exit(1);
    };
    let spec = match std::str::from_utf8(rest) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Range is not valid UTF-8: {e}");
            std::process::exit(1);
        }
    };
    let page_count = usize::from(count_byte);

    info!("reproduce: spec={spec:?} pages={page_count}");
    eprintln!("spec:    {spec:?}");
    eprintln!("pages:   {page_count}");
    eprintln!("lenient: {:?}", parse(spec, page_count).intervals());
    match parse_strict(spec, page_count) {
        Ok(r) => eprintln!("strict:  {:?}", r.intervals()),
        Err(e) => eprintln!("strict:  {e}"),
    }
}
