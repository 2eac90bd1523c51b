#![no_main]

use fzx::item::tokenizer::{Delimiter, parse_ranges, tokenize, transform};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (expr, line) = data;
    // Field expressions come straight from the command line
    let Ok(ranges) = parse_ranges(expr) else {
        return;
    };
    let tokens = tokenize(line, &Delimiter::Awk);
    let len = line.chars().count();
    assert!(tokens.iter().all(|t| t.prefix_len + t.text.len() <= len));
    let _ = transform(&tokens, &ranges);
});
