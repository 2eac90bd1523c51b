//! Integration tests running the fzx binary in filter mode.
//!
//! Filter mode never touches the terminal, so every case pipes its input
//! through stdin and inspects stdout and the exit code.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run fzx with `args`, feeding `input` on stdin
fn fzx(args: &[&str], input: &[u8]) -> Output {
    let config_home = tempfile::tempdir().expect("Failed to create config dir");
    let mut child = Command::new(env!("CARGO_BIN_EXE_fzx"))
        .args(args)
        // Keep a user's config file out of the picture
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("FZX_LOG")
        .env_remove("FZX_DEFAULT_COMMAND")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run fzx");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input)
        .expect("Failed to write input");
    child.wait_with_output().expect("Failed to wait for fzx")
}

fn lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect()
}

#[test]
fn test_fuzzy_filter_order() {
    let output = fzx(&["--filter", "app"], b"apple\napply\nsnapple\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(lines(&output), vec!["apple", "apply", "snapple"]);
}

#[test]
fn test_filter_is_stable_across_runs() {
    let input = b"src/main.rs\nsrc/matcher.rs\nsrc/ui/menu.rs\nREADME.md\nsrc/mod.rs\n";
    let first = fzx(&["-f", "mrs"], input);
    let second = fzx(&["-f", "mrs"], input);
    assert!(!first.stdout.is_empty());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_extended_prefix_and_suffix() {
    let output = fzx(&["--filter", "^a ply$"], b"apply\nhappily\natomically\n");
    assert_eq!(lines(&output), vec!["apply"]);
}

#[test]
fn test_inverse_term() {
    let output = fzx(&["--filter", "!foo"], b"foobar\nbarfoo\nbaz\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(lines(&output), vec!["baz"]);
}

#[test]
fn test_unsorted_keeps_input_order() {
    let output = fzx(&["+s", "--filter", ""], b"3\n1\n2\n");
    assert_eq!(lines(&output), vec!["3", "1", "2"]);

    let output = fzx(&["--no-sort", "--filter", ""], b"3\n1\n2\n");
    assert_eq!(lines(&output), vec!["3", "1", "2"]);
}

#[test]
fn test_tac_reverses_input_order() {
    let output = fzx(&["--tac", "--no-sort", "--filter", ""], b"3\n1\n2\n");
    assert_eq!(lines(&output), vec!["2", "1", "3"]);
}

#[test]
fn test_all_matches_printed_past_sort_cap() {
    let input: String = (0..1500).map(|i| format!("item {i}\n")).collect();
    let output = fzx(&["--filter", "item"], input.as_bytes());
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(lines(&output).len(), 1500);
}

#[test]
fn test_no_match_exit_code() {
    let output = fzx(&["--filter", "zzz"], b"apple\nbanana\n");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_print_query_first() {
    let output = fzx(&["--print-query", "--filter", "ban"], b"apple\nbanana\n");
    assert_eq!(lines(&output), vec!["ban", "banana"]);
}

#[test]
fn test_print0_and_read0() {
    let output = fzx(&["--read0", "--print0", "--no-sort", "--filter", "line"], b"first line\nwith newline\0second line\0other\0");
    assert_eq!(output.stdout, b"first line\nwith newline\0second line\0");
}

#[test]
fn test_quoted_term_is_whole_line() {
    let input = b"apple\npineapple\napplesauce\n";
    assert_eq!(lines(&fzx(&["--filter", "'apple"], input)), vec!["apple"]);
    assert_eq!(lines(&fzx(&["-e", "--filter", "'apple"], input)), vec!["apple"]);
    let output = fzx(&["--filter", "!'apple"], input);
    assert_eq!(lines(&output), vec!["pineapple", "applesauce"]);
}

#[test]
fn test_exact_flag() {
    let output = fzx(&["-e", "--filter", "ab"], b"a_b\nxaby\n");
    assert_eq!(lines(&output), vec!["xaby"]);
}

#[test]
fn test_case_flags() {
    let input = b"Apple\napple\n";
    assert_eq!(lines(&fzx(&["--filter", "Apple"], input)), vec!["Apple"]);
    assert_eq!(lines(&fzx(&["-i", "--filter", "Apple"], input)).len(), 2);
    assert_eq!(lines(&fzx(&["+i", "--filter", "apple"], input)), vec!["apple"]);
}

#[test]
fn test_nth_limits_search_scope() {
    let output = fzx(&["--nth", "2", "--filter", "foo"], b"foo bar\nbar foo\n");
    assert_eq!(lines(&output), vec!["bar foo"]);
}

#[test]
fn test_with_nth_prints_original_line() {
    let output = fzx(&["--with-nth", "2", "--filter", "bar"], b"1 bar\n2 baz\n3 bar\n");
    assert_eq!(lines(&output), vec!["1 bar", "3 bar"]);
}

#[test]
fn test_or_groups() {
    let output = fzx(&["--no-sort", "--filter", "^core | ^main"], b"core.rs\nlib.rs\nmain.rs\n");
    assert_eq!(lines(&output), vec!["core.rs", "main.rs"]);
}

#[test]
fn test_bad_tiebreak_is_error() {
    let output = fzx(&["--tiebreak", "bogus", "--filter", "a"], b"a\n");
    assert_eq!(output.status.code(), Some(2));
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_select_1_prints_single_match() {
    let output = fzx(&["--select-1", "--query", "ban"], b"apple\nbanana\n");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(lines(&output), vec!["banana"]);
}

#[test]
fn test_exit_0_without_match() {
    let output = fzx(&["--exit-0", "--print-query", "--query", "zzz"], b"apple\nbanana\n");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(lines(&output), vec!["zzz"]);
}
