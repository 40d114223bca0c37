//! Fuzz-style tests for the statement gate.
//!
//! The gate faces adversarial input by construction, so it must return a
//! definitive verdict for anything: random bytes, hostile injections,
//! pathological lengths. No input may panic it, and verdicts must be stable.

use echodb_mcp_server::tools::classifier::{ClassifierPolicy, classify};
use rand::Rng;
use rand::distributions::Alphanumeric;

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Hand-picked hostile and degenerate inputs.
fn edge_case_strings() -> Vec<String> {
    vec![
        String::new(),
        " ".to_string(),
        "\n\r\t".to_string(),
        "\0".to_string(),
        "üöÄ".repeat(100),
        "'OR 1=1--".to_string(),
        "'; DROP TABLE users--".to_string(),
        "SELECT * FROM users; DELETE FROM logs;".to_string(),
        "SELECT/**/1".to_string(),
        "/*".to_string(),
        "--".to_string(),
        "-- no newline after comment".to_string(),
        "/* unterminated".to_string(),
        ";".repeat(1000),
        "select".to_string(),
        "select;".to_string(),
        "with".to_string(),
        "a".repeat(10_000),
        "SELECT ".to_string() + &"x, ".repeat(5_000),
        "\u{0000}\u{FFFF}".to_string(),
        "ＳＥＬＥＣＴ 1".to_string(), // fullwidth, not ASCII "SELECT"
    ]
}

const POLICIES: [ClassifierPolicy; 4] = [
    ClassifierPolicy {
        allow_cte: true,
        keyword_blocklist: false,
    },
    ClassifierPolicy {
        allow_cte: false,
        keyword_blocklist: false,
    },
    ClassifierPolicy {
        allow_cte: true,
        keyword_blocklist: true,
    },
    ClassifierPolicy {
        allow_cte: false,
        keyword_blocklist: true,
    },
];

#[test]
fn fuzz_edge_cases_never_panic() {
    for sql in edge_case_strings() {
        for policy in &POLICIES {
            // A verdict of either kind is fine; not returning is not
            let _ = classify(&sql, policy);
        }
    }
}

#[test]
fn fuzz_random_strings_never_panic_and_are_stable() {
    for _ in 0..200 {
        let len = rand::thread_rng().gen_range(0..512);
        let sql = random_string(len);
        for policy in &POLICIES {
            let first = classify(&sql, policy);
            assert_eq!(classify(&sql, policy), first, "unstable verdict: {:?}", sql);
        }
    }
}

#[test]
fn fuzz_random_prefixed_selects() {
    // Random garbage after a valid SELECT prefix: verdict depends only on
    // semicolons and (in strict mode) keywords, and must never panic.
    for _ in 0..100 {
        let sql = format!("SELECT {}", random_string(64));
        let verdict = classify(&sql, &POLICIES[0]);
        // Alphanumeric suffix contains no semicolon, so it stays accepted
        assert!(verdict.is_accept(), "unexpected reject: {:?}", sql);
    }
}

#[test]
fn fuzz_fullwidth_select_is_not_select() {
    // Unicode look-alikes must not satisfy the ASCII keyword anchor
    assert!(!classify("ＳＥＬＥＣＴ 1", &POLICIES[0]).is_accept());
}
