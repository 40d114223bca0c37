//! SQL statement classification for read-only enforcement.
//!
//! This module decides whether a raw SQL string — typically produced by an
//! LLM, and therefore adversarial by construction — is a single, read-only
//! SELECT statement. It is a conservative allow/deny gate, deliberately not a
//! SQL parser: it strips leading comments, anchors on the first keyword,
//! rejects stacked statements, and optionally scans for forbidden keywords.
//! It cannot see into subqueries or string literals and trades recall for a
//! small, auditable correctness envelope. The database-session read-only flag
//! set by the executor is the second, independent layer.
//!
//! The classifier is a pure function: no I/O, no state, and it never panics
//! or errors on malformed input — every string gets a definitive verdict.

/// Whole-word keywords rejected by the blocklist variant.
const FORBIDDEN_KEYWORDS: [&str; 9] = [
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "grant", "revoke",
];

/// Classification verdict for a candidate statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    /// True if the statement may be executed.
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// The specific rule a rejected statement violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The statement does not start with SELECT (or WITH, when accepted).
    NotSelect { cte_allowed: bool },
    /// A semicolon remains after stripping one optional trailing semicolon,
    /// signalling a second statement.
    MultipleStatements,
    /// The blocklist variant found a forbidden whole-word keyword.
    ForbiddenKeyword(String),
}

impl RejectReason {
    /// Agent-facing denial message naming the violated rule.
    pub fn message(&self) -> String {
        match self {
            Self::NotSelect { cte_allowed: true } => {
                "Only single SELECT statements (optionally starting with WITH) are allowed."
                    .to_string()
            }
            Self::NotSelect { cte_allowed: false } => {
                "Only single SELECT statements are allowed.".to_string()
            }
            Self::MultipleStatements => {
                "Multiple SQL statements are not allowed; submit a single SELECT.".to_string()
            }
            Self::ForbiddenKeyword(kw) => {
                format!("Statement contains the forbidden keyword '{}'.", kw)
            }
        }
    }
}

/// Classifier configuration, fixed at process startup.
///
/// Two variants of this gate exist in the wild: a prefix-anchor-only check
/// and a stricter one that additionally scans for write keywords. Both are
/// expressible here rather than merged; defaults accept CTEs and leave the
/// blocklist off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierPolicy {
    /// Accept statements starting with WITH (common-table expressions).
    pub allow_cte: bool,
    /// Additionally reject statements containing forbidden whole-word
    /// keywords anywhere in their text (including string literals — the
    /// false-positive-tolerant stricter mode).
    pub keyword_blocklist: bool,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            allow_cte: true,
            keyword_blocklist: false,
        }
    }
}

/// Classify a candidate SQL statement.
///
/// A byte-identical statement is reclassified on every call; verdicts are
/// never cached.
///
/// # Examples
///
/// ```
/// use echodb_mcp_server::tools::classifier::{classify, ClassifierPolicy};
///
/// let policy = ClassifierPolicy::default();
/// assert!(classify("SELECT * FROM users", &policy).is_accept());
/// assert!(!classify("DROP TABLE users", &policy).is_accept());
/// assert!(!classify("SELECT 1; SELECT 2", &policy).is_accept());
/// ```
pub fn classify(sql: &str, policy: &ClassifierPolicy) -> Verdict {
    let body = strip_leading_comments(sql);
    let body = strip_trailing_semicolon(body);

    let is_select = starts_with_word(body, "select")
        || (policy.allow_cte && starts_with_word(body, "with"));
    if !is_select {
        return Verdict::Reject(RejectReason::NotSelect {
            cte_allowed: policy.allow_cte,
        });
    }

    if body.contains(';') {
        return Verdict::Reject(RejectReason::MultipleStatements);
    }

    if policy.keyword_blocklist {
        for keyword in FORBIDDEN_KEYWORDS {
            if contains_word(body, keyword) {
                return Verdict::Reject(RejectReason::ForbiddenKeyword(keyword.to_string()));
            }
        }
    }

    Verdict::Accept
}

/// Strip leading whitespace and leading comment runs, repeatedly, from the
/// start of the string only. An unterminated comment consumes the rest.
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("--") {
            match after.find('\n') {
                Some(idx) => rest = &after[idx + 1..],
                None => return "",
            }
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            match after.find("*/") {
                Some(idx) => rest = &after[idx + 2..],
                None => return "",
            }
        } else {
            return trimmed;
        }
    }
}

/// Strip one optional trailing `;` and any trailing whitespace.
fn strip_trailing_semicolon(sql: &str) -> &str {
    let trimmed = sql.trim_end();
    match trimmed.strip_suffix(';') {
        Some(head) => head.trim_end(),
        None => trimmed,
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Case-insensitive check that `text` starts with `word` at a word boundary
/// (equivalent to anchoring `^word\b`).
fn starts_with_word(text: &str, word: &str) -> bool {
    match text.get(..word.len()) {
        Some(head) if head.eq_ignore_ascii_case(word) => text.as_bytes()[word.len()..]
            .first()
            .is_none_or(|&b| !is_word_byte(b)),
        _ => false,
    }
}

/// Case-insensitive whole-word search. Word boundaries are non-alphanumeric,
/// non-underscore bytes, so `update` does not match inside `last_update`.
fn contains_word(text: &str, word: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut start = 0;
    while let Some(pos) = lower[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let boundary_before = begin == 0 || !is_word_byte(bytes[begin - 1]);
        let boundary_after = end == bytes.len() || !is_word_byte(bytes[end]);
        if boundary_before && boundary_after {
            return true;
        }
        start = begin + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: ClassifierPolicy = ClassifierPolicy {
        allow_cte: true,
        keyword_blocklist: false,
    };

    const STRICT: ClassifierPolicy = ClassifierPolicy {
        allow_cte: true,
        keyword_blocklist: true,
    };

    fn accepted(sql: &str, policy: &ClassifierPolicy) -> bool {
        classify(sql, policy).is_accept()
    }

    // =========================================================================
    // Prefix anchoring
    // =========================================================================

    #[test]
    fn test_select_accepted() {
        assert!(accepted("SELECT * FROM users", &DEFAULT));
        assert!(accepted("select 1", &DEFAULT));
        assert!(accepted("  \n\t SELECT 1", &DEFAULT));
    }

    #[test]
    fn test_case_mixed_select_accepted() {
        assert!(accepted("SeLeCt * FrOm users", &DEFAULT));
    }

    #[test]
    fn test_insert_rejected() {
        let verdict = classify("INSERT INTO users VALUES (1)", &DEFAULT);
        assert_eq!(
            verdict,
            Verdict::Reject(RejectReason::NotSelect { cte_allowed: true })
        );
    }

    #[test]
    fn test_ddl_rejected() {
        assert!(!accepted("DROP TABLE users", &DEFAULT));
        assert!(!accepted("CREATE TABLE t (id INT)", &DEFAULT));
        assert!(!accepted("ALTER TABLE t ADD COLUMN c INT", &DEFAULT));
        assert!(!accepted("TRUNCATE t", &DEFAULT));
    }

    #[test]
    fn test_select_must_be_whole_word() {
        // "selection" is not the SELECT keyword
        assert!(!accepted("selection of things", &DEFAULT));
        assert!(!accepted("selectx", &DEFAULT));
    }

    #[test]
    fn test_empty_and_garbage_rejected_without_panic() {
        assert!(!accepted("", &DEFAULT));
        assert!(!accepted("   ", &DEFAULT));
        assert!(!accepted(";", &DEFAULT));
        assert!(!accepted("\0\u{FFFF}", &DEFAULT));
        assert!(!accepted("-- only a comment", &DEFAULT));
    }

    // =========================================================================
    // Comment stripping
    // =========================================================================

    #[test]
    fn test_leading_line_comment_stripped() {
        assert!(accepted("-- a comment\nSELECT 1", &DEFAULT));
        assert!(accepted("-- one\n-- two\nSELECT 1", &DEFAULT));
    }

    #[test]
    fn test_leading_block_comment_stripped() {
        assert!(accepted("/* multi\nline */ SELECT 1", &DEFAULT));
        assert!(accepted("/* a */ /* b */\nSELECT 1", &DEFAULT));
    }

    #[test]
    fn test_comment_does_not_hide_write() {
        assert!(!accepted("-- harmless\nDELETE FROM users", &DEFAULT));
        assert!(!accepted("/* harmless */ UPDATE users SET a = 1", &DEFAULT));
    }

    #[test]
    fn test_unterminated_block_comment_rejected() {
        assert!(!accepted("/* never closed SELECT 1", &DEFAULT));
    }

    #[test]
    fn test_trailing_comment_does_not_defeat_validation() {
        // Comments after the statement body are not stripped, but contain no
        // semicolon, so a plain SELECT still passes.
        assert!(accepted("SELECT * FROM users -- trailing\n", &DEFAULT));
    }

    // =========================================================================
    // Stacked statements
    // =========================================================================

    #[test]
    fn test_trailing_semicolon_accepted() {
        assert!(accepted("SELECT 1;", &DEFAULT));
        assert!(accepted("SELECT 1 ;  \n", &DEFAULT));
    }

    #[test]
    fn test_stacked_statements_rejected() {
        let verdict = classify("SELECT 1; SELECT 2", &DEFAULT);
        assert_eq!(verdict, Verdict::Reject(RejectReason::MultipleStatements));
    }

    #[test]
    fn test_stacked_write_rejected() {
        assert!(!accepted("SELECT 1; DROP TABLE users;", &DEFAULT));
    }

    #[test]
    fn test_semicolon_in_string_literal_rejected() {
        // A known false positive: the gate cannot see into literals and
        // prefers denying a legitimate query over parsing SQL.
        assert!(!accepted("SELECT * FROM t WHERE name = 'a;b'", &DEFAULT));
    }

    // =========================================================================
    // CTE policy
    // =========================================================================

    #[test]
    fn test_cte_accepted_by_default() {
        assert!(accepted(
            "WITH recent AS (SELECT * FROM orders) SELECT * FROM recent",
            &DEFAULT
        ));
    }

    #[test]
    fn test_cte_rejected_when_disallowed() {
        let no_cte = ClassifierPolicy {
            allow_cte: false,
            ..DEFAULT
        };
        let verdict = classify("WITH x AS (SELECT 1) SELECT * FROM x", &no_cte);
        assert_eq!(
            verdict,
            Verdict::Reject(RejectReason::NotSelect { cte_allowed: false })
        );
        assert!(accepted("SELECT 1", &no_cte));
    }

    #[test]
    fn test_with_must_be_whole_word() {
        assert!(!accepted("withdrawal FROM account", &DEFAULT));
    }

    // =========================================================================
    // Keyword blocklist
    // =========================================================================

    #[test]
    fn test_blocklist_rejects_embedded_write_keyword() {
        let verdict = classify(
            "SELECT * FROM t WHERE x = (DELETE FROM t2)",
            &STRICT,
        );
        assert_eq!(
            verdict,
            Verdict::Reject(RejectReason::ForbiddenKeyword("delete".to_string()))
        );
    }

    #[test]
    fn test_blocklist_word_boundary_no_false_positive() {
        // "update" inside an identifier must not trigger rejection
        assert!(accepted("SELECT * FROM last_update_log", &STRICT));
        assert!(accepted("SELECT created_at FROM t", &STRICT));
        assert!(accepted("SELECT updated, inserted FROM audit", &STRICT));
    }

    #[test]
    fn test_blocklist_case_insensitive() {
        assert!(!accepted("SELECT * FROM t WHERE a = DrOp", &STRICT));
    }

    #[test]
    fn test_blocklist_off_by_default() {
        // Without the blocklist, only the prefix anchor applies
        assert!(accepted("SELECT 'please delete this row'", &DEFAULT));
    }

    #[test]
    fn test_blocklist_hits_string_literals() {
        // Documented false positive of the stricter mode
        assert!(!accepted("SELECT 'please delete this row'", &STRICT));
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    #[test]
    fn test_classification_is_idempotent() {
        let samples = [
            "SELECT 1",
            "SELECT 1; SELECT 2",
            "DROP TABLE users",
            "-- c\nSELECT * FROM t;",
            "",
        ];
        for sql in samples {
            assert_eq!(classify(sql, &DEFAULT), classify(sql, &DEFAULT));
            assert_eq!(classify(sql, &STRICT), classify(sql, &STRICT));
        }
    }

    #[test]
    fn test_reject_messages_name_the_rule() {
        assert!(
            RejectReason::MultipleStatements
                .message()
                .contains("Multiple")
        );
        assert!(
            RejectReason::NotSelect { cte_allowed: true }
                .message()
                .contains("SELECT")
        );
        assert!(
            RejectReason::ForbiddenKeyword("drop".into())
                .message()
                .contains("drop")
        );
    }
}
