//! # Argument Screener
//!
//! Blocklist screening of command arguments for shell metacharacters,
//! substitution syntax, and variable expansion. Pure functions, no side
//! effects, fail-closed: the first matching pattern rejects the whole
//! request.
//!
//! A blocklist is inherently incomplete as a security boundary; it is kept
//! here as the baseline contract, layered under the path resolver's
//! containment check rather than replacing it. See DESIGN.md for the
//! allow-list tokenizer alternative.
//!
//! The navigation command's single argument is exempt: it is a path and is
//! validated by the resolver instead.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SandboxError;

/// Ordered blocklist. Multi-character operators come before their
/// single-character prefixes so the reported reason is accurate.
static DANGEROUS_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\$\(", "command substitution"),
        (r"`", "command substitution"),
        (r"\$\{", "variable expansion"),
        (r"\$[A-Za-z_]", "environment variable expansion"),
        (r"&&", "command chaining"),
        (r"\|\|", "command chaining"),
        (r";", "command chaining"),
        (r"\|", "pipe"),
        (r"&", "background execution"),
        (r">", "output redirection"),
        (r"<", "input redirection"),
    ]
    .into_iter()
    .map(|(pattern, reason)| {
        (
            Regex::new(pattern).expect("dangerous-pattern regex must compile"),
            reason,
        )
    })
    .collect()
});

/// Screen a single argument. `..` anywhere is reported as traversal
/// (defense-in-depth: path-shaped arguments are also contain-checked by the
/// resolver), everything else on the blocklist as a dangerous pattern.
pub fn screen(arg: &str) -> Result<(), SandboxError> {
    if arg.contains("..") {
        return Err(SandboxError::PathTraversalDetected {
            argument: arg.to_string(),
        });
    }

    for (pattern, reason) in DANGEROUS_PATTERNS.iter() {
        if pattern.is_match(arg) {
            return Err(SandboxError::DangerousArgumentPattern {
                argument: arg.to_string(),
                reason: *reason,
            });
        }
    }

    Ok(())
}

/// Screen every argument of a request; first rejection wins.
pub fn screen_all(args: &[String]) -> Result<(), SandboxError> {
    for arg in args {
        screen(arg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_arguments_pass() {
        for arg in ["-la", "hello", "docs", "file.txt", "--color=auto", "a b"] {
            assert!(screen(arg).is_ok(), "should pass: {}", arg);
        }
    }

    #[test]
    fn test_substitution_rejected() {
        for arg in ["$(whoami)", "`id`", "x$(y)z"] {
            let err = screen(arg).unwrap_err();
            assert!(
                matches!(
                    err,
                    SandboxError::DangerousArgumentPattern {
                        reason: "command substitution",
                        ..
                    }
                ),
                "wrong rejection for {}: {}",
                arg,
                err
            );
        }
    }

    #[test]
    fn test_expansion_rejected() {
        assert!(matches!(
            screen("$HOME").unwrap_err(),
            SandboxError::DangerousArgumentPattern {
                reason: "environment variable expansion",
                ..
            }
        ));
        assert!(matches!(
            screen("${PATH}").unwrap_err(),
            SandboxError::DangerousArgumentPattern {
                reason: "variable expansion",
                ..
            }
        ));
    }

    #[test]
    fn test_chaining_pipes_and_redirection_rejected() {
        let cases = [
            ("a && b", "command chaining"),
            ("a || b", "command chaining"),
            ("a;b", "command chaining"),
            ("a | b", "pipe"),
            ("a &", "background execution"),
            ("out > f", "output redirection"),
            (">>log", "output redirection"),
            ("< input", "input redirection"),
        ];
        for (arg, expected_reason) in cases {
            match screen(arg).unwrap_err() {
                SandboxError::DangerousArgumentPattern { reason, .. } => {
                    assert_eq!(reason, expected_reason, "for {}", arg);
                }
                other => panic!("unexpected error for {}: {}", arg, other),
            }
        }
    }

    #[test]
    fn test_traversal_rejected_as_traversal() {
        for arg in ["..", "../secret", "a/../../b", "--path=../x"] {
            assert!(matches!(
                screen(arg).unwrap_err(),
                SandboxError::PathTraversalDetected { .. }
            ));
        }
    }

    #[test]
    fn test_first_rejection_wins() {
        let args = vec![
            "fine".to_string(),
            "$(bad)".to_string(),
            "also | bad".to_string(),
        ];
        let err = screen_all(&args).unwrap_err();
        assert!(format!("{err}").contains("$(bad)"));
    }
}
