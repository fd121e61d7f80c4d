// src/version.rs

//! Version comparison and dependency-line parsing
//!
//! Versions follow the pacman `[epoch:]version[-release]` format and are
//! compared segment by segment the way `vercmp` does. Dependency lines such
//! as `foo>=1.2-3` are parsed into a `ConflictSpec`: a target name plus a
//! version predicate.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// Compare two pacman versions
///
/// The epoch is compared first, then the version, then the release. The
/// release only takes part when both sides carry one, so `1.0` equals
/// `1.0-3`.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let left = Evr::parse(a);
    let right = Evr::parse(b);

    segment_cmp(left.epoch, right.epoch)
        .then_with(|| segment_cmp(left.version, right.version))
        .then_with(|| match (left.release, right.release) {
            (Some(l), Some(r)) => segment_cmp(l, r),
            _ => Ordering::Equal,
        })
}

/// Borrowed epoch/version/release split of a version string
struct Evr<'a> {
    epoch: &'a str,
    version: &'a str,
    release: Option<&'a str>,
}

impl<'a> Evr<'a> {
    fn parse(s: &'a str) -> Self {
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        let (epoch, rest) = if s.as_bytes().get(digits) == Some(&b':') {
            let epoch = if digits == 0 { "0" } else { &s[..digits] };
            (epoch, &s[digits + 1..])
        } else {
            ("0", s)
        };

        match rest.rsplit_once('-') {
            Some((version, release)) => Self {
                epoch,
                version,
                release: Some(release),
            },
            None => Self {
                epoch,
                version: rest,
                release: None,
            },
        }
    }
}

/// Compare two version fragments by alternating numeric and alphabetic runs
fn segment_cmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let (sep_start_a, sep_start_b) = (i, j);
        while i < a.len() && !a[i].is_ascii_alphanumeric() {
            i += 1;
        }
        while j < b.len() && !b[j].is_ascii_alphanumeric() {
            j += 1;
        }
        if i >= a.len() || j >= b.len() {
            break;
        }

        // More separators sort higher: "1..0" > "1.0"
        let (sep_a, sep_b) = (i - sep_start_a, j - sep_start_b);
        if sep_a != sep_b {
            return sep_a.cmp(&sep_b);
        }

        let numeric = a[i].is_ascii_digit();
        let in_run = |c: u8| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        };
        let end_a = i + a[i..].iter().take_while(|&&c| in_run(c)).count();
        let end_b = j + b[j..].iter().take_while(|&&c| in_run(c)).count();
        let (run_a, run_b) = (&a[i..end_a], &b[j..end_b]);

        // Runs of different kinds: numeric beats alphabetic
        if run_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let run_a = trim_zeros(run_a);
            let run_b = trim_zeros(run_b);
            run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b))
        } else {
            run_a.cmp(run_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        i = end_a;
        j = end_b;
    }

    let a_done = i >= a.len();
    let b_done = j >= b.len();
    if a_done && b_done {
        return Ordering::Equal;
    }

    // A trailing alphabetic run never beats an empty one: "1.0a" < "1.0"
    let a_alpha = !a_done && a[i].is_ascii_alphabetic();
    let b_alpha = !b_done && b[j].is_ascii_alphabetic();
    if (a_done && !b_alpha) || a_alpha {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn trim_zeros(run: &[u8]) -> &[u8] {
    let zeros = run.iter().take_while(|&&c| c == b'0').count();
    &run[zeros..]
}

/// Comparison operator of a versioned dependency line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    GreaterThan,
    LessThan,
}

impl Operator {
    /// Checked in this order so `>=` is not mistaken for `=` or `>`
    const ALL: [(&'static str, Operator); 5] = [
        (">=", Operator::GreaterOrEqual),
        ("<=", Operator::LessOrEqual),
        ("=", Operator::Equal),
        (">", Operator::GreaterThan),
        ("<", Operator::LessThan),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            Operator::GreaterOrEqual => ord != Ordering::Less,
            Operator::LessOrEqual => ord != Ordering::Greater,
            Operator::Equal => ord == Ordering::Equal,
            Operator::GreaterThan => ord == Ordering::Greater,
            Operator::LessThan => ord == Ordering::Less,
        }
    }
}

/// A parsed conflicts/replaces/provides line
///
/// Two specs with the same `name` are not interchangeable; whether one
/// applies to a package depends on evaluating its predicate against that
/// package's concrete version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSpec {
    pub name: String,
    pub constraint: Option<(Operator, String)>,
}

impl ConflictSpec {
    /// Parse a dependency line
    ///
    /// Examples:
    /// - "foo" → any version of foo
    /// - "foo>=1.2" → foo at 1.2 or newer
    /// - "foo=2:1.0-3" → exactly epoch 2, version 1.0, release 3
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();

        let spec = match Operator::ALL
            .iter()
            .find_map(|(token, op)| line.split_once(token).map(|(n, v)| (n, *op, v)))
        {
            Some((name, op, version)) => {
                let version = version.trim();
                if version.is_empty() {
                    return Err(Error::InvalidDependency(format!(
                        "'{}' has an operator but no version",
                        line
                    )));
                }
                Self {
                    name: name.trim().to_string(),
                    constraint: Some((op, version.to_string())),
                }
            }
            None => Self {
                name: line.to_string(),
                constraint: None,
            },
        };

        if spec.name.is_empty() {
            return Err(Error::InvalidDependency(format!("'{}' has no package name", line)));
        }

        Ok(spec)
    }

    /// Evaluate the version predicate
    pub fn matches(&self, version: &str) -> bool {
        match &self.constraint {
            None => true,
            Some((op, wanted)) => op.accepts(vercmp(version, wanted)),
        }
    }
}

impl fmt::Display for ConflictSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((op, version)) = &self.constraint {
            write!(f, "{}{}", op.as_str(), version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vercmp_simple() {
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("1.0", "1.1"), Ordering::Less);
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_vercmp_alpha() {
        assert_eq!(vercmp("1.0a", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0a", "1.0b"), Ordering::Less);
        assert_eq!(vercmp("1.0alpha", "1.0.1"), Ordering::Less);
        assert_eq!(vercmp("1.0", "1.0rc1"), Ordering::Greater);
    }

    #[test]
    fn test_vercmp_leading_zeros() {
        assert_eq!(vercmp("1.001", "1.1"), Ordering::Equal);
        assert_eq!(vercmp("1.010", "1.9"), Ordering::Greater);
    }

    #[test]
    fn test_vercmp_epoch() {
        assert_eq!(vercmp("1:1.0", "2.0"), Ordering::Greater);
        assert_eq!(vercmp("1:1.0", "2:0.1"), Ordering::Less);
        assert_eq!(vercmp("0:1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_vercmp_release() {
        assert_eq!(vercmp("1.0-1", "1.0-2"), Ordering::Less);
        assert_eq!(vercmp("1.0-10", "1.0-9"), Ordering::Greater);
        // Release is ignored when one side has none
        assert_eq!(vercmp("1.0-3", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_vercmp_git_style() {
        assert_eq!(vercmp("0.2+9+123abc-1", "0.3-1"), Ordering::Less);
        assert_eq!(vercmp("r120.abcdef-1", "r121.012345-1"), Ordering::Less);
    }

    #[test]
    fn test_parse_unversioned() {
        let spec = ConflictSpec::parse("foo").unwrap();
        assert_eq!(spec.name, "foo");
        assert!(spec.constraint.is_none());
        assert!(spec.matches("0.0.1"));
    }

    #[test]
    fn test_parse_operators() {
        let cases = [
            ("foo>=1.2", Operator::GreaterOrEqual),
            ("foo<=1.2", Operator::LessOrEqual),
            ("foo=1.2", Operator::Equal),
            ("foo>1.2", Operator::GreaterThan),
            ("foo<1.2", Operator::LessThan),
        ];
        for (line, op) in cases {
            let spec = ConflictSpec::parse(line).unwrap();
            assert_eq!(spec.name, "foo", "{}", line);
            assert_eq!(spec.constraint, Some((op, "1.2".to_string())), "{}", line);
            assert_eq!(spec.to_string(), line);
        }
    }

    #[test]
    fn test_matches() {
        let spec = ConflictSpec::parse("foo<2.0").unwrap();
        assert!(spec.matches("1.9-1"));
        assert!(!spec.matches("2.0-1"));
        assert!(!spec.matches("1:0.5"));

        let exact = ConflictSpec::parse("foo=1.0").unwrap();
        assert!(exact.matches("1.0-4"));
        assert!(!exact.matches("1.0.1-1"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            ConflictSpec::parse(">=1.0"),
            Err(Error::InvalidDependency(_))
        ));
        assert!(matches!(
            ConflictSpec::parse("foo>="),
            Err(Error::InvalidDependency(_))
        ));
        assert!(ConflictSpec::parse("  ").is_err());
    }
}
