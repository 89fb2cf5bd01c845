//! Test verdicts

use serde::Serialize;
use std::fmt;

/// Outcome of running one script or a batch of scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    Pass,
    Skip,
    Fail,
}

impl TestResult {
    /// Combines two verdicts
    ///
    /// Fail dominates Skip, which dominates Pass, so folding a batch gives the same
    /// verdict in any order.
    pub fn merge(self, other: TestResult) -> TestResult {
        match (self, other) {
            (TestResult::Fail, _) | (_, TestResult::Fail) => TestResult::Fail,
            (TestResult::Skip, _) | (_, TestResult::Skip) => TestResult::Skip,
            _ => TestResult::Pass,
        }
    }

    /// Process exit status conventionally used for the verdict
    pub fn exit_code(self) -> i32 {
        match self {
            TestResult::Pass => 0,
            TestResult::Fail => 1,
            TestResult::Skip => 77,
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Pass => write!(f, "pass"),
            TestResult::Skip => write!(f, "skip"),
            TestResult::Fail => write!(f, "fail"),
        }
    }
}

impl FromIterator<TestResult> for TestResult {
    /// Folds a batch of verdicts; an empty batch passes
    fn from_iter<I: IntoIterator<Item = TestResult>>(iter: I) -> Self {
        iter.into_iter().fold(TestResult::Pass, TestResult::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TestResult; 3] = [TestResult::Pass, TestResult::Skip, TestResult::Fail];

    #[test]
    fn test_merge_precedence() {
        assert_eq!(TestResult::Pass.merge(TestResult::Pass), TestResult::Pass);
        assert_eq!(TestResult::Pass.merge(TestResult::Skip), TestResult::Skip);
        assert_eq!(TestResult::Skip.merge(TestResult::Fail), TestResult::Fail);
        assert_eq!(TestResult::Fail.merge(TestResult::Pass), TestResult::Fail);
    }

    #[test]
    fn test_merge_is_commutative_and_associative() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a.merge(b), b.merge(a));
                for c in ALL {
                    assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
                }
            }
        }
    }

    #[test]
    fn test_batch_fold() {
        assert_eq!(std::iter::empty().collect::<TestResult>(), TestResult::Pass);
        assert_eq!([TestResult::Pass, TestResult::Skip, TestResult::Pass].into_iter().collect::<TestResult>(), TestResult::Skip);
        assert_eq!(TestResult::Skip.to_string(), "skip");
        assert_eq!(TestResult::Skip.exit_code(), 77);
    }
}
