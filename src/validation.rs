// SPDX-License-Identifier: AGPL-3.0-only

//! Pass/fail harness for validation binaries.
//!
//! A validation binary runs a fixed set of numerical checks against known
//! answers (analytic Chebyshev values, dense-matrix references, physical
//! bounds), prints one line per check and exits 0 only if every check
//! passed.

use std::fmt::{self, Write as _};
use std::process;

/// How a check compares observed and expected values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceMode {
    /// |observed − expected| < tolerance
    Absolute,
    /// |observed − expected| / |expected| < tolerance
    Relative,
    /// observed < threshold
    UpperBound,
    /// pass/fail without a numeric comparison
    Boolean,
}

impl fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absolute => "abs",
            Self::Relative => "rel",
            Self::UpperBound => "<",
            Self::Boolean => "bool",
        })
    }
}

/// One recorded check.
#[derive(Debug, Clone)]
pub struct Check {
    /// Human-readable label
    pub label: String,
    /// Whether this check passed
    pub passed: bool,
    /// Observed value
    pub observed: f64,
    /// Expected value (the threshold for upper bounds)
    pub expected: f64,
    /// Tolerance used
    pub tolerance: f64,
    /// How the tolerance was applied
    pub mode: ToleranceMode,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = if self.passed { "✓" } else { "✗" };
        if self.mode == ToleranceMode::Boolean {
            return write!(f, "  {icon} {}", self.label);
        }
        write!(
            f,
            "  {icon} {}: observed={:.6e}, expected={:.6e}, tol={:.2e} ({})",
            self.label, self.observed, self.expected, self.tolerance, self.mode
        )
    }
}

/// Collects checks and reports a summary with exit code.
///
/// ```
/// use lsqt::validation::ValidationHarness;
///
/// let mut h = ValidationHarness::new("demo");
/// h.check_abs("identity", 1.0, 1.0, 1e-12);
/// h.check_upper("residual", 1e-9, 1e-6);
/// h.check_bool("finite", f64::NAN.is_finite());
/// assert_eq!((h.passed_count(), h.total_count()), (2, 3));
/// assert!(!h.all_passed());
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct ValidationHarness {
    /// Binary name shown in the summary header
    pub name: String,
    /// Checks in the order they were recorded
    pub checks: Vec<Check>,
}

impl ValidationHarness {
    /// Empty harness for the named validation binary.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    fn push(&mut self, label: &str, passed: bool, observed: f64, expected: f64, tolerance: f64, mode: ToleranceMode) {
        self.checks.push(Check {
            label: label.to_string(),
            passed,
            observed,
            expected,
            tolerance,
            mode,
        });
    }

    /// Passes when |observed − expected| < tolerance.
    pub fn check_abs(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = (observed - expected).abs() < tolerance;
        self.push(label, passed, observed, expected, tolerance, ToleranceMode::Absolute);
    }

    /// Relative check; falls back to absolute when `expected` is ~0.
    pub fn check_rel(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = if expected.abs() > f64::EPSILON {
            ((observed - expected) / expected).abs() < tolerance
        } else {
            observed.abs() < tolerance
        };
        self.push(label, passed, observed, expected, tolerance, ToleranceMode::Relative);
    }

    /// Passes when observed < threshold.
    pub fn check_upper(&mut self, label: &str, observed: f64, threshold: f64) {
        self.push(label, observed < threshold, observed, threshold, threshold, ToleranceMode::UpperBound);
    }

    /// Record a pass/fail condition with no numeric value.
    pub fn check_bool(&mut self, label: &str, passed: bool) {
        self.push(label, passed, f64::from(u8::from(passed)), 1.0, 0.0, ToleranceMode::Boolean);
    }

    /// Number of passing checks.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Number of recorded checks.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.checks.len()
    }

    /// True when every check passed (vacuously for none).
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Summary block: header, one line per check, verdict.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(
            s,
            "═══ {} validation: {}/{} checks passed ═══",
            self.name,
            self.passed_count(),
            self.total_count()
        );
        for check in &self.checks {
            let _ = writeln!(s, "{check}");
        }
        if self.all_passed() {
            s.push_str("ALL CHECKS PASSED\n");
        } else {
            let failed: Vec<&str> = self
                .checks
                .iter()
                .filter(|c| !c.passed)
                .map(|c| c.label.as_str())
                .collect();
            let _ = writeln!(s, "FAILED CHECKS: {}", failed.join(", "));
        }
        s
    }

    /// Print the summary and exit 0 (all passed) or 1.
    pub fn finish(&self) -> ! {
        println!();
        print!("{}", self.summary());
        process::exit(i32::from(!self.all_passed()));
    }
}
