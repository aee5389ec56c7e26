//! Model specification types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Innovation distribution family.
///
/// All families are standardized to zero mean and unit variance. The skewed
/// variants use the Fernandez-Steel construction with skew parameter
/// `xi > 0` (`xi = 1` is symmetric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionFamily {
    /// Standard normal.
    Normal,
    /// Standardized Student-t with shape `nu > 2`.
    StudentT,
    /// Generalized error distribution with shape `nu > 0`.
    Ged,
    /// Skewed normal.
    SkewNormal,
    /// Skewed Student-t.
    SkewStudentT,
    /// Skewed generalized error distribution.
    SkewGed,
}

impl DistributionFamily {
    /// Every family in canonical order.
    pub const ALL: [DistributionFamily; 6] = [
        Self::Normal,
        Self::StudentT,
        Self::Ged,
        Self::SkewNormal,
        Self::SkewStudentT,
        Self::SkewGed,
    ];

    /// Whether the family carries a shape (tail thickness) parameter.
    pub fn has_shape(self) -> bool {
        matches!(
            self,
            Self::StudentT | Self::Ged | Self::SkewStudentT | Self::SkewGed
        )
    }

    /// Whether the family carries a skew parameter.
    pub fn has_skew(self) -> bool {
        matches!(self, Self::SkewNormal | Self::SkewStudentT | Self::SkewGed)
    }

    /// Number of distribution parameters estimated alongside the model.
    pub fn num_params(self) -> usize {
        usize::from(self.has_shape()) + usize::from(self.has_skew())
    }

    /// Short code used in tables (`norm`, `std`, `ged`, `snorm`, `sstd`, `sged`).
    pub fn code(self) -> &'static str {
        match self {
            Self::Normal => "norm",
            Self::StudentT => "std",
            Self::Ged => "ged",
            Self::SkewNormal => "snorm",
            Self::SkewStudentT => "sstd",
            Self::SkewGed => "sged",
        }
    }
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DistributionFamily {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "norm" | "normal" => Ok(Self::Normal),
            "std" | "t" | "student_t" | "student-t" => Ok(Self::StudentT),
            "ged" => Ok(Self::Ged),
            "snorm" | "skew_normal" => Ok(Self::SkewNormal),
            "sstd" | "skew_student_t" => Ok(Self::SkewStudentT),
            "sged" | "skew_ged" => Ok(Self::SkewGed),
            other => Err(CoreError::invalid_input(format!(
                "unknown distribution family '{other}'"
            ))),
        }
    }
}

/// An ARMA(p,q)-GARCH(r,s) specification with its innovation family.
///
/// `r` counts lagged squared shocks (ARCH terms) and `s` lagged conditional
/// variances (GARCH terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Autoregressive order of the mean.
    pub arma_p: usize,
    /// Moving-average order of the mean.
    pub arma_q: usize,
    /// ARCH order.
    pub garch_r: usize,
    /// GARCH order.
    pub garch_s: usize,
    /// Innovation distribution.
    pub family: DistributionFamily,
    /// Whether a constant mean is estimated.
    #[serde(default = "default_include_mean")]
    pub include_mean: bool,
}

fn default_include_mean() -> bool {
    true
}

impl ModelSpec {
    /// Creates a specification with an estimated constant mean.
    pub fn new(p: usize, q: usize, r: usize, s: usize, family: DistributionFamily) -> Self {
        Self {
            arma_p: p,
            arma_q: q,
            garch_r: r,
            garch_s: s,
            family,
            include_mean: true,
        }
    }

    /// Sets whether the constant mean is estimated.
    #[must_use]
    pub fn with_mean(mut self, include_mean: bool) -> Self {
        self.include_mean = include_mean;
        self
    }

    /// Number of estimated parameters `k`.
    pub fn num_params(&self) -> usize {
        usize::from(self.include_mean)
            + self.arma_p
            + self.arma_q
            + 1
            + self.garch_r
            + self.garch_s
            + self.family.num_params()
    }

    /// Number of leading variances seeded before the recursion starts.
    pub fn variance_burn_in(&self) -> usize {
        self.garch_r.max(self.garch_s)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ARMA({},{})-GARCH({},{}) {}",
            self.arma_p, self.arma_q, self.garch_r, self.garch_s, self.family
        )?;
        if !self.include_mean {
            f.write_str(" (zero mean)")?;
        }
        Ok(())
    }
}
