use super::MatchPolicy;
use crate::vocab::{SurfaceCategory, EVERYTHING, SURFACE_CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBasis {
    Everything,
    Category(&'static SurfaceCategory),
    FirstEntry,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMatch {
    pub names: Vec<String>,
    pub basis: MatchBasis,
}

impl SurfaceMatch {
    fn nothing() -> Self {
        Self {
            names: Vec::new(),
            basis: MatchBasis::Nothing,
        }
    }
}

/// Keyword matcher from instruction text to known surface names.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceMatcher {
    everything: &'static SurfaceCategory,
    categories: &'static [SurfaceCategory],
    policy: MatchPolicy,
}

impl Default for SurfaceMatcher {
    fn default() -> Self {
        Self::new(MatchPolicy::default())
    }
}

impl SurfaceMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self::with_categories(&EVERYTHING, SURFACE_CATEGORIES, policy)
    }

    pub fn with_categories(
        everything: &'static SurfaceCategory,
        categories: &'static [SurfaceCategory],
        policy: MatchPolicy,
    ) -> Self {
        Self {
            everything,
            categories,
            policy,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn match_surfaces(&self, text: &str, surface_names: &[String]) -> Vec<String> {
        self.resolve(text, surface_names).names
    }

    /// Result names keep the order of `surface_names`.
    pub fn resolve(&self, text: &str, surface_names: &[String]) -> SurfaceMatch {
        if surface_names.is_empty() {
            return SurfaceMatch::nothing();
        }
        let lowered = text.to_lowercase();
        if self.everything.is_triggered_by(&lowered) {
            return SurfaceMatch {
                names: surface_names.to_vec(),
                basis: MatchBasis::Everything,
            };
        }

        for category in self.categories {
            if !category.is_triggered_by(&lowered) {
                continue;
            }
            let names: Vec<String> = surface_names
                .iter()
                .filter(|name| category.covers(name))
                .cloned()
                .collect();
            if !names.is_empty() {
                return SurfaceMatch {
                    names,
                    basis: MatchBasis::Category(category),
                };
            }
        }

        match self.policy {
            MatchPolicy::BestGuess => SurfaceMatch {
                names: vec![surface_names[0].clone()],
                basis: MatchBasis::FirstEntry,
            },
            MatchPolicy::Strict => SurfaceMatch::nothing(),
        }
    }
}
