mod local;
mod matcher;

use std::str::FromStr;

use crate::plan::EditPlan;

pub use local::{LocalInterpreter, MATCHED_CONFIDENCE, NO_MATCH_CONFIDENCE, NO_MATCH_MESSAGE};
pub use matcher::{MatchBasis, SurfaceMatch, SurfaceMatcher};

/// Turns one free-form instruction into an edit plan over the given surface names.
/// Implementations never fail; degraded outcomes are expressed in the plan.
pub trait CommandInterpreter {
    fn interpret(&self, instruction: &str, surface_names: &[String]) -> EditPlan;
}

/// What the matcher does when no category resolves to a known surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Fall back to the first known surface.
    #[default]
    BestGuess,
    /// Resolve nothing.
    Strict,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_guess" | "bestguess" | "guess" => Ok(Self::BestGuess),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown match policy '{other}' (expected best_guess or strict)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MatchPolicy;

    #[test]
    fn match_policy_parses_aliases() {
        assert_eq!("strict".parse(), Ok(MatchPolicy::Strict));
        assert_eq!("Best-Guess".parse(), Ok(MatchPolicy::BestGuess));
        assert!("loose".parse::<MatchPolicy>().is_err());
    }
}
