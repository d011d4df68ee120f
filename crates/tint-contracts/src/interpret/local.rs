use super::{CommandInterpreter, MatchBasis, MatchPolicy, SurfaceMatcher};
use crate::plan::{Edit, EditPlan};
use crate::vocab::color_or_default;

pub const MATCHED_CONFIDENCE: f64 = 0.8;
pub const NO_MATCH_CONFIDENCE: f64 = 0.3;
pub const NO_MATCH_MESSAGE: &str = "변경할 수 있는 부분을 찾지 못했습니다. 다시 말씀해주세요.";

/// Offline rule-based interpreter: one lexicon color applied to every surface
/// the keyword matcher resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalInterpreter {
    matcher: SurfaceMatcher,
}

impl LocalInterpreter {
    pub fn new(policy: MatchPolicy) -> Self {
        Self::with_matcher(SurfaceMatcher::new(policy))
    }

    pub fn with_matcher(matcher: SurfaceMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &SurfaceMatcher {
        &self.matcher
    }
}

impl CommandInterpreter for LocalInterpreter {
    fn interpret(&self, instruction: &str, surface_names: &[String]) -> EditPlan {
        let color = color_or_default(instruction);
        let matched = self.matcher.resolve(instruction, surface_names);
        if matched.names.is_empty() {
            return EditPlan::new(Vec::new(), NO_MATCH_MESSAGE, Some(NO_MATCH_CONFIDENCE));
        }

        let message = match matched.basis {
            MatchBasis::Everything => "전체 색상을 변경했습니다.".to_string(),
            MatchBasis::Category(category) => format!("{} 색상을 변경했습니다.", category.label),
            MatchBasis::FirstEntry | MatchBasis::Nothing => "색상을 변경했습니다.".to_string(),
        };
        let edits = matched
            .names
            .into_iter()
            .map(|name| Edit::new(name, color))
            .collect();
        EditPlan::new(edits, message, Some(MATCHED_CONFIDENCE))
    }
}
