use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tint_contracts::interpret::{CommandInterpreter, LocalInterpreter};
use tint_contracts::plan::EditPlan;

use crate::config::RemoteConfig;
use crate::provider::{error_chain_text, AnthropicMessages, LanguageModel, ModelRequest};

pub const SYSTEM_PROMPT: &str = "\
You recolor parts of a 3D model. Reply with one JSON object and nothing else.
Rules:
1. Use surface names exactly as listed in \"Available surfaces\"; never invent names.
2. Colors are hex strings in #RRGGBB form.
3. Words meaning all or every (전체, 모든, 전부, all, every, whole) target every available surface.
4. Always include a short confirmation message in the user's language.
5. Response shape: {\"edits\": [{\"surface\": \"<name>\", \"color\": \"#RRGGBB\"}], \"message\": \"<text>\", \"confidence\": <0..1>}
Common mappings: sole/밑창/바닥 -> names containing sole, bottom or outsole; upper/갑피 -> upper, top or mesh; \
laces/끈 -> lace or string; logo/로고 -> logo or brand.";

const FALLBACK_REASON_MAX_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedBy {
    Remote { model: String },
    Local,
}

impl ServedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote { .. } => "remote",
            Self::Local => "local",
        }
    }
}

/// A plan plus how it was produced. `fallback_reason` is set whenever the
/// local interpreter stood in for the remote one.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub plan: EditPlan,
    pub served_by: ServedBy,
    pub fallback_reason: Option<String>,
}

impl Interpretation {
    pub fn is_degraded(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Language-model-backed interpreter. Any failure (transport, status, no JSON,
/// wrong shape) is replaced wholesale by the local interpreter's plan.
pub struct RemoteInterpreter {
    model: Option<Arc<dyn LanguageModel>>,
    local: LocalInterpreter,
}

impl fmt::Debug for RemoteInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteInterpreter")
            .field("model", &self.model.as_ref().map(|model| model.name().to_string()))
            .field("local", &self.local)
            .finish()
    }
}

impl RemoteInterpreter {
    pub fn new(model: Arc<dyn LanguageModel>, local: LocalInterpreter) -> Self {
        Self {
            model: Some(model),
            local,
        }
    }

    /// Always serves locally.
    pub fn offline(local: LocalInterpreter) -> Self {
        Self { model: None, local }
    }

    pub fn from_config(config: &RemoteConfig, local: LocalInterpreter) -> Self {
        if !config.is_usable() {
            return Self::offline(local);
        }
        match AnthropicMessages::new(config) {
            Ok(client) => Self::new(Arc::new(client), local),
            Err(err) => {
                eprintln!("remote interpreter disabled: {err:#}");
                Self::offline(local)
            }
        }
    }

    pub fn local(&self) -> &LocalInterpreter {
        &self.local
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|model| model.name())
    }

    pub fn interpret_detailed(&self, instruction: &str, surface_names: &[String]) -> Interpretation {
        let Some(model) = &self.model else {
            return self.degrade(instruction, surface_names, "remote interpreter disabled".to_string());
        };
        let request = ModelRequest {
            instruction: instruction.to_string(),
            surface_names: surface_names.to_vec(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        };
        match request_plan(model.as_ref(), &request) {
            Ok(plan) => Interpretation {
                plan,
                served_by: ServedBy::Remote {
                    model: model.name().to_string(),
                },
                fallback_reason: None,
            },
            Err(err) => self.degrade(
                instruction,
                surface_names,
                error_chain_text(&err, FALLBACK_REASON_MAX_CHARS),
            ),
        }
    }

    fn degrade(&self, instruction: &str, surface_names: &[String], reason: String) -> Interpretation {
        Interpretation {
            plan: self.local.interpret(instruction, surface_names),
            served_by: ServedBy::Local,
            fallback_reason: Some(reason),
        }
    }
}

impl CommandInterpreter for RemoteInterpreter {
    fn interpret(&self, instruction: &str, surface_names: &[String]) -> EditPlan {
        self.interpret_detailed(instruction, surface_names).plan
    }
}

fn request_plan(model: &dyn LanguageModel, request: &ModelRequest) -> Result<EditPlan> {
    let reply = model.complete(request)?;
    let Some(object) = extract_json_object_from_text(&reply) else {
        anyhow::bail!("model reply contained no JSON object");
    };
    EditPlan::from_json_value(object).map_err(anyhow::Error::msg)
}

fn strip_code_fence(text: &str) -> String {
    let raw = text.trim();
    if !(raw.starts_with("```") && raw.ends_with("```")) {
        return raw.to_string();
    }
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < 2 {
        return raw.to_string();
    }
    let mut body = lines[1..lines.len() - 1].join("\n").trim().to_string();
    if body.to_ascii_lowercase().starts_with("json") {
        body = body[4..].trim().to_string();
    }
    body
}

/// Whole reply first, then the span from the first `{` to the last `}`.
fn extract_json_object_from_text(text: &str) -> Option<Value> {
    let raw = strip_code_fence(text);
    if raw.is_empty() {
        return None;
    }
    let mut candidates = vec![raw.as_str()];
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            candidates.push(&raw[start..=end]);
        }
    }
    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find(Value::is_object)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use tint_contracts::color::Rgb;
    use tint_contracts::interpret::{CommandInterpreter, LocalInterpreter};
    use tint_contracts::plan::Edit;

    use super::{extract_json_object_from_text, RemoteInterpreter, ServedBy};
    use crate::config::RemoteConfig;
    use crate::provider::{LanguageModel, ModelRequest};

    struct Scripted {
        reply: Result<String, String>,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl Scripted {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl LanguageModel for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn complete(&self, request: &ModelRequest) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(reason) => bail!("{reason}"),
            }
        }
    }

    fn names() -> Vec<String> {
        vec!["outsole_mat".to_string(), "upper_mat".to_string()]
    }

    #[test]
    fn remote_plan_is_used_when_well_formed() {
        let model = Scripted::replying(
            r##"{"edits": [{"surface": "upper_mat", "color": "#00ff00"}], "message": "갑피를 초록색으로 바꿨어요.", "confidence": 0.95}"##,
        );
        let interpreter = RemoteInterpreter::new(model.clone(), LocalInterpreter::default());
        let outcome = interpreter.interpret_detailed("갑피를 초록색으로", &names());

        assert_eq!(outcome.served_by, ServedBy::Remote { model: "scripted".to_string() });
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.plan.edits, vec![Edit::new("upper_mat", Rgb::new(0, 255, 0))]);
        assert_eq!(outcome.plan.confidence, Some(0.95));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].surface_names, names());
        assert!(seen[0].system_prompt.contains("#RRGGBB"));
    }

    #[test]
    fn transport_failure_equals_local_result() {
        let local = LocalInterpreter::default();
        let interpreter = RemoteInterpreter::new(Scripted::failing("HTTP 503"), local);
        for instruction in ["밑창을 빨간색으로", "전체를 검정색으로", "xyz123"] {
            let outcome = interpreter.interpret_detailed(instruction, &names());
            assert_eq!(outcome.served_by, ServedBy::Local);
            assert_eq!(outcome.fallback_reason.as_deref(), Some("HTTP 503"));
            assert_eq!(outcome.plan, local.interpret(instruction, &names()));
        }
    }

    #[test]
    fn prose_wrapped_and_fenced_json_is_accepted() {
        let prose = Scripted::replying(
            "Sure! Here is the plan:\n{\"changes\": [{\"material\": \"outsole_mat\", \"color\": \"#FF0000\"}], \"message\": \"done\"}\nEnjoy.",
        );
        let plan = RemoteInterpreter::new(prose, LocalInterpreter::default())
            .interpret("sole red", &names());
        assert_eq!(plan.edits, vec![Edit::new("outsole_mat", Rgb::new(255, 0, 0))]);
        assert_eq!(plan.confidence, None);

        let fenced = "```json\n{\"edits\": [], \"message\": \"nothing to do\"}\n```";
        assert!(extract_json_object_from_text(fenced).is_some());
    }

    #[test]
    fn malformed_replies_fall_back_locally() {
        let replies = [
            "I cannot help with that.",
            "{\"edits\": [{\"surface\": \"outsole_mat\", \"color\": \"red\"}], \"message\": \"ok\"}",
            "{\"edits\": [], \"message\": \"   \"}",
            "[1, 2, 3]",
        ];
        for reply in replies {
            let interpreter =
                RemoteInterpreter::new(Scripted::replying(reply), LocalInterpreter::default());
            let outcome = interpreter.interpret_detailed("밑창을 빨간색으로", &names());
            assert_eq!(outcome.served_by, ServedBy::Local, "reply: {reply}");
            assert_eq!(
                outcome.plan.edits,
                vec![Edit::new("outsole_mat", Rgb::new(255, 0, 0))]
            );
        }
    }

    #[test]
    fn unusable_config_serves_offline() {
        let interpreter =
            RemoteInterpreter::from_config(&RemoteConfig::default(), LocalInterpreter::default());
        assert_eq!(interpreter.model_name(), None);
        let outcome = interpreter.interpret_detailed("전체를 검정색으로", &names());
        assert_eq!(outcome.served_by, ServedBy::Local);
        assert_eq!(outcome.plan.edits.len(), 2);
    }
}
