use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use serde::Serialize;
use serde_json::{json, Value};
use tint_contracts::chat::{ChatHistory, ChatMessage, ChatRole};
use tint_contracts::color::Rgb;
use tint_contracts::events::{EventLog, SessionEvent};
use tint_contracts::interpret::CommandInterpreter;
use tint_contracts::plan::Edit;

use crate::apply::{apply_edit, apply_plan, ApplyReport};
use crate::loader::{load, AssetFormat, AssetRef, LoadError};
use crate::registry::{Registry, Surface};
use crate::remote::{Interpretation, RemoteInterpreter, ServedBy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub label: String,
    pub format: String,
    pub digest: String,
    pub surfaces: usize,
}

/// Interpretation running on a worker thread, tagged with the generation it
/// was submitted under.
#[derive(Debug)]
pub struct PendingPlan {
    generation: u64,
    instruction: String,
    surface_names: Vec<String>,
    worker: JoinHandle<Interpretation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionOutcome {
    Applied {
        interpretation: Interpretation,
        report: ApplyReport,
    },
    /// A newer instruction or asset landed first; nothing was mutated.
    Superseded { interpretation: Interpretation },
}

impl InstructionOutcome {
    pub fn interpretation(&self) -> &Interpretation {
        match self {
            Self::Applied { interpretation, .. } | Self::Superseded { interpretation } => {
                interpretation
            }
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    asset: Option<AssetSummary>,
    registry: Registry,
    history: ChatHistory,
}

/// One user's working context: the loaded asset's registry, the chat
/// transcript and the interpreter. Independent sessions share nothing.
#[derive(Debug)]
pub struct Session {
    id: String,
    interpreter: Arc<RemoteInterpreter>,
    events: Option<EventLog>,
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(interpreter: RemoteInterpreter) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            interpreter: Arc::new(interpreter),
            events: None,
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.events = Some(EventLog::new(path, self.id.clone()));
        self.emit(
            SessionEvent::SessionStarted,
            json!({
                "model": self.interpreter.model_name(),
                "match_policy": format!("{:?}", self.interpreter.local().matcher().policy()),
            }),
        );
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interpreter(&self) -> &RemoteInterpreter {
        &self.interpreter
    }

    /// Loads and registers an asset, replacing the current registry wholesale.
    /// On failure the previous asset stays loaded.
    pub fn load_asset(
        &self,
        asset: &AssetRef,
        hint: Option<AssetFormat>,
    ) -> Result<AssetSummary, LoadError> {
        let scene = match load(asset, hint) {
            Ok(scene) => scene,
            Err(err) => {
                self.emit(
                    SessionEvent::AssetLoadFailed,
                    json!({
                        "asset": asset.label(),
                        "reason": err.reason().as_str(),
                        "error": err.to_string(),
                    }),
                );
                return Err(err);
            }
        };
        let registry = Registry::build(&scene);
        let summary = AssetSummary {
            label: scene.source.clone(),
            format: scene.format.to_string(),
            digest: scene.digest.clone(),
            surfaces: registry.len(),
        };
        {
            let mut state = self.lock_state();
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.registry = registry;
            state.asset = Some(summary.clone());
        }
        self.emit(
            SessionEvent::AssetLoaded,
            serde_json::to_value(&summary).unwrap_or(Value::Null),
        );
        Ok(summary)
    }

    pub fn asset(&self) -> Option<AssetSummary> {
        self.lock_state().asset.clone()
    }

    pub fn surface_names(&self) -> Vec<String> {
        self.lock_state().registry.names()
    }

    pub fn surfaces(&self) -> Vec<Surface> {
        self.lock_state().registry.surfaces()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.lock_state().history.messages().to_vec()
    }

    pub fn drain_dirty(&self) -> Vec<String> {
        self.lock_state().registry.drain_dirty()
    }

    /// Manual override: paints one surface directly, bypassing interpretation.
    pub fn apply_edit(&self, surface: &str, color: Rgb) -> bool {
        let applied = apply_edit(&self.lock_state().registry, &Edit::new(surface, color));
        self.emit(
            SessionEvent::ManualEdit,
            json!({"surface": surface, "color": color.to_hex(), "applied": applied}),
        );
        applied
    }

    /// Starts interpreting against the current surface names. Any plan
    /// submitted earlier becomes stale.
    pub fn submit(&self, instruction: &str) -> PendingPlan {
        // Names and generation are taken under one lock so a concurrent asset
        // switch either precedes both or supersedes this plan.
        let (generation, surface_names) = {
            let mut state = self.lock_state();
            state.history.push(ChatRole::User, instruction);
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, state.registry.names())
        };
        let interpreter = Arc::clone(&self.interpreter);
        let worker_instruction = instruction.to_string();
        let worker_names = surface_names.clone();
        let worker = thread::spawn(move || {
            interpreter.interpret_detailed(&worker_instruction, &worker_names)
        });
        PendingPlan {
            generation,
            instruction: instruction.to_string(),
            surface_names,
            worker,
        }
    }

    /// Waits for a submitted plan and applies it if nothing newer landed.
    pub fn land(&self, pending: PendingPlan) -> InstructionOutcome {
        let PendingPlan {
            generation,
            instruction,
            surface_names,
            worker,
        } = pending;
        let interpretation = worker.join().unwrap_or_else(|_| Interpretation {
            plan: self.interpreter.local().interpret(&instruction, &surface_names),
            served_by: ServedBy::Local,
            fallback_reason: Some("interpreter worker panicked".to_string()),
        });
        self.emit_interpretation(generation, &interpretation);

        let mut state = self.lock_state();
        let current = self.generation.load(Ordering::SeqCst);
        if generation != current {
            drop(state);
            self.emit(
                SessionEvent::PlanDiscarded,
                json!({"generation": generation, "current_generation": current}),
            );
            return InstructionOutcome::Superseded { interpretation };
        }
        let report = apply_plan(&interpretation.plan, &state.registry);
        state
            .history
            .push(ChatRole::Assistant, interpretation.plan.message.clone());
        drop(state);
        self.emit(
            SessionEvent::PlanApplied,
            json!({
                "generation": generation,
                "applied": report.applied,
                "skipped": report.skipped,
            }),
        );
        InstructionOutcome::Applied {
            interpretation,
            report,
        }
    }

    pub fn instruct(&self, instruction: &str) -> InstructionOutcome {
        self.land(self.submit(instruction))
    }

    fn emit_interpretation(&self, generation: u64, interpretation: &Interpretation) {
        let model = match &interpretation.served_by {
            ServedBy::Remote { model } => Some(model.as_str()),
            ServedBy::Local => None,
        };
        self.emit(
            SessionEvent::PlanReady,
            json!({
                "generation": generation,
                "served_by": interpretation.served_by.as_str(),
                "model": model,
                "edits": interpretation.plan.edits.len(),
                "confidence": interpretation.plan.confidence,
            }),
        );
        if let Some(reason) = &interpretation.fallback_reason {
            self.emit(
                SessionEvent::InterpretationDegraded,
                json!({"generation": generation, "reason": reason}),
            );
        }
    }

    /// Logging never breaks the pipeline.
    fn emit(&self, event: SessionEvent, payload: Value) {
        if let Some(events) = &self.events {
            let _ = events.record(event, payload);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::mpsc::{channel, Receiver};
    use std::sync::{Arc, Mutex};

    use serde_json::Value;
    use tint_contracts::chat::ChatRole;
    use tint_contracts::color::Rgb;
    use tint_contracts::events::read_event_log;
    use tint_contracts::interpret::LocalInterpreter;

    use super::{InstructionOutcome, Session};
    use crate::loader::fixtures::{glb_from_json, shoe_gltf_json, TWO_OBJECT_OBJ};
    use crate::loader::{AssetFormat, AssetRef, LoadErrorReason};
    use crate::provider::{LanguageModel, ModelRequest};
    use crate::remote::{RemoteInterpreter, ServedBy};

    fn offline_session() -> Session {
        Session::new(RemoteInterpreter::offline(LocalInterpreter::default()))
    }

    fn shoe_glb() -> AssetRef {
        AssetRef::transient("shoe", glb_from_json(&shoe_gltf_json()))
    }

    /// Replies only after the test releases it.
    struct Gated {
        release: Mutex<Receiver<()>>,
    }

    impl LanguageModel for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        fn complete(&self, request: &ModelRequest) -> anyhow::Result<String> {
            self.release.lock().unwrap().recv()?;
            let edits: Vec<Value> = request
                .surface_names
                .iter()
                .map(|name| serde_json::json!({"surface": name, "color": "#0000FF"}))
                .collect();
            Ok(serde_json::json!({"edits": edits, "message": "파란색으로 변경했습니다."}).to_string())
        }
    }

    #[test]
    fn instruct_applies_and_records_history() -> anyhow::Result<()> {
        let session = offline_session();
        session.load_asset(&shoe_glb(), None)?;
        let outcome = session.instruct("밑창을 빨간색으로");

        let InstructionOutcome::Applied { interpretation, report } = outcome else {
            panic!("expected the plan to apply");
        };
        assert_eq!(interpretation.served_by, ServedBy::Local);
        assert_eq!(report.applied, 1);
        let sole = session
            .surfaces()
            .into_iter()
            .find(|surface| surface.name == "outsole_mat")
            .unwrap();
        assert_eq!(sole.color_hex(), Some("#FF0000".to_string()));
        assert_eq!(session.drain_dirty(), vec!["outsole_mat"]);

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, ChatRole::User);
        assert_eq!(history[2].content, "밑창 색상을 변경했습니다.");
        Ok(())
    }

    #[test]
    fn stale_plan_is_discarded() -> anyhow::Result<()> {
        let session = offline_session();
        session.load_asset(&shoe_glb(), None)?;
        let first = session.submit("전체를 검정색으로");
        let second = session.submit("밑창을 빨간색으로");

        assert!(matches!(session.land(second), InstructionOutcome::Applied { .. }));
        assert!(matches!(session.land(first), InstructionOutcome::Superseded { .. }));
        let colors: Vec<Option<String>> =
            session.surfaces().iter().map(|surface| surface.color_hex()).collect();
        assert_eq!(colors[0].as_deref(), Some("#FF0000"));
        assert_ne!(colors[1].as_deref(), Some("#000000"));
        Ok(())
    }

    #[test]
    fn asset_switch_supersedes_in_flight_plan() -> anyhow::Result<()> {
        let (release, gate) = channel();
        let model = Arc::new(Gated {
            release: Mutex::new(gate),
        });
        let session = Session::new(RemoteInterpreter::new(model, LocalInterpreter::default()));
        let obj = AssetRef::transient("shoe.obj", TWO_OBJECT_OBJ.as_bytes().to_vec());
        session.load_asset(&obj, Some(AssetFormat::Obj))?;

        let pending = session.submit("전체를 파란색으로");
        session.load_asset(&shoe_glb(), None)?;
        release.send(())?;

        let outcome = session.land(pending);
        assert!(matches!(outcome, InstructionOutcome::Superseded { .. }));
        assert_eq!(
            outcome.interpretation().served_by,
            ServedBy::Remote {
                model: "gated".to_string()
            }
        );
        assert!(session.drain_dirty().is_empty());
        Ok(())
    }

    #[test]
    fn failed_load_keeps_previous_asset() -> anyhow::Result<()> {
        let session = offline_session();
        let loaded = session.load_asset(&shoe_glb(), None)?;
        let err = session
            .load_asset(&AssetRef::Path(PathBuf::from("/missing/shoe.glb")), None)
            .err()
            .map(|err| err.reason());
        assert_eq!(err, Some(LoadErrorReason::Network));
        assert_eq!(session.asset(), Some(loaded));
        assert_eq!(session.surface_names().len(), 4);
        Ok(())
    }

    #[test]
    fn manual_edit_bypasses_interpreters() -> anyhow::Result<()> {
        let session = offline_session();
        session.load_asset(&shoe_glb(), None)?;
        assert!(session.apply_edit("logo_mat", Rgb::new(255, 165, 0)));
        assert!(!session.apply_edit("heel", Rgb::new(255, 165, 0)));
        assert_eq!(session.history().len(), 1);
        Ok(())
    }

    #[test]
    fn events_trace_the_pipeline() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let session = offline_session().with_event_log(&path);
        session.load_asset(&shoe_glb(), None)?;
        session.instruct("로고를 노란색으로");

        let rows = read_event_log(&path)?;
        let types: Vec<&str> = rows.iter().filter_map(|row| row["type"].as_str()).collect();
        assert_eq!(
            types,
            vec![
                "session_started",
                "asset_loaded",
                "plan_ready",
                "interpretation_degraded",
                "plan_applied"
            ]
        );
        assert!(rows.iter().all(|row| row["session_id"] == session.id()));
        assert_eq!(rows[1]["surfaces"], 4);
        assert_eq!(rows[1]["digest"].as_str().map(str::len), Some(64));
        assert_eq!(rows[4]["applied"], 1);
        Ok(())
    }

    #[test]
    fn plans_never_land_on_a_registry_switched_after_submit() -> anyhow::Result<()> {
        let session = Arc::new(offline_session());
        let obj = AssetRef::transient("shoe.obj", TWO_OBJECT_OBJ.as_bytes().to_vec());
        session.load_asset(&obj, Some(AssetFormat::Obj))?;

        let switcher = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                for round in 0..200 {
                    let asset = if round % 2 == 0 { shoe_glb() } else { obj.clone() };
                    let hint = (round % 2 == 1).then_some(AssetFormat::Obj);
                    let _ = session.load_asset(&asset, hint);
                }
            })
        };
        for _ in 0..200 {
            let outcome = session.instruct("전체를 빨간색으로");
            if let InstructionOutcome::Applied { report, .. } = outcome {
                assert_eq!(report.skipped, 0);
            }
        }
        switcher.join().map_err(|_| anyhow::anyhow!("asset switcher panicked"))?;
        Ok(())
    }
}
