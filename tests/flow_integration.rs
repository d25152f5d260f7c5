//! End-to-end tests over the built-in flows.
//!
//! Sessions are driven through the public API only; the last test runs a
//! manager against an on-disk libSQL file and resumes it with a second one.

use std::sync::Arc;

use quiz_flow::config::EngineConfig;
use quiz_flow::error::WizardError;
use quiz_flow::flow::{
    Answer, Collaborators, Position, Quantity, StepDefinition, StepKind, Transition,
    WizardManager, WizardSession, catalog,
};
use quiz_flow::metrics::formulas::{self, BmiCategory};
use quiz_flow::metrics::{Sex, keys};
use quiz_flow::store::{LibSqlStore, ProgressStore};
use quiz_flow::units::{Height, Weight};

const GENDERS: [&str; 3] = ["male", "female", "other"];
const ACTIVITY: [&str; 5] = ["sedentary", "light", "moderate", "active", "very_active"];

fn session(flow: &str) -> WizardSession {
    let registry = Arc::new(catalog::builtin(flow).unwrap());
    let mut session = WizardSession::new(registry);
    session.start();
    session
}

fn current_id(session: &WizardSession) -> Option<String> {
    session.current_step().map(|s| s.id.clone())
}

/// A plausible answer for `step`, picking `gender` and `activity` where asked.
fn answer_for(step: &StepDefinition, gender: &str, activity: &str) -> Option<Answer> {
    match &step.kind {
        StepKind::SingleChoice { options, .. } => Some(match step.id.as_str() {
            keys::GENDER => Answer::choice(gender),
            keys::ACTIVITY_LEVEL => Answer::choice(activity),
            _ => Answer::choice(&options[0].id),
        }),
        StepKind::MultiChoice { options, .. } => Some(Answer::choices([options[0].id.as_str()])),
        StepKind::NumericInput { min, max, .. } => Some(Answer::Number(
            30.0_f64.clamp(min.unwrap_or(f64::MIN), max.unwrap_or(f64::MAX)),
        )),
        StepKind::UnitPairInput {
            quantity: Quantity::Height,
        } => Some(Answer::Height(Height::cm(175.0))),
        StepKind::UnitPairInput {
            quantity: Quantity::Weight,
        } if step.id == keys::WEIGHT_GOAL => Some(Answer::Weight(Weight::kg(65.0))),
        StepKind::UnitPairInput {
            quantity: Quantity::Weight,
        } => Some(Answer::Weight(Weight::kg(70.0))),
        StepKind::Informational
        | StepKind::AutoAdvance { .. }
        | StepKind::ComputedSummary { .. } => None,
    }
}

/// Answer the current step and move forward once.
fn step_forward(session: &mut WizardSession, gender: &str, activity: &str) -> Transition {
    let step = session.current_step().cloned().unwrap();
    if let Some(answer) = answer_for(&step, gender, activity) {
        let transition = session.submit_answer(&step.id, answer).unwrap();
        if transition.moved() {
            return transition;
        }
    }
    session.go_next().unwrap()
}

fn visited_ids(flow: &str, gender: &str, activity: &str) -> Vec<String> {
    let mut session = session(flow);
    let mut ids = Vec::new();
    while let Some(id) = current_id(&session) {
        ids.push(id);
        step_forward(&mut session, gender, activity);
    }
    assert!(session.is_complete());
    ids
}

#[test]
fn back_after_next_returns_to_the_same_step() {
    for flow in catalog::BUILTIN_FLOWS {
        for gender in GENDERS {
            for activity in ACTIVITY {
                let mut session = session(flow);
                while let Some(before) = current_id(&session) {
                    let transition = step_forward(&mut session, gender, activity);
                    let Transition::Entered { step_id: after, .. } = transition else {
                        assert!(session.is_complete());
                        break;
                    };

                    session.go_back();
                    assert_eq!(
                        current_id(&session).as_deref(),
                        Some(before.as_str()),
                        "{flow}/{gender}/{activity}: back from {after}"
                    );

                    session.go_next().unwrap();
                    assert_eq!(current_id(&session), Some(after));
                }
            }
        }
    }
}

#[test]
fn progress_never_drops_while_moving_forward() {
    for flow in catalog::BUILTIN_FLOWS {
        for gender in GENDERS {
            for activity in ACTIVITY {
                let mut session = session(flow);
                let mut last = session.progress_fraction();
                while !session.is_complete() {
                    step_forward(&mut session, gender, activity);
                    let now = session.progress_fraction();
                    assert!(
                        now >= last,
                        "{flow}/{gender}/{activity}: progress fell from {last} to {now}"
                    );
                    assert!((0.0..=1.0).contains(&now));
                    last = now;
                }
                assert_eq!(last, 1.0);
            }
        }
    }
}

#[test]
fn bmi_for_reference_adult() {
    let bmi = formulas::bmi(70.0, 175.0);
    assert!((bmi.value - 22.9).abs() < 0.1);
    assert_eq!(bmi.rounded(), 22.9);
    assert_eq!(bmi.category, BmiCategory::Normal);
    assert_eq!(bmi.category.to_string(), "Normal");
}

#[test]
fn bmr_follows_mifflin_st_jeor() {
    // 10·70 + 6.25·175 − 5·age + 5
    assert!((formulas::bmr(70.0, 175.0, 30.0, Sex::Male) - 1648.75).abs() < 1e-9);
    assert!((formulas::bmr(70.0, 175.0, 25.0, Sex::Male) - 1673.0).abs() < 1.0);
    assert!((formulas::bmr(70.0, 175.0, 30.0, Sex::Female) - 1482.75).abs() < 1e-9);
}

#[test]
fn gender_gated_step_follows_the_answer() {
    let female = visited_ids("weight_loss", "female", "moderate");
    let male = visited_ids("weight_loss", "male", "moderate");
    assert!(female.iter().any(|id| id == "pregnant"));
    assert!(!male.iter().any(|id| id == "pregnant"));
    assert_eq!(female.len(), male.len() + 1);

    let sedentary = visited_ids("weight_loss", "male", "sedentary");
    assert!(sedentary.iter().any(|id| id == "move_more"));
    assert!(!male.iter().any(|id| id == "move_more"));
}

#[test]
fn wrong_shape_is_rejected_without_mutation() {
    let mut session = session("weight_loss");
    session.go_next().unwrap();
    assert_eq!(current_id(&session).as_deref(), Some(keys::GOAL));

    let err = session
        .submit_answer(keys::GOAL, Answer::Number(3.0))
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidAnswerShape { .. }), "{err:?}");
    assert!(session.answers().get(keys::GOAL).is_none());
    assert_eq!(current_id(&session).as_deref(), Some(keys::GOAL));

    let err = session
        .submit_answer(keys::HEIGHT, Answer::Weight(Weight::kg(70.0)))
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidAnswerShape { .. }), "{err:?}");
    assert!(session.answers().is_empty());
}

#[test]
fn required_step_holds_position() {
    let mut session = session("weight_loss");
    session.go_next().unwrap();
    let before = session.position();

    let err = session.go_next().unwrap_err();
    assert_eq!(
        err,
        WizardError::AnswerRequired {
            step_id: keys::GOAL.to_string()
        }
    );
    assert_eq!(session.position(), before);
    assert_eq!(current_id(&session).as_deref(), Some(keys::GOAL));
}

#[test]
fn reanswer_shows_up_in_derived_values() {
    let mut session = session("weight_loss");
    while current_id(&session).as_deref() != Some("bmi_result") {
        step_forward(&mut session, "male", "moderate");
    }
    let bmi = session.derived_snapshot().bmi.clone().unwrap();
    assert_eq!(bmi.rounded(), 22.9);

    while current_id(&session).as_deref() != Some(keys::WEIGHT_CURRENT) {
        session.go_back();
    }
    session
        .submit_answer(keys::WEIGHT_CURRENT, Answer::Weight(Weight::kg(90.0)))
        .unwrap();
    session.go_next().unwrap();

    let bmi = session.derived_snapshot().bmi.clone().unwrap();
    assert_eq!(bmi.rounded(), 29.4);
    assert_eq!(bmi.category, BmiCategory::Overweight);
    let delta = session.derived_snapshot().weight_delta.clone().unwrap();
    assert!((delta.kilograms - 25.0).abs() < 1e-9);
}

#[test]
fn unanswered_inputs_are_not_computable() {
    let session = session("fitness");
    let derived = session.derived_snapshot();
    assert!(derived.bmi.is_err());
    assert!(derived.bmr.is_err());
    assert!(derived.macros.is_err());
}

#[tokio::test]
async fn manager_resumes_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("progress.db");
    let config = EngineConfig {
        db_path: db_path.clone(),
        splash: None,
        ..EngineConfig::default()
    };

    let session_id = {
        let store = Arc::new(LibSqlStore::new_local(&db_path).await.unwrap());
        let registry = Arc::new(catalog::builtin("weight_loss").unwrap());
        let manager = WizardManager::new(registry, Collaborators::headless(store.clone()), &config);

        let view = manager.start().await;
        assert_eq!(view.step.map(|s| s.id).as_deref(), Some("welcome"));
        manager.go_next().await.unwrap();
        manager
            .submit_answer(keys::GOAL, Answer::choice("lose_weight"))
            .await
            .unwrap();
        manager
            .submit_answer(keys::GENDER, Answer::choice("female"))
            .await
            .unwrap();
        assert!(store.load(manager.session_key()).await.unwrap().is_some());

        let snapshot = manager.snapshot().await;
        manager.shutdown().await;
        snapshot.session_id
    };

    let store = Arc::new(LibSqlStore::new_local(&db_path).await.unwrap());
    let registry = Arc::new(catalog::builtin("weight_loss").unwrap());
    let manager = WizardManager::new(registry, Collaborators::headless(store), &config);
    let view = manager.start().await;

    assert_eq!(view.step.map(|s| s.id).as_deref(), Some("pregnant"));
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.session_id, session_id);
    assert_eq!(snapshot.answers.choice(keys::GENDER), Some("female"));

    manager.go_back().await;
    assert_eq!(manager.position().await, Position::AtStep(2));
    manager.shutdown().await;
}
