//! Step registry: the ordered, immutable list of steps for one flow.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::error;

use super::answers::AnswerStore;
use super::step::{StepDefinition, StepKind};
use crate::error::{RegistryError, WizardError};

/// On-disk / embedded form of a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub flow_id: String,
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone)]
pub struct StepRegistry {
    flow_id: String,
    steps: Vec<StepDefinition>,
    by_id: HashMap<String, usize>,
}

impl StepRegistry {
    /// Build and validate a registry.
    ///
    /// Visibility predicates may only refer to steps that come earlier in the
    /// flow, so whether a step shows never depends on something the user has
    /// not been asked yet.
    pub fn new(flow_id: &str, steps: Vec<StepDefinition>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut by_id = HashMap::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            if by_id.insert(step.id.clone(), index).is_some() {
                return Err(RegistryError::DuplicateStep(step.id.clone()));
            }
            validate_options(step)?;
        }

        for (index, step) in steps.iter().enumerate() {
            let Some(predicate) = &step.visible_when else {
                continue;
            };
            for reference in predicate.references() {
                match by_id.get(reference) {
                    None => {
                        return Err(RegistryError::UnknownReference {
                            step_id: step.id.clone(),
                            reference: reference.to_string(),
                        });
                    }
                    Some(&target) if target >= index => {
                        return Err(RegistryError::ForwardReference {
                            step_id: step.id.clone(),
                            reference: reference.to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self {
            flow_id: flow_id.to_string(),
            steps,
            by_id,
        })
    }

    pub fn from_file(file: RegistryFile) -> Result<Self, RegistryError> {
        Self::new(&file.flow_id, file.steps)
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|e| RegistryError::Parse(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn to_json(&self) -> Result<String, RegistryError> {
        let file = RegistryFile {
            flow_id: self.flow_id.clone(),
            steps: self.steps.clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| RegistryError::Parse(e.to_string()))
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_at(&self, index: usize) -> Result<&StepDefinition, WizardError> {
        self.steps.get(index).ok_or_else(|| {
            error!(index, len = self.steps.len(), flow = %self.flow_id, "Step index out of range");
            WizardError::IndexOutOfRange {
                index,
                len: self.steps.len(),
            }
        })
    }

    pub fn index_of(&self, step_id: &str) -> Option<usize> {
        self.by_id.get(step_id).copied()
    }

    pub fn get(&self, step_id: &str) -> Option<&StepDefinition> {
        self.index_of(step_id).map(|i| &self.steps[i])
    }

    /// Evaluate the step's `visible_when`; no predicate means visible.
    pub fn is_visible(&self, index: usize, answers: &AnswerStore) -> Result<bool, WizardError> {
        self.step_at(index).map(|step| step_visible(step, answers))
    }
}

pub(crate) fn step_visible(step: &StepDefinition, answers: &AnswerStore) -> bool {
    step.visible_when
        .as_ref()
        .is_none_or(|predicate| predicate.evaluate(answers))
}

fn validate_options(step: &StepDefinition) -> Result<(), RegistryError> {
    let options = match &step.kind {
        StepKind::SingleChoice { options, .. } | StepKind::MultiChoice { options, .. } => options,
        _ => return Ok(()),
    };
    if options.is_empty() {
        return Err(RegistryError::NoOptions(step.id.clone()));
    }
    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if !seen.insert(option.id.as_str()) {
            return Err(RegistryError::DuplicateOption {
                step_id: step.id.clone(),
                option_id: option.id.clone(),
            });
        }
    }
    Ok(())
}
