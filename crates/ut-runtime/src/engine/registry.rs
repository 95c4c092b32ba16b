use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ut_core::{ScenarioId, UiTestError, GROUP_FILTER_ALL};

use super::context::ScenarioStep;

#[derive(Clone)]
pub struct ScenarioDefinition {
    id: ScenarioId,
    step: Arc<dyn ScenarioStep>,
}

impl ScenarioDefinition {
    pub fn id(&self) -> &ScenarioId {
        &self.id
    }

    pub fn group(&self) -> &str {
        &self.id.group
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub(crate) fn step(&self) -> Arc<dyn ScenarioStep> {
        Arc::clone(&self.step)
    }
}

impl fmt::Debug for ScenarioDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioDefinition")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioHandle {
    pub index: usize,
    pub id: ScenarioId,
}

#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<ScenarioDefinition>,
    by_id: HashMap<ScenarioId, usize>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        group: &str,
        name: &str,
        step: impl ScenarioStep + 'static,
    ) -> Result<ScenarioHandle, UiTestError> {
        let id = ScenarioId::new(group, name);
        id.validate()?;
        if self.by_id.contains_key(&id) {
            return Err(UiTestError::DuplicateScenario { id });
        }

        let index = self.scenarios.len();
        self.scenarios.push(ScenarioDefinition {
            id: id.clone(),
            step: Arc::new(step),
        });
        self.by_id.insert(id.clone(), index);
        Ok(ScenarioHandle { index, id })
    }

    pub fn lookup(&self, id: &ScenarioId) -> Option<&ScenarioDefinition> {
        self.by_id.get(id).map(|index| &self.scenarios[*index])
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioDefinition> {
        self.scenarios.iter()
    }

    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for scenario in &self.scenarios {
            if !groups.contains(&scenario.group()) {
                groups.push(scenario.group());
            }
        }
        groups
    }

    pub fn select(&self, filter: &str) -> Vec<ScenarioId> {
        let filter = filter.trim();
        self.scenarios
            .iter()
            .filter(|scenario| {
                filter.eq_ignore_ascii_case(GROUP_FILTER_ALL)
                    || scenario.group() == filter
                    || scenario.id.to_string() == filter
            })
            .map(|scenario| scenario.id.clone())
            .collect()
    }
}

impl fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.scenarios.iter().map(|scenario| &scenario.id))
            .finish()
    }
}
