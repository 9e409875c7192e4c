//! Named pipelines and their registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use presenta_core::error::CoreError;

use crate::task::PipelineTask;

/// A named, ordered, immutable sequence of tasks plus the permissions a
/// caller must hold to run it.
///
/// Task order is significant and fixed at construction; a pipeline never
/// changes once registered under a name.
pub struct Pipeline {
    name: String,
    tasks: Vec<Arc<dyn PipelineTask>>,
    permissions: Vec<String>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, tasks: Vec<Arc<dyn PipelineTask>>) -> Self {
        Self {
            name: name.into(),
            tasks,
            permissions: Vec::new(),
        }
    }

    /// Replace the required permission set.
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Arc<dyn PipelineTask>] {
        &self.tasks
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("tasks", &self.tasks.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Process-wide registry of named pipelines.
///
/// An explicit object with a defined lifecycle: constructed at startup and
/// injected wherever pipelines are resolved — never an ambient global.
/// Read-mostly after startup; registration is an atomic insert-if-absent,
/// so racing registrations of the same name are harmless (first wins).
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    pipelines: RwLock<HashMap<String, Arc<Pipeline>>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline under its name.
    ///
    /// Idempotent: if the name is already taken the call is a no-op and the
    /// first registration's task list stays in effect. Returns whether the
    /// pipeline was actually inserted.
    pub fn register(&self, pipeline: Pipeline) -> bool {
        let mut pipelines = self.pipelines.write().expect("pipeline registry poisoned");
        match pipelines.entry(pipeline.name().to_string()) {
            std::collections::hash_map::Entry::Occupied(_) => {
                tracing::debug!(name = %pipeline.name(), "Pipeline already registered, keeping first registration");
                false
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                tracing::info!(
                    name = %pipeline.name(),
                    tasks = pipeline.tasks().len(),
                    "Pipeline registered",
                );
                slot.insert(Arc::new(pipeline));
                true
            }
        }
    }

    /// Resolve a presentation name to its pipeline.
    pub fn get(&self, name: &str) -> Result<Arc<Pipeline>, CoreError> {
        self.pipelines
            .read()
            .expect("pipeline registry poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::PresentationNotFound {
                name: name.to_string(),
            })
    }

    /// Registered presentation names, unordered.
    pub fn names(&self) -> Vec<String> {
        self.pipelines
            .read()
            .expect("pipeline registry poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::JobContext;
    use crate::task::TaskError;

    struct NamedNoop(&'static str);

    #[async_trait::async_trait]
    impl PipelineTask for NamedNoop {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _ctx: &mut JobContext) -> Result<(), TaskError> {
            Ok(())
        }
    }

    #[test]
    fn re_registration_keeps_first_task_list() {
        let registry = PipelineRegistry::new();

        let first = Pipeline::new(
            "demo",
            vec![
                Arc::new(NamedNoop("a")) as Arc<dyn PipelineTask>,
                Arc::new(NamedNoop("b")),
            ],
        );
        let second = Pipeline::new(
            "demo",
            vec![Arc::new(NamedNoop("c")) as Arc<dyn PipelineTask>],
        );

        assert!(registry.register(first));
        assert!(!registry.register(second));

        let resolved = registry.get("demo").unwrap();
        let names: Vec<_> = resolved.tasks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn unknown_name_is_presentation_not_found() {
        let registry = PipelineRegistry::new();
        let err = registry.get("missing").unwrap_err();
        assert!(matches!(
            err,
            presenta_core::CoreError::PresentationNotFound { .. }
        ));
    }

    #[test]
    fn permissions_are_attached_to_the_pipeline() {
        let registry = PipelineRegistry::new();
        registry.register(
            Pipeline::new(
                "guarded",
                vec![Arc::new(NamedNoop("a")) as Arc<dyn PipelineTask>],
            )
            .with_permissions(vec!["curator".into()]),
        );

        let resolved = registry.get("guarded").unwrap();
        assert_eq!(resolved.permissions(), ["curator".to_string()]);
    }
}
