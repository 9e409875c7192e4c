//! The built-in `example` presentation.
//!
//! Two steps: write a small input file into scratch, then read it back and
//! emit a title-cased copy as the downloadable artifact. Useful as a smoke
//! test for the whole submit/run/download path and as a template for real
//! presentations.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use serde_json::json;

use presenta_core::error::CoreError;

use crate::context::JobContext;
use crate::registry::{Pipeline, PipelineRegistry};
use crate::task::{PipelineTask, TaskError};

/// Name the example pipeline is registered under.
pub const EXAMPLE_PRESENTATION: &str = "example";

/// Content written by the first step.
const EXAMPLE_CONTENT: &str = "example file\n";

/// Step 1: create the example input file and record its scratch-relative
/// name in the payload.
pub struct CreateExampleFile;

#[async_trait::async_trait]
impl PipelineTask for CreateExampleFile {
    fn name(&self) -> &str {
        "create_example_file"
    }

    async fn run(&self, ctx: &mut JobContext) -> Result<(), TaskError> {
        let (path, mut file) = ctx
            .scratch()?
            .allocate_file_for_writing(Some("example_input"))?;
        file.write_all(EXAMPLE_CONTENT.as_bytes())
            .map_err(CoreError::from)?;

        let name = file_name_of(&path)?;
        ctx.payload = json!({ "file": name });
        Ok(())
    }
}

/// Step 2: read the input back, title-case it, and leave a file-shaped
/// result payload for the download endpoint.
pub struct TransformExampleFile;

#[async_trait::async_trait]
impl PipelineTask for TransformExampleFile {
    fn name(&self) -> &str {
        "transform_example_file"
    }

    async fn run(&self, ctx: &mut JobContext) -> Result<(), TaskError> {
        let input_name = ctx
            .payload
            .get("file")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| TaskError::abort("No input file in payload"))?;

        let input_path = ctx.scratch()?.full_path(&input_name)?;
        let input_data = std::fs::read_to_string(&input_path)
            .map_err(|_| TaskError::abort("Cannot read input data"))?;

        let (output_path, mut output) = ctx
            .scratch()?
            .allocate_file_for_writing(Some("example_output"))?;
        output
            .write_all(title_case(&input_data).as_bytes())
            .map_err(CoreError::from)?;

        let name = file_name_of(&output_path)?;
        ctx.payload = json!({
            "file": name,
            "mimetype": "text/plain",
            "filename": "example.txt",
        });
        Ok(())
    }
}

/// Register all built-in pipelines.
///
/// Task lists are fixed in code; only the permission list may be adjusted
/// through configuration, keyed by presentation name.
pub fn register_builtin_pipelines(
    registry: &PipelineRegistry,
    permission_overrides: &HashMap<String, Vec<String>>,
) {
    let permissions = permission_overrides
        .get(EXAMPLE_PRESENTATION)
        .cloned()
        .unwrap_or_default();

    registry.register(
        Pipeline::new(
            EXAMPLE_PRESENTATION,
            vec![
                Arc::new(CreateExampleFile) as Arc<dyn PipelineTask>,
                Arc::new(TransformExampleFile) as Arc<dyn PipelineTask>,
            ],
        )
        .with_permissions(permissions),
    );
}

/// Title-case: uppercase the first letter of every word, lowercase the
/// rest. Word boundaries are any non-alphabetic character.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn file_name_of(path: &std::path::Path) -> Result<String, TaskError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            TaskError::Failed(CoreError::Internal(format!(
                "Allocated path has no usable file name: {}",
                path.display()
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use presenta_core::identity::UserSnapshot;
    use presenta_core::record::RecordData;

    fn test_context(root: &std::path::Path) -> JobContext {
        JobContext::new(
            RecordData {
                id: "R1".into(),
                metadata: json!({}),
            },
            UserSnapshot {
                id: Some("u1".into()),
                email: None,
                roles: vec![],
                display_name: None,
                current_ip: None,
            },
            BTreeMap::new(),
            root,
        )
        .unwrap()
    }

    #[test]
    fn title_case_matches_expected_transform() {
        assert_eq!(title_case("example file\n"), "Example File\n");
        assert_eq!(title_case("ALREADY UPPER"), "Already Upper");
        assert_eq!(title_case("mixed-case words"), "Mixed-Case Words");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn example_tasks_produce_the_expected_artifact() {
        let root = tempfile::tempdir().unwrap();
        let mut ctx = test_context(root.path());

        CreateExampleFile.run(&mut ctx).await.unwrap();
        TransformExampleFile.run(&mut ctx).await.unwrap();

        let result = crate::context::ResultPayload::from_value(&ctx.payload).unwrap();
        assert_eq!(result.mimetype, "text/plain");
        assert_eq!(result.filename, "example.txt");

        let output = ctx.scratch().unwrap().full_path(&result.file).unwrap();
        assert_eq!(std::fs::read_to_string(output).unwrap(), "Example File\n");
    }

    #[tokio::test]
    async fn transform_aborts_on_unreadable_input() {
        let root = tempfile::tempdir().unwrap();
        let mut ctx = test_context(root.path());

        // Point the payload at a file that does not exist.
        ctx.payload = json!({ "file": "000099_missing" });

        let err = TransformExampleFile.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, TaskError::Abort(_)));
    }

    #[tokio::test]
    async fn transform_aborts_when_payload_has_no_file() {
        let root = tempfile::tempdir().unwrap();
        let mut ctx = test_context(root.path());

        let err = TransformExampleFile.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, TaskError::Abort(_)));
    }

    #[test]
    fn builtin_registration_applies_permission_overrides() {
        let registry = PipelineRegistry::new();
        let mut overrides = HashMap::new();
        overrides.insert(
            EXAMPLE_PRESENTATION.to_string(),
            vec!["reader".to_string()],
        );

        register_builtin_pipelines(&registry, &overrides);

        let pipeline = registry.get(EXAMPLE_PRESENTATION).unwrap();
        assert_eq!(pipeline.permissions(), ["reader".to_string()]);
        assert_eq!(pipeline.tasks().len(), 2);
    }
}
