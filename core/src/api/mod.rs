//! Request handling behind the prompt HTTP API.
//!
//! Routing lives elsewhere; these handlers take the decoded JSON bodies and
//! return the response body or a [`PromptError`] whose `status()` is the HTTP
//! status to answer with.

use crate::error::{ErrorCode, PromptError, Result};
use crate::logger::Logger;
use crate::template::{extract_variables, Prompt};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

mod store;

pub use store::{ContentUpdate, ProjectRecord, PromptRecord, PromptStore, StoredPrompt};

/// Body of `POST /api/prompt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
}

/// Body of `PUT /api/updatePrompt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptRequest {
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptResponse {
    pub message: String,
    pub prompt_id: String,
    pub updated_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPromptsResponse {
    pub project_id: String,
    pub project_name: String,
    pub project_key: String,
    pub prompts: Vec<PromptRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// JSON error body, `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub struct PromptService<S> {
    store: S,
    logger: Logger,
}

impl<S: PromptStore> PromptService<S> {
    pub fn new(store: S, logger: Logger) -> Self {
        Self { store, logger }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse { status: "ok".to_string() }
    }

    /// `POST /api/prompt`: the published prompt and its stored variable list.
    pub fn get_prompt(&self, request: &PromptRequest) -> Result<Prompt> {
        let prompt_key = required_field("promptKey", request.prompt_key.as_deref())?;
        let project_key = request.project_key.as_deref().filter(|k| !k.is_empty());

        let record = self
            .store
            .find_prompt(project_key, prompt_key)
            .inspect_err(|e| self.logger.error("api", "get_prompt", &e.to_string()))?
            .ok_or_else(|| not_found(ErrorCode::PromptNotFound, "Prompt not found", prompt_key))?;

        self.logger.info("api", "get_prompt", &format!("prompt_key={prompt_key}, id={}", record.id));
        Ok(Prompt { prompt: record.content, variables: record.variables })
    }

    /// `PUT /api/updatePrompt`: saves new content and recomputes its variables.
    pub fn update_prompt(&self, request: &UpdatePromptRequest) -> Result<UpdatePromptResponse> {
        let project_key = required_field("projectKey", request.project_key.as_deref())?;
        let prompt_id = required_field("promptId", request.prompt_id.as_deref())?;
        let content = required_field("content", request.content.as_deref())?;

        let stored = self
            .store
            .load_prompt(prompt_id)
            .inspect_err(|e| self.logger.error("api", "update_prompt", &e.to_string()))?
            .ok_or_else(|| not_found(ErrorCode::PromptNotFound, "Prompt not found", prompt_id))?;

        if stored.project_key.as_deref() != Some(project_key) {
            self.logger.error(
                "api",
                "update_prompt",
                &format!("prompt_id={prompt_id} is not in project {project_key}"),
            );
            return Err(PromptError::Validation {
                code: ErrorCode::ForeignPrompt,
                message: "Prompt does not belong to the specified project".to_string(),
                context: prompt_id.to_string(),
            });
        }

        let variables = extract_variables(content);
        self.store
            .save_content(ContentUpdate {
                prompt_id: prompt_id.to_string(),
                content: content.to_string(),
                variables: variables.clone(),
                updated_at: Utc::now().timestamp_millis(),
            })
            .inspect_err(|e| self.logger.error("api", "update_prompt", &e.to_string()))?;

        self.logger.info(
            "api",
            "update_prompt",
            &format!("prompt_id={prompt_id}, variables=[{variables}]"),
        );
        Ok(UpdatePromptResponse {
            message: "Prompt updated successfully".to_string(),
            prompt_id: prompt_id.to_string(),
            updated_content: content.to_string(),
        })
    }

    /// `GET /api/projectPrompts/:projectKey`.
    pub fn project_prompts(&self, project_key: &str) -> Result<ProjectPromptsResponse> {
        let project_key = required_field("projectKey", Some(project_key))?;
        let project = self
            .store
            .find_project(project_key)
            .inspect_err(|e| self.logger.error("api", "project_prompts", &e.to_string()))?
            .ok_or_else(|| not_found(ErrorCode::ProjectNotFound, "Project not found", project_key))?;

        self.logger.info(
            "api",
            "project_prompts",
            &format!("project_key={project_key}, prompts={}", project.prompts.len()),
        );
        Ok(ProjectPromptsResponse {
            project_id: project.id,
            project_name: project.name,
            project_key: project.key,
            prompts: project.prompts,
        })
    }
}

/// Status code and JSON body for a handler result.
pub fn reply<T: Serialize>(result: Result<T>) -> (u16, Value) {
    match result {
        Ok(body) => match serde_json::to_value(body) {
            Ok(value) => (200, value),
            Err(e) => (500, json!(ErrorBody { error: format!("Internal server error: {e}") })),
        },
        Err(err) => (err.status(), json!(ErrorBody { error: err.public_message() })),
    }
}

fn required_field<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PromptError::invalid_request(format!("Missing or invalid '{name}'"), name)),
    }
}

fn not_found(code: ErrorCode, message: &str, context: &str) -> PromptError {
    PromptError::Validation { code, message: message.to_string(), context: context.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        projects: Mutex<Vec<ProjectRecord>>,
        fail: bool,
    }

    impl MemoryStore {
        fn seeded() -> Self {
            let prompt = |id: &str, name: &str, content: &str| PromptRecord {
                id: id.to_string(),
                name: name.to_string(),
                content: content.to_string(),
                variables: extract_variables(content),
                created_at: 1,
                updated_at: 1,
            };
            Self {
                projects: Mutex::new(vec![
                    ProjectRecord {
                        id: "proj-a".into(),
                        name: "Support bot".into(),
                        key: "key-a".into(),
                        prompts: vec![
                            prompt("p1", "greeting", "Hello {{name}}, welcome to {{place}}."),
                            prompt("p2", "farewell", "Bye."),
                        ],
                    },
                    ProjectRecord {
                        id: "proj-b".into(),
                        name: "Other".into(),
                        key: "key-b".into(),
                        prompts: vec![prompt("p3", "greeting", "Yo {{who}}")],
                    },
                ]),
                fail: false,
            }
        }

        fn broken() -> Self {
            Self { fail: true, ..Self::default() }
        }

        fn check(&self) -> Result<()> {
            if self.fail {
                return Err(PromptError::Store { code: ErrorCode::StoreFailed, message: "database unavailable".into() });
            }
            Ok(())
        }
    }

    impl PromptStore for MemoryStore {
        fn find_prompt(&self, project_key: Option<&str>, prompt_key: &str) -> Result<Option<PromptRecord>> {
            self.check()?;
            let projects = self.projects.lock().unwrap();
            Ok(projects
                .iter()
                .filter(|p| project_key.map_or(true, |k| p.key == k))
                .flat_map(|p| p.prompts.iter())
                .find(|r| r.name == prompt_key)
                .cloned())
        }

        fn load_prompt(&self, prompt_id: &str) -> Result<Option<StoredPrompt>> {
            self.check()?;
            let projects = self.projects.lock().unwrap();
            Ok(projects.iter().find_map(|p| {
                p.prompts.iter().find(|r| r.id == prompt_id).map(|r| StoredPrompt {
                    record: r.clone(),
                    project_key: Some(p.key.clone()),
                })
            }))
        }

        fn find_project(&self, project_key: &str) -> Result<Option<ProjectRecord>> {
            self.check()?;
            Ok(self.projects.lock().unwrap().iter().find(|p| p.key == project_key).cloned())
        }

        fn save_content(&self, update: ContentUpdate) -> Result<()> {
            self.check()?;
            let mut projects = self.projects.lock().unwrap();
            let record = projects
                .iter_mut()
                .flat_map(|p| p.prompts.iter_mut())
                .find(|r| r.id == update.prompt_id)
                .unwrap();
            record.content = update.content;
            record.variables = update.variables;
            record.updated_at = update.updated_at;
            Ok(())
        }
    }

    fn service(store: MemoryStore) -> PromptService<MemoryStore> {
        PromptService::new(store, Logger::discard())
    }

    fn update(project: &str, id: &str, content: &str) -> UpdatePromptRequest {
        UpdatePromptRequest {
            project_key: Some(project.into()),
            prompt_id: Some(id.into()),
            content: Some(content.into()),
        }
    }

    #[test]
    fn get_prompt_returns_stored_content_and_variables() {
        let svc = service(MemoryStore::seeded());
        let request = PromptRequest { prompt_key: Some("greeting".into()), project_key: Some("key-a".into()) };
        let prompt = svc.get_prompt(&request).unwrap();
        assert_eq!(prompt.prompt, "Hello {{name}}, welcome to {{place}}.");
        assert_eq!(prompt.variables, "name, place");

        let other = PromptRequest { prompt_key: Some("greeting".into()), project_key: Some("key-b".into()) };
        assert_eq!(svc.get_prompt(&other).unwrap().variables, "who");
    }

    #[test]
    fn get_prompt_validates_and_reports_missing_prompts() {
        let svc = service(MemoryStore::seeded());
        let err = svc.get_prompt(&PromptRequest::default()).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.public_message(), "Missing or invalid 'promptKey'");

        let request = PromptRequest { prompt_key: Some("nope".into()), project_key: Some("key-a".into()) };
        assert_eq!(svc.get_prompt(&request).unwrap_err().status(), 404);
    }

    #[test]
    fn update_recomputes_variables_from_new_content() {
        let svc = service(MemoryStore::seeded());
        let response = svc.update_prompt(&update("key-a", "p2", "Bye {{ name }}, see you {{when}}.")).unwrap();
        assert_eq!(response.message, "Prompt updated successfully");
        assert_eq!(response.prompt_id, "p2");
        assert_eq!(response.updated_content, "Bye {{ name }}, see you {{when}}.");

        let stored = svc.store().load_prompt("p2").unwrap().unwrap().record;
        assert_eq!(stored.variables, "name, when");
        assert!(stored.updated_at > 1);

        let fetched = svc
            .get_prompt(&PromptRequest { prompt_key: Some("farewell".into()), project_key: Some("key-a".into()) })
            .unwrap();
        assert_eq!(fetched.variables, "name, when");
    }

    #[test]
    fn update_rejects_missing_fields_in_order() {
        let svc = service(MemoryStore::seeded());
        let err = svc.update_prompt(&UpdatePromptRequest::default()).unwrap_err();
        assert_eq!(err.public_message(), "Missing or invalid 'projectKey'");

        let err = svc
            .update_prompt(&UpdatePromptRequest { project_key: Some("key-a".into()), ..Default::default() })
            .unwrap_err();
        assert_eq!(err.public_message(), "Missing or invalid 'promptId'");

        let err = svc.update_prompt(&update("key-a", "p1", "")).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.public_message(), "Missing or invalid 'content'");
    }

    #[test]
    fn update_checks_prompt_ownership() {
        let svc = service(MemoryStore::seeded());
        assert_eq!(svc.update_prompt(&update("key-a", "missing", "x")).unwrap_err().status(), 404);

        let err = svc.update_prompt(&update("key-a", "p3", "x")).unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.public_message(), "Prompt does not belong to the specified project");
        assert_eq!(svc.store().load_prompt("p3").unwrap().unwrap().record.content, "Yo {{who}}");
    }

    #[test]
    fn project_prompts_lists_the_project() {
        let svc = service(MemoryStore::seeded());
        let response = svc.project_prompts("key-a").unwrap();
        assert_eq!(response.project_id, "proj-a");
        assert_eq!(response.prompts.len(), 2);
        assert_eq!(svc.project_prompts("unknown").unwrap_err().status(), 404);
        assert_eq!(svc.project_prompts("").unwrap_err().status(), 400);
    }

    #[test]
    fn store_failures_become_server_errors() {
        let svc = service(MemoryStore::broken());
        let request = PromptRequest { prompt_key: Some("greeting".into()), project_key: None };
        let (status, body) = reply(svc.get_prompt(&request));
        assert_eq!(status, 500);
        assert_eq!(body, json!({"error": "database unavailable"}));
    }

    #[test]
    fn reply_serializes_successes_in_camel_case() {
        let svc = service(MemoryStore::seeded());
        let (status, body) = reply(svc.update_prompt(&update("key-a", "p1", "Hi {{x}}")));
        assert_eq!(status, 200);
        assert_eq!(body["promptId"], "p1");
        assert_eq!(body["updatedContent"], "Hi {{x}}");

        let (status, body) = reply(Ok(svc.health()));
        assert_eq!(status, 200);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[test]
    fn requests_decode_from_wire_json() {
        let request: UpdatePromptRequest =
            serde_json::from_str(r#"{"projectKey":"key-a","promptId":"p1","content":"New {{v}}"}"#).unwrap();
        assert_eq!(request, update("key-a", "p1", "New {{v}}"));

        let request: PromptRequest = serde_json::from_str(r#"{"promptKey":"greeting"}"#).unwrap();
        assert_eq!(request.project_key, None);
    }
}
