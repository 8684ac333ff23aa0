use anyhow::{anyhow, ensure, Context, Result};
use promptic_core::api::{
    ContentUpdate, ProjectRecord, PromptRecord, PromptRequest, PromptService, PromptStore, StoredPrompt,
    UpdatePromptRequest,
};
use promptic_core::logger::Logger;
use promptic_core::prompts::{ToolInvocation, PROMPT_WRITE_TOOL};
use promptic_core::test_runner;
use promptic_core::{extract_variables, DiffSession, LineKind, Prompt, PromptClient, Resolution};
use serde_json::json;
use std::cell::RefCell;
use std::collections::BTreeMap;

struct Test {
    name: &'static str,
    run: fn() -> Result<()>,
}

macro_rules! tests {
    ($($test_name:ident),*) => { [ $(Test { name: stringify!($test_name), run: $test_name }),* ] };
}

fn main() {
    let tests = tests![
        a1_extract_then_format, a2_missing_variables_reported,
        b1_modified_line_accepted, b2_tool_call_starts_review, b3_reject_all_restores,
        c1_update_then_fetch, c2_foreign_prompt_refused,
        d1_review_cases
    ];
    println!("Running Promptic Integration Test Suite...");
    println!("========================================");
    let (passed, total) = tests.iter().fold((0, 0), |(mut passed, total), test| {
        print!("  - Running Test [{}]: ", test.name);
        match (test.run)() {
            Ok(()) => { println!("\x1B[32mPASS\x1B[0m"); passed += 1; }
            Err(e) => { println!("\x1B[31mFAIL\x1B[0m"); eprintln!("    Error: {e:?}"); }
        }
        (passed, total + 1)
    });
    println!("========================================");
    println!("Gauntlet Summary:");
    println!("  Total: {total}");
    println!("  \x1B[32mPass : {passed}\x1B[0m");
    println!("  \x1B[31mFail : {}\x1B[0m", total - passed);
    println!("========================================");
    if passed != total { std::process::exit(1); }
}

fn a1_extract_then_format() -> Result<()> {
    let text = "Hello {{name}}, welcome to {{ place }}. Bye {{name}}.";
    let prompt = Prompt { prompt: text.to_string(), variables: extract_variables(text) };
    ensure!(prompt.variables == "name, place, name", "variables were {:?}", prompt.variables);
    let out = prompt.format(&values(&[("name", "Ada"), ("place", "Paris")]))?;
    ensure!(out == "Hello Ada, welcome to {{ place }}. Bye Ada.", "formatted to {out:?}");
    Ok(())
}

fn a2_missing_variables_reported() -> Result<()> {
    let prompt = Prompt::new("{{a}} {{b}}");
    let err = prompt.format(&values(&[("a", "1")])).err().ok_or_else(|| anyhow!("format succeeded"))?;
    ensure!(err.to_string() == "Missing required variables: b. All required variables: a, b", "{err}");
    Ok(())
}

fn b1_modified_line_accepted() -> Result<()> {
    let mut session = DiffSession::new("line1\nline2\nline3\n", Logger::discard());
    session.begin_diff("line1\nlineTWO\nline3\n");
    let kinds: Vec<LineKind> = session.processed_hunks().iter().map(|l| l.kind).collect();
    ensure!(kinds == [LineKind::Unchanged, LineKind::Removed, LineKind::Added, LineKind::Unchanged]);
    ensure!(session.accept_hunk(2)? == Resolution::Converged);
    ensure!(session.committed() == "line1\nlineTWO\nline3\n");
    ensure!(!session.is_reviewing());
    Ok(())
}

fn b2_tool_call_starts_review() -> Result<()> {
    let mut session = DiffSession::new("You are helpful.\n", Logger::discard());
    let other = ToolInvocation { tool_name: "search".into(), args: json!({}) };
    ensure!(!session.begin_from_tool(&other)?);
    let write = ToolInvocation { tool_name: PROMPT_WRITE_TOOL.into(), args: json!({"prompt": "You are terse.\n"}) };
    ensure!(session.begin_from_tool(&write)?);
    ensure!(session.stats().pending() == 2);
    Ok(())
}

fn b3_reject_all_restores() -> Result<()> {
    let mut session = DiffSession::new("a\nb\n", Logger::discard());
    session.begin_diff("a\nc\nd\n");
    session.reject_all();
    ensure!(session.working() == "a\nb\n" && !session.is_reviewing());
    ensure!(session.processed_hunks().is_empty());
    Ok(())
}

fn c1_update_then_fetch() -> Result<()> {
    let service = PromptService::new(seeded_store(), Logger::discard());
    let response = service.update_prompt(&UpdatePromptRequest {
        project_key: Some("proj-key".into()),
        prompt_id: Some("p1".into()),
        content: Some("Summarize {{topic}} for {{audience}}.".into()),
    })?;
    ensure!(response.message == "Prompt updated successfully");

    let source = |key: &str| {
        service.get_prompt(&PromptRequest { prompt_key: Some(key.to_string()), project_key: Some("proj-key".into()) })
    };
    let mut client = PromptClient::new(source, Logger::discard()).with_cache_ttl(60);
    let text = client
        .format("summary", &values(&[("topic", "tides"), ("audience", "kids")]))
        .context("formatting the updated prompt")?;
    ensure!(text == "Summarize tides for kids.", "formatted to {text:?}");
    Ok(())
}

fn c2_foreign_prompt_refused() -> Result<()> {
    let service = PromptService::new(seeded_store(), Logger::discard());
    let err = service
        .update_prompt(&UpdatePromptRequest {
            project_key: Some("other-key".into()),
            prompt_id: Some("p1".into()),
            content: Some("x".into()),
        })
        .err()
        .ok_or_else(|| anyhow!("update succeeded"))?;
    ensure!(err.status() == 403, "status was {}", err.status());
    Ok(())
}

fn d1_review_cases() -> Result<()> {
    let cases = test_runner::find_cases_dir().ok_or_else(|| anyhow!("tests/cases not found"))?;
    let report = test_runner::run(&cases);
    ensure!(report.succeeded(), "{}", report.log);
    Ok(())
}

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Single-project store kept in memory.
struct MemoryStore {
    project: RefCell<ProjectRecord>,
}

fn seeded_store() -> MemoryStore {
    let content = "Summarize {{topic}}.".to_string();
    MemoryStore {
        project: RefCell::new(ProjectRecord {
            id: "proj-1".into(),
            name: "Demo".into(),
            key: "proj-key".into(),
            prompts: vec![PromptRecord {
                id: "p1".into(),
                name: "summary".into(),
                variables: extract_variables(&content),
                content,
                created_at: 0,
                updated_at: 0,
            }],
        }),
    }
}

impl PromptStore for MemoryStore {
    fn find_prompt(&self, project_key: Option<&str>, prompt_key: &str) -> promptic_core::Result<Option<PromptRecord>> {
        let project = self.project.borrow();
        if project_key.is_some_and(|k| k != project.key) {
            return Ok(None);
        }
        Ok(project.prompts.iter().find(|p| p.name == prompt_key).cloned())
    }

    fn load_prompt(&self, prompt_id: &str) -> promptic_core::Result<Option<StoredPrompt>> {
        let project = self.project.borrow();
        Ok(project
            .prompts
            .iter()
            .find(|p| p.id == prompt_id)
            .map(|record| StoredPrompt { record: record.clone(), project_key: Some(project.key.clone()) }))
    }

    fn find_project(&self, project_key: &str) -> promptic_core::Result<Option<ProjectRecord>> {
        let project = self.project.borrow();
        Ok((project.key == project_key).then(|| project.clone()))
    }

    fn save_content(&self, update: ContentUpdate) -> promptic_core::Result<()> {
        let mut project = self.project.borrow_mut();
        if let Some(record) = project.prompts.iter_mut().find(|p| p.id == update.prompt_id) {
            record.content = update.content;
            record.variables = update.variables;
            record.updated_at = update.updated_at;
        }
        Ok(())
    }
}
