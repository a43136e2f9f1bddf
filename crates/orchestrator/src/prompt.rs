// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the implementation prompt handed to a `CodeGenerator`: title,
//! description, acceptance criteria, completed dependencies, a
//! depth-limited workspace tree, related-file contents, technical
//! context, and a fixed response-format instruction.

use rn_core::TaskContext;
use std::path::Path;

const EXCLUDED_DIR_NAMES: &[&str] = &[
    ".git",
    "target",
    "node_modules",
    "dist",
    "build",
    ".cache",
    "__pycache__",
    ".venv",
    "venv",
];

const TRUNCATION_MARKER: &str = "\n...[truncated]...\n";

const RESPONSE_FORMAT_INSTRUCTION: &str = "## Response Format\n\
Respond with a single JSON object and nothing else:\n\
{\"code_changes\": [{\"file_path\": \"...\", \"operation\": \"create\"|\"modify\"|\"delete\", \"content\": \"...\"}], \"explanation\": \"...\"}";

pub fn build_implementation_prompt(
    task_context: &TaskContext,
    workspace_path: &Path,
    tree_max_depth: usize,
    related_file_max_bytes: usize,
) -> String {
    let mut sections = Vec::new();

    sections.push(format!("# Task: {}", task_context.title));
    sections.push(task_context.description.clone());

    if !task_context.acceptance_criteria.is_empty() {
        let mut block = String::from("## Acceptance Criteria\n");
        for (i, criterion) in task_context.acceptance_criteria.iter().enumerate() {
            block.push_str(&format!("{}. {}\n", i + 1, criterion));
        }
        sections.push(block);
    }

    if !task_context.dependencies.is_empty() {
        let mut block = String::from("## Completed Dependencies\n");
        for dependency in &task_context.dependencies {
            block.push_str(&format!("- {dependency}\n"));
        }
        sections.push(block);
    }

    sections.push(format!(
        "## Workspace Layout\n{}",
        render_workspace_tree(workspace_path, tree_max_depth)
    ));

    if !task_context.related_files.is_empty() {
        let mut block = String::from("## Related Files\n");
        for relative in &task_context.related_files {
            block.push_str(&format!("### {}\n", relative.display()));
            match std::fs::read_to_string(workspace_path.join(relative)) {
                Ok(content) => {
                    block.push_str(&truncate_file_content(&content, related_file_max_bytes));
                    block.push('\n');
                }
                Err(e) => block.push_str(&format!("(unreadable: {e})\n")),
            }
        }
        sections.push(block);
    }

    sections.push(render_technical_context(task_context));
    sections.push(RESPONSE_FORMAT_INSTRUCTION.to_string());

    sections.join("\n\n")
}

fn render_technical_context(task_context: &TaskContext) -> String {
    let mut block = String::from("## Technical Context\n");
    block.push_str(&format!("- spec_name: {}\n", task_context.spec_name));
    if let Some(skill) = &task_context.required_skill {
        block.push_str(&format!("- required_skill: {skill}\n"));
    }
    if let Some(complexity) = task_context.complexity {
        block.push_str(&format!("- complexity: {complexity:?}\n"));
    }
    let mut keys: Vec<&String> = task_context.metadata.keys().collect();
    keys.sort();
    for key in keys {
        block.push_str(&format!("- {key}: {}\n", task_context.metadata[key]));
    }
    block
}

fn render_workspace_tree(root: &Path, max_depth: usize) -> String {
    let mut lines = Vec::new();
    walk(root, 0, max_depth, &mut lines);
    if lines.is_empty() {
        "(empty workspace)".to_string()
    } else {
        lines.join("\n")
    }
}

fn walk(dir: &Path, depth: usize, max_depth: usize, lines: &mut Vec<String>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if name_str.starts_with('.') || EXCLUDED_DIR_NAMES.contains(&name_str.as_ref()) {
            continue;
        }
        let path = entry.path();
        let indent = "  ".repeat(depth);
        if path.is_dir() {
            lines.push(format!("{indent}{name_str}/"));
            walk(&path, depth + 1, max_depth, lines);
        } else {
            lines.push(format!("{indent}{name_str}"));
        }
    }
}

fn truncate_file_content(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }
    let mut cut = max_bytes;
    while cut > 0 && !content.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &content[..cut])
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
