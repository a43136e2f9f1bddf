// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ecosystem detection for the test phase: when a task doesn't say what
//! command to run, pick one from whichever build-file signature is
//! present at the workspace root.

use std::path::Path;

/// Ecosystem guessed from a signature file at the workspace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcosystemKind {
    Node,
    Python,
    Go,
    Rust,
    Ruby,
    JavaMaven,
    JavaGradle,
}

impl EcosystemKind {
    pub fn default_test_command(self) -> &'static str {
        match self {
            EcosystemKind::Node => "npm test",
            EcosystemKind::Python => "pytest",
            EcosystemKind::Go => "go test ./...",
            EcosystemKind::Rust => "cargo test",
            EcosystemKind::Ruby => "bundle exec rspec",
            EcosystemKind::JavaMaven => "mvn test",
            EcosystemKind::JavaGradle => "./gradlew test",
        }
    }
}

const SIGNATURES: &[(&str, EcosystemKind)] = &[
    ("package.json", EcosystemKind::Node),
    ("requirements.txt", EcosystemKind::Python),
    ("pytest.ini", EcosystemKind::Python),
    ("pyproject.toml", EcosystemKind::Python),
    ("go.mod", EcosystemKind::Go),
    ("Cargo.toml", EcosystemKind::Rust),
    ("Gemfile", EcosystemKind::Ruby),
    ("pom.xml", EcosystemKind::JavaMaven),
    ("build.gradle", EcosystemKind::JavaGradle),
];

/// Checks `SIGNATURES` in order and returns the first match at the
/// workspace root. Order matters only when a workspace happens to carry
/// more than one signature file.
pub fn detect(workspace_path: &Path) -> Option<EcosystemKind> {
    SIGNATURES
        .iter()
        .find(|(file, _)| workspace_path.join(file).is_file())
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
#[path = "ecosystem_tests.rs"]
mod tests;
