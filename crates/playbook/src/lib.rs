// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rn-playbook: the Playbook Evaluator. Parses a YAML step list,
//! evaluates per-step conditions and `${name}` substitution against a
//! context, and executes shell steps with timeout and retry through
//! `rn-shell`.

mod condition;
mod default_playbook;
mod engine;
mod model;
mod template;

pub use default_playbook::default_playbook;
pub use engine::{execute_playbook, load_playbook_or_default, parse_playbook};
pub use model::{Playbook, PlaybookResult, PlaybookStep, StepResult};
