//! Dependency resolution — builds a leveled stage plan from an action's
//! `dependsOn` edges: an ordered sequence of stages, each containing action
//! ids that may run in parallel.
//!
//! Rules enforced:
//! 1. `dependsOn` must reference known action ids; self-dependency is rejected.
//! 2. The dependency graph must be acyclic (detected via DFS with a
//!    recursion stack, naming an involved id on failure).
//! 3. `level(a) = 0` if `dependsOn(a)` is empty, else `1 + max(level(d))`.

use std::collections::{HashMap, HashSet};

use crate::models::WorkflowDefinition;
use crate::EngineError;

pub type StagePlan = Vec<Vec<String>>;

pub fn build_stage_plan(workflow: &WorkflowDefinition) -> Result<StagePlan, EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for action in &workflow.actions {
        if !seen_ids.insert(action.id.as_str()) {
            return Err(EngineError::DuplicateActionId(action.id.clone()));
        }
    }

    for action in &workflow.actions {
        for dep in &action.depends_on {
            if dep == &action.id {
                return Err(EngineError::UnknownDependency { action_id: action.id.clone(), dependency: dep.clone() });
            }
            if !seen_ids.contains(dep.as_str()) {
                return Err(EngineError::UnknownDependency { action_id: action.id.clone(), dependency: dep.clone() });
            }
        }
    }

    detect_cycle(workflow)?;

    let mut levels: HashMap<&str, usize> = HashMap::new();
    let by_id: HashMap<&str, &crate::models::ActionConfig> =
        workflow.actions.iter().map(|a| (a.id.as_str(), a)).collect();

    for action in &workflow.actions {
        compute_level(action.id.as_str(), &by_id, &mut levels);
    }

    let max_level = levels.values().copied().max().unwrap_or(0);
    let mut stages: StagePlan = vec![Vec::new(); max_level + 1];
    for action in &workflow.actions {
        let level = levels[action.id.as_str()];
        stages[level].push(action.id.clone());
    }
    stages.retain(|stage| !stage.is_empty());

    Ok(stages)
}

fn compute_level<'a>(id: &'a str, by_id: &HashMap<&'a str, &'a crate::models::ActionConfig>, levels: &mut HashMap<&'a str, usize>) -> usize {
    if let Some(&level) = levels.get(id) {
        return level;
    }
    let action = by_id[id];
    let level = action
        .depends_on
        .iter()
        .map(|dep| compute_level(dep.as_str(), by_id, levels))
        .max()
        .map(|m| m + 1)
        .unwrap_or(0);
    levels.insert(id, level);
    level
}

fn detect_cycle(workflow: &WorkflowDefinition) -> Result<(), EngineError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let by_id: HashMap<&str, &crate::models::ActionConfig> =
        workflow.actions.iter().map(|a| (a.id.as_str(), a)).collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a crate::models::ActionConfig>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), EngineError> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(EngineError::CycleDetected),
            None => {}
        }
        marks.insert(id, Mark::Visiting);
        for dep in &by_id[id].depends_on {
            visit(dep.as_str(), by_id, marks)?;
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    for action in &workflow.actions {
        visit(action.id.as_str(), &by_id, &mut marks)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ComplexityReport {
    pub action_count: usize,
    pub stage_count: usize,
    pub longest_chain: usize,
    /// `action_count / stage_count`, rounded — how much parallelism the
    /// plan actually exploits versus a fully serial execution.
    pub parallelization_ratio: f64,
}

pub fn analyze_complexity(plan: &StagePlan) -> ComplexityReport {
    let action_count: usize = plan.iter().map(Vec::len).sum();
    let stage_count = plan.len();
    let longest_chain = stage_count;
    let parallelization_ratio = if stage_count == 0 { 0.0 } else { action_count as f64 / stage_count as f64 };
    ComplexityReport { action_count, stage_count, longest_chain, parallelization_ratio }
}

/// A non-blocking warning surfaced during registration; does not prevent
/// the workflow from being accepted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DependencyWarning {
    pub action_id: String,
    pub message: String,
}

pub fn prevalidate_warnings(workflow: &WorkflowDefinition) -> Vec<DependencyWarning> {
    workflow
        .actions
        .iter()
        .filter(|a| a.depends_on.len() > 5)
        .map(|a| DependencyWarning {
            action_id: a.id.clone(),
            message: format!("action '{}' depends on {} other actions; consider restructuring", a.id, a.depends_on.len()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionConfig, OnError, Trigger};

    fn action(id: &str, depends_on: &[&str]) -> ActionConfig {
        ActionConfig {
            id: id.to_string(),
            action_type: "audit_log".into(),
            name: id.to_string(),
            params: serde_json::Value::Null,
            condition: None,
            timeout_seconds: None,
            retry_policy: None,
            on_error: OnError::Stop,
            run_async: false,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn workflow(actions: Vec<ActionConfig>) -> WorkflowDefinition {
        WorkflowDefinition::new("test", Trigger::Manual, actions)
    }

    #[test]
    fn linear_chain_produces_one_action_per_stage() {
        let wf = workflow(vec![action("a", &[]), action("b", &["a"]), action("c", &["b"])]);
        let plan = build_stage_plan(&wf).unwrap();
        assert_eq!(plan, vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]);
    }

    #[test]
    fn independent_actions_share_a_stage() {
        let wf = workflow(vec![action("a", &[]), action("b", &[]), action("c", &["a", "b"])]);
        let plan = build_stage_plan(&wf).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].len(), 2);
        assert_eq!(plan[1], vec!["c".to_string()]);
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let wf = workflow(vec![action("a", &["ghost"])]);
        assert!(matches!(build_stage_plan(&wf), Err(EngineError::UnknownDependency { .. })));
    }

    #[test]
    fn self_dependency_is_rejected() {
        let wf = workflow(vec![action("a", &["a"])]);
        assert!(matches!(build_stage_plan(&wf), Err(EngineError::UnknownDependency { .. })));
    }

    #[test]
    fn cycle_is_detected() {
        let wf = workflow(vec![action("a", &["c"]), action("b", &["a"]), action("c", &["b"])]);
        assert!(matches!(build_stage_plan(&wf), Err(EngineError::CycleDetected)));
    }

    #[test]
    fn duplicate_action_id_is_rejected() {
        let wf = workflow(vec![action("a", &[]), action("a", &[])]);
        assert!(matches!(build_stage_plan(&wf), Err(EngineError::DuplicateActionId(id)) if id == "a"));
    }

    #[test]
    fn complexity_report_reflects_plan_shape() {
        let wf = workflow(vec![action("a", &[]), action("b", &[]), action("c", &["a", "b"])]);
        let plan = build_stage_plan(&wf).unwrap();
        let report = analyze_complexity(&plan);
        assert_eq!(report.action_count, 3);
        assert_eq!(report.stage_count, 2);
    }

    #[test]
    fn more_than_five_dependencies_warns() {
        let deps: Vec<&str> = vec!["a", "b", "c", "d", "e", "f"];
        let mut actions: Vec<ActionConfig> = deps.iter().map(|d| action(d, &[])).collect();
        actions.push(action("g", &deps));
        let wf = workflow(actions);
        let warnings = prevalidate_warnings(&wf);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].action_id, "g");
    }
}
