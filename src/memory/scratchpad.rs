//! 任务草稿板（Scratchpad）
//!
//! 单次 run 的研究任务图与最终答案槽。任务 id 从 0 单调递增、不复用、不删除；
//! depends_on 只能引用创建时已存在的任务。只通过 add_task / complete_task 修改。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::ToolError;

pub type TaskId = u64;

/// 任务状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Complete,
    Blocked,
}

/// 研究任务
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub status: TaskStatus,
    pub depends_on: Vec<TaskId>,
    pub result: Option<String>,
}

/// snapshot() 的序列化视图（字段顺序即输出顺序）
#[derive(Serialize)]
struct SnapshotView<'a> {
    question: &'a str,
    tasks: &'a [Task],
    final_answer: Option<&'a str>,
}

#[derive(Clone, Debug)]
pub struct Scratchpad {
    question: String,
    tasks: Vec<Task>,
    final_answer: Option<String>,
    next_id: TaskId,
    strict_dependencies: bool,
}

impl Scratchpad {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            tasks: Vec::new(),
            final_answer: None,
            next_id: 0,
            strict_dependencies: false,
        }
    }

    /// 开启后 complete_task 拒绝完成依赖未全部完成的任务
    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    /// 新建任务；depends_on 中任一 id 不存在则返回 InvalidDependency 且不修改状态
    pub fn add_task(
        &mut self,
        description: impl Into<String>,
        depends_on: &[TaskId],
    ) -> Result<TaskId, ToolError> {
        // id 不删除不复用，所以「已存在」等价于 id < next_id
        if let Some(&missing) = depends_on.iter().find(|&&id| id >= self.next_id) {
            return Err(ToolError::InvalidDependency(missing));
        }

        let mut seen = HashSet::new();
        let depends_on: Vec<TaskId> = depends_on
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            description: description.into(),
            status: TaskStatus::Pending,
            depends_on,
            result: None,
        });
        Ok(id)
    }

    /// 标记完成并记录结果；已完成的任务再次完成时覆盖结果
    pub fn complete_task(
        &mut self,
        task_id: TaskId,
        result: impl Into<String>,
    ) -> Result<(), ToolError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or(ToolError::UnknownTask(task_id))?;

        if self.strict_dependencies {
            let complete = self.complete_ids();
            let missing: Vec<TaskId> = self.tasks[idx]
                .depends_on
                .iter()
                .copied()
                .filter(|id| !complete.contains(id))
                .collect();
            if !missing.is_empty() {
                return Err(ToolError::UnmetDependencies { task_id, missing });
            }
        }

        let task = &mut self.tasks[idx];
        task.status = TaskStatus::Complete;
        task.result = Some(result.into());
        Ok(())
    }

    pub fn set_final_answer(&mut self, answer: impl Into<String>) {
        self.final_answer = Some(answer.into());
    }

    /// Pending 且依赖全部完成的任务（仅作为提示提供给 Planner，不在派发时强制）
    pub fn runnable_tasks(&self) -> Vec<&Task> {
        let complete = self.complete_ids();
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| t.depends_on.iter().all(|id| complete.contains(id)))
            .collect()
    }

    /// 已完成且结果非空的任务，按创建顺序
    pub fn completed_results(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tasks.iter().filter_map(|t| match (&t.status, &t.result) {
            (TaskStatus::Complete, Some(r)) if !r.is_empty() => {
                Some((t.description.as_str(), r.as_str()))
            }
            _ => None,
        })
    }

    /// 确定性序列化：question、全部任务（创建顺序）、final_answer
    pub fn snapshot(&self) -> String {
        let view = SnapshotView {
            question: &self.question,
            tasks: &self.tasks,
            final_answer: self.final_answer.as_deref(),
        };
        serde_json::to_string_pretty(&view).unwrap_or_else(|_| "{}".to_string())
    }

    fn complete_ids(&self) -> HashSet<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .map(|t| t.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_task_ids_strictly_increasing() {
        let mut pad = Scratchpad::new("q");
        let a = pad.add_task("a", &[]).unwrap();
        let b = pad.add_task("b", &[a]).unwrap();
        let c = pad.add_task("c", &[a, b]).unwrap();
        assert_eq!((a, b, c), (0, 1, 2));
        let ids: Vec<_> = pad.tasks().iter().map(|t| t.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_add_task_invalid_dependency_leaves_state_unchanged() {
        let mut pad = Scratchpad::new("q");
        pad.add_task("a", &[]).unwrap();
        let before = pad.snapshot();

        let err = pad.add_task("b", &[0, 7]).unwrap_err();
        assert_eq!(err, ToolError::InvalidDependency(7));
        assert_eq!(pad.snapshot(), before);

        // 失败不消耗 id
        assert_eq!(pad.add_task("b", &[0]).unwrap(), 1);
    }

    #[test]
    fn test_add_task_cannot_depend_on_itself() {
        let mut pad = Scratchpad::new("q");
        assert_eq!(
            pad.add_task("self", &[0]),
            Err(ToolError::InvalidDependency(0))
        );
        assert!(pad.tasks().is_empty());
    }

    #[test]
    fn test_depends_on_is_deduplicated() {
        let mut pad = Scratchpad::new("q");
        pad.add_task("a", &[]).unwrap();
        pad.add_task("b", &[]).unwrap();
        let c = pad.add_task("c", &[1, 0, 1]).unwrap();
        assert_eq!(pad.task(c).unwrap().depends_on, vec![1, 0]);
    }

    #[test]
    fn test_complete_unknown_task() {
        let mut pad = Scratchpad::new("q");
        assert_eq!(pad.complete_task(4, "x"), Err(ToolError::UnknownTask(4)));
    }

    #[test]
    fn test_complete_task_records_result() {
        let mut pad = Scratchpad::new("q");
        let id = pad.add_task("find founder", &[]).unwrap();
        pad.complete_task(id, "Dana Holt").unwrap();
        let task = pad.task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Complete);
        assert_eq!(task.result.as_deref(), Some("Dana Holt"));
    }

    #[test]
    fn test_runnable_tasks_respects_dependencies() {
        let mut pad = Scratchpad::new("q");
        let a = pad.add_task("a", &[]).unwrap();
        let b = pad.add_task("b", &[a]).unwrap();
        let c = pad.add_task("c", &[a, b]).unwrap();

        let runnable: Vec<_> = pad.runnable_tasks().iter().map(|t| t.id).collect();
        assert_eq!(runnable, vec![a]);

        pad.complete_task(a, "done").unwrap();
        let runnable: Vec<_> = pad.runnable_tasks().iter().map(|t| t.id).collect();
        assert_eq!(runnable, vec![b]);

        pad.complete_task(b, "done").unwrap();
        let runnable: Vec<_> = pad.runnable_tasks().iter().map(|t| t.id).collect();
        assert_eq!(runnable, vec![c]);
    }

    #[test]
    fn test_runnable_never_contains_unmet_dependencies() {
        let mut pad = Scratchpad::new("q");
        for i in 0..12u64 {
            let deps: Vec<TaskId> = (0..i).filter(|d| (i + d) % 3 == 0).collect();
            pad.add_task(format!("t{i}"), &deps).unwrap();
            if i % 4 == 1 {
                pad.complete_task(i, "r").unwrap();
            }
        }
        let complete: HashSet<TaskId> = pad
            .tasks()
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .map(|t| t.id)
            .collect();
        for task in pad.runnable_tasks() {
            assert_eq!(task.status, TaskStatus::Pending);
            assert!(task.depends_on.iter().all(|d| complete.contains(d)));
        }
    }

    #[test]
    fn test_advisory_dependencies_allow_out_of_order_completion() {
        let mut pad = Scratchpad::new("q");
        let a = pad.add_task("a", &[]).unwrap();
        let b = pad.add_task("b", &[a]).unwrap();
        assert!(pad.complete_task(b, "early").is_ok());
    }

    #[test]
    fn test_strict_dependencies_reject_out_of_order_completion() {
        let mut pad = Scratchpad::new("q").with_strict_dependencies(true);
        let a = pad.add_task("a", &[]).unwrap();
        let b = pad.add_task("b", &[a]).unwrap();
        assert_eq!(
            pad.complete_task(b, "early"),
            Err(ToolError::UnmetDependencies {
                task_id: b,
                missing: vec![a]
            })
        );
        assert_eq!(pad.task(b).unwrap().status, TaskStatus::Pending);

        pad.complete_task(a, "ok").unwrap();
        assert!(pad.complete_task(b, "now").is_ok());
    }

    #[test]
    fn test_snapshot_is_deterministic_json() {
        let mut pad = Scratchpad::new("Who founded Acme?");
        pad.add_task("find founder", &[]).unwrap();
        pad.set_final_answer("Dana Holt");

        let snap = pad.snapshot();
        assert_eq!(snap, pad.clone().snapshot());

        let value: serde_json::Value = serde_json::from_str(&snap).unwrap();
        assert_eq!(value["question"], "Who founded Acme?");
        assert_eq!(value["tasks"][0]["status"], "pending");
        assert_eq!(value["tasks"][0]["result"], serde_json::Value::Null);
        assert_eq!(value["final_answer"], "Dana Holt");
        assert!(snap.find("\"question\"").unwrap() < snap.find("\"tasks\"").unwrap());
    }

    #[test]
    fn test_completed_results_skip_empty() {
        let mut pad = Scratchpad::new("q");
        pad.add_task("a", &[]).unwrap();
        pad.add_task("b", &[]).unwrap();
        pad.add_task("c", &[]).unwrap();
        pad.complete_task(2, "third").unwrap();
        pad.complete_task(1, "").unwrap();
        pad.complete_task(0, "first").unwrap();
        let done: Vec<_> = pad.completed_results().collect();
        assert_eq!(done, vec![("a", "first"), ("c", "third")]);
    }
}
