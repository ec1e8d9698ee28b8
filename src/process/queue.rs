/*!
 * Ready Queue
 * Ordered collection of every task ever created. Terminated tasks stay in
 * place so `ps` can still report them.
 */

use super::task::{Task, TaskState, TaskView};
use crate::core::types::TaskId;
use crate::scheduler::types::SchedulingPolicy;
use std::collections::VecDeque;

/// Insertion discipline of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOrder {
    /// Append at the tail (FCFS, RR)
    Fifo,
    /// Before the first task with a strictly larger priority value (PP)
    Priority,
}

impl From<SchedulingPolicy> for QueueOrder {
    fn from(policy: SchedulingPolicy) -> Self {
        match policy {
            SchedulingPolicy::Fcfs | SchedulingPolicy::RoundRobin => QueueOrder::Fifo,
            SchedulingPolicy::Priority => QueueOrder::Priority,
        }
    }
}

#[derive(Debug)]
pub struct ReadyQueue {
    order: QueueOrder,
    tasks: VecDeque<Task>,
}

impl ReadyQueue {
    pub fn new(order: QueueOrder) -> Self {
        Self {
            order,
            tasks: VecDeque::new(),
        }
    }

    /// Insert a task according to the queue order.
    ///
    /// Equal priorities keep arrival order.
    pub fn enqueue(&mut self, task: Task) {
        match self.order {
            QueueOrder::Fifo => self.tasks.push_back(task),
            QueueOrder::Priority => {
                let at = self
                    .tasks
                    .iter()
                    .position(|t| t.priority > task.priority)
                    .unwrap_or(self.tasks.len());
                self.tasks.insert(at, task);
            }
        }
    }

    /// Mark the first task named `name` TERMINATED without removing it.
    ///
    /// Returns the id of the task hit, or `None` if no task has that name.
    pub fn mark_terminated(&mut self, name: &str) -> Option<TaskId> {
        let index = self.tasks.iter().position(|t| t.name == name)?;

        let task = &mut self.tasks[index];
        task.state = TaskState::Terminated;
        task.blocked_on = None;
        Some(task.id)
    }

    /// Views of every task in queue order
    pub fn snapshot(&self) -> Vec<TaskView> {
        self.tasks.iter().map(Task::view).collect()
    }

    /// First READY task strictly after `id`, wrapping around to the head.
    ///
    /// The scan ends at `id` itself, which is returned if it is READY and
    /// nothing else is.
    pub fn next_ready_after(&self, id: TaskId) -> Option<TaskId> {
        let len = self.tasks.len();
        let start = self.position(id)?;
        (1..=len)
            .map(|offset| &self.tasks[(start + offset) % len])
            .find(|t| t.state == TaskState::Ready)
            .map(|t| t.id)
    }

    /// First task in queue order that can take the CPU
    pub fn first_runnable(&self) -> Option<TaskId> {
        self.tasks
            .iter()
            .find(|t| matches!(t.state, TaskState::Ready | TaskState::Running))
            .map(|t| t.id)
    }

    pub fn all_terminated(&self) -> bool {
        self.tasks.iter().all(Task::is_terminated)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Priority;
    use crate::process::workload::WorkloadRegistry;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn task(id: TaskId, name: &str, priority: Priority) -> Task {
        Task::create(id, name, "test_exit", priority, &WorkloadRegistry::builtin()).unwrap()
    }

    fn names(queue: &ReadyQueue) -> Vec<String> {
        queue.snapshot().into_iter().map(|v| v.name).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ReadyQueue::new(QueueOrder::Fifo);
        queue.enqueue(task(1, "T1", 9));
        queue.enqueue(task(2, "T2", 1));
        queue.enqueue(task(3, "T3", 5));
        assert_eq!(names(&queue), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_priority_order() {
        let mut queue = ReadyQueue::new(QueueOrder::Priority);
        queue.enqueue(task(1, "A", 5));
        queue.enqueue(task(2, "B", 1));
        queue.enqueue(task(3, "C", 5));
        queue.enqueue(task(4, "D", 3));
        assert_eq!(names(&queue), vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_mark_terminated() {
        let mut queue = ReadyQueue::new(QueueOrder::Fifo);
        queue.enqueue(task(1, "T1", 0));
        queue.enqueue(task(2, "T2", 0));

        assert_eq!(queue.mark_terminated("T2"), Some(2));
        assert_eq!(queue.get(2).unwrap().state(), TaskState::Terminated);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.mark_terminated("T9"), None);
    }

    #[test]
    fn test_mark_terminated_hits_first_duplicate() {
        let mut queue = ReadyQueue::new(QueueOrder::Fifo);
        queue.enqueue(task(1, "T", 0));
        queue.enqueue(task(2, "T", 0));

        assert_eq!(queue.mark_terminated("T"), Some(1));
        // The first match wins even once it is already terminated
        assert_eq!(queue.mark_terminated("T"), Some(1));
        assert_eq!(queue.get(2).unwrap().state(), TaskState::Ready);
    }

    #[test]
    fn test_next_ready_after_wraps() {
        let mut queue = ReadyQueue::new(QueueOrder::Fifo);
        for id in 1..=4 {
            queue.enqueue(task(id, &format!("T{}", id), 0));
        }
        queue.get_mut(2).unwrap().state = TaskState::Running;
        queue.get_mut(3).unwrap().state = TaskState::Waiting;
        queue.get_mut(4).unwrap().state = TaskState::Terminated;

        assert_eq!(queue.next_ready_after(2), Some(1));
        assert_eq!(queue.next_ready_after(4), Some(1));
    }

    #[test]
    fn test_next_ready_after_may_return_self() {
        let mut queue = ReadyQueue::new(QueueOrder::Fifo);
        queue.enqueue(task(1, "T1", 0));
        queue.enqueue(task(2, "T2", 0));
        queue.get_mut(2).unwrap().state = TaskState::Waiting;

        assert_eq!(queue.next_ready_after(1), Some(1));

        queue.get_mut(1).unwrap().state = TaskState::Terminated;
        assert_eq!(queue.next_ready_after(1), None);
        assert_eq!(queue.next_ready_after(99), None);
    }

    #[test]
    fn test_first_runnable_and_termination() {
        let mut queue = ReadyQueue::new(QueueOrder::Fifo);
        assert!(queue.all_terminated());
        queue.enqueue(task(1, "T1", 0));
        queue.enqueue(task(2, "T2", 0));
        queue.get_mut(1).unwrap().state = TaskState::Waiting;

        assert_eq!(queue.first_runnable(), Some(2));
        queue.mark_terminated("T2");
        assert_eq!(queue.first_runnable(), None);
        assert!(!queue.all_terminated());
        queue.mark_terminated("T1");
        assert!(queue.all_terminated());
    }

    proptest! {
        #[test]
        fn prop_priority_queue_sorted_and_stable(priorities in proptest::collection::vec(0u32..6, 1..40)) {
            let mut queue = ReadyQueue::new(QueueOrder::Priority);
            for (i, priority) in priorities.iter().enumerate() {
                queue.enqueue(task(i as TaskId + 1, &format!("T{}", i), *priority));
            }

            let views = queue.snapshot();
            prop_assert_eq!(views.len(), priorities.len());
            for pair in views.windows(2) {
                prop_assert!(pair[0].priority <= pair[1].priority);
                if pair[0].priority == pair[1].priority {
                    prop_assert!(pair[0].id < pair[1].id);
                }
            }
        }
    }
}
