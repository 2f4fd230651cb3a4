//! Nomad job descriptor for the ping workload
//!
//! Serializes to the JSON shape of Nomad's `/v1/jobs` API (PascalCase keys).

use serde::Serialize;

/// Job and task group identifier
pub const PING_JOB_ID: &str = "ping";
/// Nomad workload type for run-to-completion jobs
pub const JOB_TYPE_BATCH: &str = "batch";
pub const GROUP_COUNT: u32 = 1;
pub const TASK_DRIVER: &str = "docker";
pub const PING_IMAGE: &str = "ping:0.0.1";
/// CPU request in MHz
pub const RESOURCE_CPU: u32 = 10;
pub const RESOURCE_MEMORY_MB: u32 = 10;
pub const RESTART_ATTEMPTS: u32 = 3;

/// Declarative batch workload submitted to Nomad
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub job_type: String,
    pub task_groups: Vec<TaskGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskGroup {
    pub name: String,
    pub count: u32,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    pub name: String,
    pub driver: String,
    pub config: DockerConfig,
    pub resources: Resources,
    pub restart_policy: RestartPolicy,
}

/// Docker driver config block (Nomad keeps these keys lowercase)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockerConfig {
    pub image: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resources {
    #[serde(rename = "CPU")]
    pub cpu: u32,
    #[serde(rename = "MemoryMB")]
    pub memory_mb: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    pub attempts: u32,
}

impl Job {
    /// Build the one-shot ping job targeting `target_addr`
    ///
    /// The docker driver cannot join the pong container's network, so the
    /// target is handed to the container as its only argument.
    pub fn ping(target_addr: &str) -> Self {
        Job {
            id: PING_JOB_ID.to_string(),
            name: PING_JOB_ID.to_string(),
            job_type: JOB_TYPE_BATCH.to_string(),
            task_groups: vec![TaskGroup {
                name: PING_JOB_ID.to_string(),
                count: GROUP_COUNT,
                tasks: vec![Task {
                    name: PING_JOB_ID.to_string(),
                    driver: TASK_DRIVER.to_string(),
                    config: DockerConfig {
                        image: PING_IMAGE.to_string(),
                        args: vec![target_addr.to_string()],
                    },
                    resources: Resources {
                        cpu: RESOURCE_CPU,
                        memory_mb: RESOURCE_MEMORY_MB,
                    },
                    restart_policy: RestartPolicy {
                        attempts: RESTART_ATTEMPTS,
                    },
                }],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_job_passes_target_as_only_arg() {
        for addr in ["172.17.0.1:8080", "pong", "", "[::1]:80"] {
            let job = Job::ping(addr);
            let task = &job.task_groups[0].tasks[0];
            assert_eq!(task.config.args, vec![addr.to_string()]);
        }
    }

    #[test]
    fn test_ping_job_uses_fixed_constants() {
        let job = Job::ping("10.0.0.5:80");

        assert_eq!(job.id, "ping");
        assert_eq!(job.job_type, "batch");
        assert_eq!(job.task_groups.len(), 1);

        let group = &job.task_groups[0];
        assert_eq!(group.count, 1);
        assert_eq!(group.tasks.len(), 1);

        let task = &group.tasks[0];
        assert_eq!(task.driver, "docker");
        assert_eq!(task.config.image, "ping:0.0.1");
        assert_eq!(task.resources.cpu, 10);
        assert_eq!(task.resources.memory_mb, 10);
        assert_eq!(task.restart_policy.attempts, 3);
    }

    #[test]
    fn test_ping_job_serializes_with_nomad_keys() {
        let value = serde_json::to_value(Job::ping("10.0.0.5:80")).expect("serialize");

        assert_eq!(value["ID"], "ping");
        assert_eq!(value["Type"], "batch");
        let task = &value["TaskGroups"][0]["Tasks"][0];
        assert_eq!(value["TaskGroups"][0]["Count"], 1);
        assert_eq!(task["Driver"], "docker");
        assert_eq!(task["Config"]["image"], "ping:0.0.1");
        assert_eq!(task["Config"]["args"][0], "10.0.0.5:80");
        assert_eq!(task["Resources"]["CPU"], 10);
        assert_eq!(task["Resources"]["MemoryMB"], 10);
        assert_eq!(task["RestartPolicy"]["Attempts"], 3);
    }
}
