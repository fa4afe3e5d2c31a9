use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Restart behavior requested for a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    pub name: String,
    pub maximum_retry_count: i64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            name: String::new(),
            maximum_retry_count: 0,
        }
    }
}

/// Host-side settings of a `POST /containers/create` payload.
///
/// Defaults mirror what the Engine accepts for a plain bridged container;
/// anything the caller supplies is merged over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    pub binds: Option<Vec<String>>,
    pub cap_add: Option<Vec<String>>,
    pub cap_drop: Option<Vec<String>>,
    #[serde(rename = "ContainerIDFile")]
    pub container_id_file: String,
    pub devices: Vec<Value>,
    pub dns: Option<Vec<String>>,
    pub dns_search: Option<Vec<String>>,
    pub extra_hosts: Option<Vec<String>>,
    pub ipc_mode: String,
    pub links: Option<Vec<String>>,
    pub lxc_conf: Vec<Value>,
    pub network_mode: String,
    pub pid_mode: String,
    pub port_bindings: Map<String, Value>,
    pub privileged: bool,
    pub publish_all_ports: bool,
    pub readonly_rootfs: bool,
    pub restart_policy: RestartPolicy,
    pub security_opt: Option<Vec<String>>,
    pub volumes_from: Option<Vec<String>>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            binds: None,
            cap_add: None,
            cap_drop: None,
            container_id_file: String::new(),
            devices: Vec::new(),
            dns: None,
            dns_search: None,
            extra_hosts: None,
            ipc_mode: String::new(),
            links: None,
            lxc_conf: Vec::new(),
            network_mode: "bridge".to_owned(),
            pid_mode: String::new(),
            port_bindings: Map::new(),
            privileged: false,
            publish_all_ports: false,
            readonly_rootfs: false,
            restart_policy: RestartPolicy::default(),
            security_opt: None,
            volumes_from: None,
        }
    }
}

/// Full `POST /containers/create` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    pub hostname: String,
    pub domainname: String,
    pub user: String,
    pub memory: i64,
    pub memory_swap: i64,
    pub cpu_shares: i64,
    pub cpuset: String,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub tty: bool,
    pub open_stdin: bool,
    pub stdin_once: bool,
    pub env: Option<Vec<String>>,
    pub cmd: Vec<String>,
    pub entrypoint: String,
    pub image: String,
    pub volumes: Map<String, Value>,
    pub working_dir: String,
    pub network_disabled: bool,
    pub exposed_ports: Map<String, Value>,
    pub security_opts: Vec<String>,
    pub host_config: HostConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            domainname: String::new(),
            user: String::new(),
            memory: 0,
            memory_swap: 0,
            cpu_shares: 0,
            cpuset: String::new(),
            attach_stdin: false,
            attach_stdout: false,
            attach_stderr: false,
            tty: false,
            open_stdin: false,
            stdin_once: false,
            env: None,
            cmd: Vec::new(),
            entrypoint: String::new(),
            image: String::new(),
            volumes: Map::new(),
            working_dir: String::new(),
            network_disabled: false,
            exposed_ports: Map::new(),
            security_opts: Vec::new(),
            host_config: HostConfig::default(),
        }
    }
}

/// What the Engine answers to `POST /containers/create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateContainerResponse {
    pub id: String,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_uses_engine_wire_names() {
        let payload = serde_json::to_value(ContainerConfig::default()).unwrap();

        assert_eq!(payload["HostConfig"]["NetworkMode"], "bridge");
        assert_eq!(payload["HostConfig"]["ContainerIDFile"], "");
        assert_eq!(payload["HostConfig"]["RestartPolicy"]["MaximumRetryCount"], 0);
        assert_eq!(payload["MemorySwap"], 0);
        assert_eq!(payload["ExposedPorts"], serde_json::json!({}));
    }

    #[test]
    fn create_response_tolerates_null_warnings() {
        let response: CreateContainerResponse =
            serde_json::from_str(r#"{"Id":"c0ffee","Warnings":null}"#).unwrap();

        assert_eq!(response.id, "c0ffee");
        assert!(response.warnings.is_none());
    }
}
