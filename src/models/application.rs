//! Payloads of the application (administrative) API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// USERS & ROLES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub external_id: Option<String>,
    pub uuid: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub language: String,
    pub root_admin: bool,
    #[serde(rename = "2fa", default)]
    pub two_factor: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Body for creating or replacing a user. The panel requires the identity
/// fields on update as well.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserParams {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleParams {
    pub name: String,
}

// =============================================================================
// SERVERS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: u64,
    pub external_id: Option<String>,
    pub uuid: String,
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub status: Option<String>,
    pub suspended: bool,
    pub limits: ServerLimits,
    pub feature_limits: FeatureLimits,
    pub user: u64,
    pub node: u64,
    pub allocation: u64,
    pub egg: u64,
    pub container: ServerContainer,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLimits {
    pub memory: u64,
    pub swap: i64,
    pub disk: u64,
    pub io: u64,
    pub cpu: u64,
    pub threads: Option<String>,
    #[serde(default)]
    pub oom_killer: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLimits {
    pub databases: u32,
    pub allocations: u32,
    pub backups: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerContainer {
    pub startup_command: String,
    pub image: String,
    pub installed: bool,
    #[serde(default)]
    pub environment: BTreeMap<String, Value>,
}

/// Resource limits sent when creating or rebuilding a server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsParams {
    pub memory: u64,
    pub swap: i64,
    pub disk: u64,
    pub io: u64,
    pub cpu: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationParams {
    pub default: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParams {
    pub dedicated_ip: bool,
    pub port_range: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServer {
    pub name: String,
    pub user: u64,
    pub egg: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
    pub environment: BTreeMap<String, String>,
    pub limits: LimitsParams,
    pub feature_limits: FeatureLimits,
    pub allocation: AllocationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_scripts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oom_killer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on_completion: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServerDetails {
    pub name: String,
    pub user: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServerBuild {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsParams>,
    pub feature_limits: FeatureLimits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_allocations: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_allocations: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oom_killer: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServerStartup {
    pub startup: String,
    pub environment: BTreeMap<String, String>,
    pub egg: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub skip_scripts: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferServer {
    pub node_id: u64,
    pub allocation_id: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocation_additional: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDatabase {
    pub id: u64,
    pub server: u64,
    pub host: u64,
    pub database: String,
    pub username: String,
    pub remote: String,
    pub max_connections: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServerDatabase {
    pub database: String,
    pub remote: String,
    pub host: u64,
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub uuid: String,
    pub public: bool,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fqdn: String,
    pub scheme: String,
    pub behind_proxy: bool,
    pub maintenance_mode: bool,
    pub memory: u64,
    pub memory_overallocate: i64,
    pub disk: u64,
    pub disk_overallocate: i64,
    #[serde(default)]
    pub cpu: u64,
    #[serde(default)]
    pub cpu_overallocate: i64,
    pub upload_size: u64,
    pub daemon_listen: u16,
    pub daemon_sftp: u16,
    #[serde(default)]
    pub daemon_connect: Option<u16>,
    #[serde(default)]
    pub daemon_sftp_alias: Option<String>,
    pub daemon_base: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub allocated_resources: AllocatedResources,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedResources {
    pub memory: u64,
    pub disk: u64,
}

/// Body for creating a node; `update` accepts the same shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_overallocate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_overallocate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_overallocate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_connect: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_listen: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_sftp: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_sftp_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behind_proxy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAllocation {
    pub id: u64,
    pub ip: String,
    pub ip_alias: Option<String>,
    pub port: u16,
    pub notes: Option<String>,
    pub assigned: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAllocations {
    pub ip: String,
    /// Single ports or ranges such as `"25565-25570"`.
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_alias: Option<String>,
}

// =============================================================================
// EGGS & NESTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Egg {
    pub id: u64,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub nest: Option<u64>,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub docker_image: Option<String>,
    #[serde(default)]
    pub docker_images: BTreeMap<String, String>,
    pub config: EggConfig,
    pub startup: String,
    pub script: EggScript,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EggConfig {
    #[serde(default)]
    pub files: Value,
    #[serde(default)]
    pub startup: Value,
    #[serde(default)]
    pub stop: String,
    #[serde(default)]
    pub logs: Value,
    #[serde(default)]
    pub file_denylist: Vec<String>,
    #[serde(default)]
    pub extends: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EggScript {
    pub privileged: bool,
    pub install: String,
    pub entry: String,
    pub container: String,
    #[serde(default)]
    pub extends: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EggVariable {
    pub name: String,
    pub description: String,
    pub env_variable: String,
    pub default_value: String,
    pub user_viewable: bool,
    pub user_editable: bool,
    pub rules: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nest {
    pub id: u64,
    pub uuid: String,
    pub author: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// =============================================================================
// LOCATIONS, DATABASE HOSTS & MOUNTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub short: String,
    #[serde(default)]
    pub long: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHost {
    pub id: u64,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub node_ids: Option<Vec<u64>>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHostParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_ids: Option<Vec<u64>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub id: u64,
    pub uuid: String,
    pub name: String,
    pub description: Option<String>,
    pub source: String,
    pub target: String,
    pub read_only: bool,
    pub user_mountable: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_mountable: Option<bool>,
}
