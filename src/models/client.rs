//! Payloads of the client (self-service) API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::net::types::{Envelope, ListEnvelope};

// =============================================================================
// ACCOUNT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub admin: bool,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub language: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoFactorSetup {
    pub image_url_data: String,
    pub secret: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTokens {
    pub tokens: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub identifier: String,
    pub description: String,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

/// A freshly created key. The secret is only ever returned once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyWithSecret {
    #[serde(flatten)]
    pub key: ApiKey,
    pub secret_token: String,
}

/// Creation response: `{ object, attributes, meta: { secret_token } }`.
#[derive(Deserialize)]
pub(crate) struct CreatedApiKey {
    pub attributes: ApiKey,
    pub meta: CreatedApiKeyMeta,
}

#[derive(Deserialize)]
pub(crate) struct CreatedApiKeyMeta {
    pub secret_token: String,
}

impl From<CreatedApiKey> for ApiKeyWithSecret {
    fn from(created: CreatedApiKey) -> Self {
        Self {
            key: created.attributes,
            secret_token: created.meta.secret_token,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    pub name: String,
    pub fingerprint: String,
    pub public_key: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub batch: Option<String>,
    pub event: String,
    pub is_api: bool,
    pub ip: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    pub has_additional_metadata: bool,
    pub timestamp: String,
}

// =============================================================================
// SERVERS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub server_owner: bool,
    pub identifier: String,
    pub internal_id: u64,
    pub uuid: String,
    pub name: String,
    pub node: String,
    #[serde(default)]
    pub is_node_under_maintenance: bool,
    pub sftp_details: SftpDetails,
    pub description: String,
    pub limits: ServerLimits,
    pub invocation: String,
    pub docker_image: String,
    #[serde(default)]
    pub egg_features: Vec<String>,
    pub feature_limits: FeatureLimits,
    pub status: Option<String>,
    pub is_suspended: bool,
    pub is_installing: bool,
    pub is_transferring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<ServerRelationships>,
}

impl Server {
    /// Allocations, when the request asked to include them.
    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.relationships
            .as_ref()
            .and_then(|relations| relations.allocations.as_ref())
            .into_iter()
            .flat_map(|list| list.data.iter().map(|item| &item.attributes))
    }

    /// Startup variables, when the request asked to include them.
    pub fn variables(&self) -> impl Iterator<Item = &StartupVariable> {
        self.relationships
            .as_ref()
            .and_then(|relations| relations.variables.as_ref())
            .into_iter()
            .flat_map(|list| list.data.iter().map(|item| &item.attributes))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerRelationships {
    #[serde(default)]
    pub allocations: Option<ListEnvelope<Allocation>>,
    #[serde(default)]
    pub variables: Option<ListEnvelope<StartupVariable>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SftpDetails {
    pub ip: String,
    pub port: u16,
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
    pub oom_killer: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLimits {
    pub databases: u32,
    pub allocations: u32,
    pub backups: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerResources {
    pub current_state: String,
    pub is_suspended: bool,
    pub resources: ResourceUsage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub memory_bytes: u64,
    pub memory_limit_bytes: u64,
    pub cpu_absolute: f64,
    pub disk_bytes: u64,
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
    pub uptime: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupVariable {
    pub name: String,
    pub description: String,
    pub env_variable: String,
    pub default_value: String,
    pub server_value: Option<String>,
    pub is_editable: bool,
    pub rules: String,
}

/// Short-lived daemon token plus the socket URL it is valid for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSocketCredentials {
    pub token: String,
    pub socket: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: u64,
    pub ip: String,
    pub ip_alias: Option<String>,
    pub port: u16,
    pub notes: Option<String>,
    pub is_default: bool,
}

// =============================================================================
// FILES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    pub name: String,
    pub mode: String,
    pub mode_bits: String,
    pub size: u64,
    pub is_file: bool,
    pub is_symlink: bool,
    pub mimetype: String,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionExtension {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tgz")]
    Tgz,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "txz")]
    Txz,
    #[serde(rename = "tar.xz")]
    TarXz,
    #[serde(rename = "tbz2")]
    Tbz2,
    #[serde(rename = "tar.bz2")]
    TarBz2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameFile {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMode {
    pub file: String,
    pub mode: String,
}

// =============================================================================
// DATABASES & BACKUPS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    pub host: DatabaseHost,
    pub name: String,
    pub username: String,
    pub connections_from: String,
    pub max_connections: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<DatabaseRelationships>,
}

impl Database {
    /// Password, present when the request included it or after a rotation.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        let relations = self.relationships.as_ref()?;
        relations
            .password
            .as_ref()
            .map(|password| password.attributes.password.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHost {
    pub address: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRelationships {
    #[serde(default)]
    pub password: Option<Envelope<DatabasePassword>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePassword {
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatabase {
    pub database: String,
    pub remote: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub ignored_files: Vec<String>,
    pub sha256_hash: Option<String>,
    pub bytes: u64,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub is_successful: Option<bool>,
    pub is_locked: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBackup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Newline-separated ignore patterns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
}

// =============================================================================
// SCHEDULES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: u64,
    pub name: String,
    pub cron: CronExpression,
    pub is_active: bool,
    pub is_processing: bool,
    #[serde(default)]
    pub only_when_online: bool,
    pub last_run_at: Option<String>,
    pub next_run_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<ScheduleRelationships>,
}

impl Schedule {
    pub fn tasks(&self) -> impl Iterator<Item = &ScheduleTask> {
        self.relationships
            .as_ref()
            .and_then(|relations| relations.tasks.as_ref())
            .into_iter()
            .flat_map(|list| list.data.iter().map(|item| &item.attributes))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRelationships {
    #[serde(default)]
    pub tasks: Option<ListEnvelope<ScheduleTask>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronExpression {
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub id: u64,
    pub sequence_id: u32,
    pub action: ScheduleTaskAction,
    pub payload: String,
    pub time_offset: u32,
    #[serde(default)]
    pub continue_on_failure: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleTaskAction {
    Command,
    Power,
    Backup,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSchedule {
    pub name: String,
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_when_online: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_when_online: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScheduleTask {
    pub action: ScheduleTaskAction,
    pub payload: String,
    pub time_offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_failure: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateScheduleTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ScheduleTaskAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_failure: Option<bool>,
}

// =============================================================================
// SUBUSERS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subuser {
    pub uuid: String,
    pub username: String,
    pub email: String,
    pub image: String,
    #[serde(rename = "2fa_enabled")]
    pub two_factor_enabled: bool,
    pub created_at: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubuser {
    pub email: String,
    pub permissions: Vec<String>,
}
