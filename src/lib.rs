//! Wiring layer that turns the per-concern crates (`ingestion`,
//! `agent_stages`, `workflow_engine`, `audit_chain`, ...) into the two
//! running services (§1 Ingest Service, Agents Service): auth, RBAC,
//! cache/rate-limiting, startup configuration, the workflow engine, the
//! LLM/embedding HTTP clients, user/API-key persistence, and the HTTP
//! API surface itself.

pub mod auth;
pub mod cache;
pub mod config;
pub mod llm_client;
pub mod rbac;
pub mod telemetry;
pub mod users;
pub mod workflow;

pub mod http;
