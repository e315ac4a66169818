// src/config.rs

use std::{env, net::SocketAddr};

use dotenvy::dotenv;
use thiserror::Error;

use crate::{
    comments::DEFAULT_MAX_COMMENT_DEPTH,
    store::{KeyColumn, SchemaShape},
};

/// How the layout of the comments table is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Inspect the live table at startup.
    Auto,
    /// Trust the operator.
    Fixed(SchemaShape),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means comments live in process memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub http_addr: SocketAddr,
    pub max_comment_depth: usize,
    pub comment_schema: SchemaMode,
    pub run_migrations: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = read_optional("DATABASE_URL");

        let jwt_secret = read_optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let http_addr_raw = read_or("HTTP_ADDR", "0.0.0.0:3000");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HTTP_ADDR", http_addr_raw.clone()))?;

        let max_comment_depth = parse_max_depth(&read_or(
            "MAX_COMMENT_DEPTH",
            &DEFAULT_MAX_COMMENT_DEPTH.to_string(),
        ))?;

        let comment_schema = parse_schema_mode(
            &read_or("COMMENT_SCHEMA", "auto"),
            &read_or("COMMENT_KEY_COLUMN", "id"),
        )?;

        let run_migrations = parse_bool("RUN_MIGRATIONS", &read_or("RUN_MIGRATIONS", "true"))?;

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            http_addr,
            max_comment_depth,
            comment_schema,
            run_migrations,
        })
    }
}

fn read_or(key: &'static str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_optional(key: &'static str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_max_depth(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(depth) if depth >= 1 => Ok(depth),
        _ => Err(ConfigError::InvalidValue("MAX_COMMENT_DEPTH", raw.to_string())),
    }
}

fn parse_schema_mode(mode: &str, key: &str) -> Result<SchemaMode, ConfigError> {
    let parent_link = match mode.trim().to_ascii_lowercase().as_str() {
        "auto" => return Ok(SchemaMode::Auto),
        "threaded" => true,
        "flat" => false,
        _ => return Err(ConfigError::InvalidValue("COMMENT_SCHEMA", mode.to_string())),
    };
    let key = key
        .parse::<KeyColumn>()
        .map_err(|_| ConfigError::InvalidValue("COMMENT_KEY_COLUMN", key.to_string()))?;
    Ok(SchemaMode::Fixed(SchemaShape { key, parent_link }))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(name, raw.to_string())),
    }
}
