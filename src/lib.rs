//! ipdistance - great-circle distance between two IP addresses
//!
//! `GET /get-ip-info?ip1=..&ip2=..` resolves both identifiers through a GeoIP
//! provider, computes the Haversine distance and optionally keeps the result in
//! a durable response cache so repeated pairs skip the provider entirely.
//!
//! # Architecture
//! - `services`: distance engine, GeoIP resolver, request orchestration
//! - `cache`: response cache trait, key derivation and backends (DynamoDB, memory, Redis)
//! - `api`: HTTP handler and middleware
//! - `config`: CLI arguments, TOML/env configuration and validation
//! - `runtime`: startup, server mode and shutdown
//! - `system`: logging

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod runtime;
pub mod services;
pub mod system;
