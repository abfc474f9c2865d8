//! Minefleet Core
//!
//! Core types shared by the Minefleet runner, client and CLI.
//!
//! This crate contains:
//! - Domain types: tasks, devices and fleet statistics
//! - DTOs: request/response bodies of the mining pool API
//! - Numeric helpers used to build compute-process arguments

pub mod domain;
pub mod dto;
pub mod numeric;
