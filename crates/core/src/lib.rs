//! Core types and traits for the questsync project.
//!
//! This crate is backend-agnostic: it defines the cache data model, the
//! scope classification rules, and the traits that concrete cache stores
//! and event-log clients implement. The coherence daemon in the
//! `questsync` crate drives these contracts.

pub mod cache;
pub mod events;
pub mod scopes;
