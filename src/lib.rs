//! # reclaim
//!
//! Finds disk space that can be given back.
//!
//! - **Scan engine**: runs a set of [`scanner::Probe`]s concurrently, each one
//!   reporting cleanup candidates for a category (browser caches, Xcode
//!   derived data, package manager caches and so on). A probe that fails
//!   does not sink the others.
//! - **Snapshots**: per-category totals of the last scan are kept on disk so
//!   the next scan can show what grew and what shrank.
//! - **Duplicates**: byte-identical files found in three passes (size, hash
//!   of the first 4KB, full SHA-256).
//!
//! Nothing here deletes files.

pub mod cli;
pub mod common;
pub mod duplicates;
pub mod scanner;
pub mod snapshot;
