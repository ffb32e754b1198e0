//! In-memory filesystem and canned host layouts for collector tests.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
