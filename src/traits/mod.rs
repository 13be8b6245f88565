//! Trait definitions for swappable storage components.

pub mod session;
