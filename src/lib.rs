//! lostuser - reports replicated resources that lost their active user
//!
//! A resource that may be promoted on some node after a debounce delay has
//! nobody using it. The monitor watches may-promote signals from the
//! cluster backend and emits the names of such resources, but only for
//! resources with DRBD quorum enabled.

pub mod backend;
pub mod cli;
pub mod model;
pub mod monitor;
pub mod observability;
