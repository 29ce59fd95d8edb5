//! Workspace-level end-to-end scenarios for the indexing pipeline.
//!
//! Every test drives real backends: an in-memory SQLite topic, a
//! tempdir blob store, and SQLite run schemas. Time is virtual
//! (`FakeClock` + paused tokio), so lease expiries and flush timeouts
//! are driven explicitly.

mod prelude;

mod competing;
mod manager_flow;
mod metadata_flow;
mod tick_flow;
