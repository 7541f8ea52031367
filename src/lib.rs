//! you-pushed - a full-screen "YOU PUSHED" banner for every git push
//!
//! Pushes are detected two ways: by watching the remote-tracking reflogs of
//! each workspace root, and by listening to a git integration's operation and
//! command events. Both feed one debounced trigger that shows the banner on a
//! single notification surface.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: The banner document, detection events, config and errors
//! - **Application**: Presenter, trigger, detectors, bridge, wrappers and port traits
//! - **Infrastructure**: Adapter implementations (reflog watcher, surfaces, relay, git CLI, config)
//! - **CLI**: Command-line interface, daemon runner, IPC and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
