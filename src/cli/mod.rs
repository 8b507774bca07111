//! Command workflows behind the `relsync` binary

pub mod orchestration;

pub use orchestration::{
    accept_suggested, apply_distribution_updates, apply_submodule_updates, bump_release,
    distribution_status, fetch_updates, update_all, BumpRequest, ReleaseBump, UpdateOptions,
};
