// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Core module - polling loops, stop signal and the monitor context

mod coordinator;
mod monitor;
mod stop;

pub use coordinator::{Coordinator, PollLoop, PollState};
pub use monitor::Monitor;
pub use stop::StopSignal;
