// SPDX-License-Identifier: MIT

pub mod agents;
pub mod config;
pub mod workflow;
