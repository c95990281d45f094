// SPDX-License-Identifier: MIT

//! Agent development kit - LLM model abstraction and providers

pub mod error;
pub mod model;
