// SPDX-License-Identifier: MIT

//! Agents built on the workflow engine

pub mod country;
