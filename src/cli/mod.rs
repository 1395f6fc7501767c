// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Terminal output for the `printquote` binary

mod reporter;

pub use reporter::Reporter;
