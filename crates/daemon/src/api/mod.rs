// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three transports a client can reach the JSON-RPC router through
//! (spec §4.10): a newline-delimited Unix socket, and an HTTP surface
//! (`POST /rpc`, `GET /events`, `GET /health`). Both forward into the same
//! [`crate::rpc::dispatch`] — neither transport knows anything about
//! individual RPC methods.

pub mod http;
pub mod socket;
