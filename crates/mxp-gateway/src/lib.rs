// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
//! Narrow-contract JSON-RPC gateway (§4.11): translates JSON-RPC 2.0
//! requests, carried over plain HTTP POST, into `mxp-a2a` bridge calls and
//! serves the AgentCard discovery document. Not part of the core's tested
//! guarantees — this crate exists so the bridge has a concrete caller.
//! There is no WebSocket route; `message/stream` is out of this gateway's
//! contract surface (§4.11) and is rejected as an unknown method.

mod dispatch;
mod error;
mod rpc;
mod server;

pub use dispatch::{
    dispatch, FrameCaller, METHOD_PUSH_NOTIFICATION_CONFIG_SET, METHOD_TASKS_RESUBSCRIBE,
};
pub use error::GatewayError;
pub use rpc::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, PUSH_NOTIFICATIONS_NOT_SUPPORTED,
    TASK_NOT_CANCELABLE, TASK_NOT_FOUND, UNSUPPORTED_OPERATION,
};
pub use server::{router, GatewayState};
