// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error taxonomy shared by every driver.
//!
//! Drivers translate whatever their backend reports into one of the
//! [`Error`] variants, so the endpoint layer never has to know which
//! backend produced a failure:
//!
//! - [`Error::NotFound`]: the identity does not belong to any entity.
//! - [`Error::BadRequest`]: the caller sent something invalid regardless
//!   of the backend (unknown reset type, unknown LED state).
//! - [`Error::NotSupported`]: the request is valid but the backend cannot
//!   perform it.
//! - [`Error::Conflict`]: the request collides with existing state.
//! - [`Error::Backend`]: transport or protocol failure of the live backend,
//!   see [`BackendError`].
//! - [`Error::Storage`]: the pseudo-resource state store failed.
//!
//! Identity aliasing is not part of this taxonomy. It is reported through
//! [`crate::Resolution::Redirect`].

use http::StatusCode;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::PoisonError;

/// Kind of the entity an identity was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    System,
    Chassis,
    Manager,
    VirtualMedia,
    Certificate,
    Storage,
    Volume,
    Indicator,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::System => "system".fmt(f),
            Self::Chassis => "chassis".fmt(f),
            Self::Manager => "manager".fmt(f),
            Self::VirtualMedia => "virtual media".fmt(f),
            Self::Certificate => "certificate".fmt(f),
            Self::Storage => "storage".fmt(f),
            Self::Volume => "volume".fmt(f),
            Self::Indicator => "indicator".fmt(f),
        }
    }
}

/// Classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Backend could not be reached or the connection broke.
    Transport,
    /// Backend answered with something unexpected.
    Protocol,
    /// Backend is busy with another task on the same entity. Retrying
    /// later may succeed.
    Busy,
    /// Backend did not answer in time.
    Timeout,
}

impl Display for BackendErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Transport => "transport error".fmt(f),
            Self::Protocol => "protocol error".fmt(f),
            Self::Busy => "backend busy".fmt(f),
            Self::Timeout => "timeout".fmt(f),
        }
    }
}

/// Failure of the live backend with enough context to diagnose it
/// without reading backend logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Backend endpoint (URI of the hypervisor connection, API base URL).
    pub endpoint: String,
    /// Operation that was performed.
    pub operation: &'static str,
    /// Identity of the entity the operation was performed on, if any.
    pub identity: Option<String>,
    /// Classification of the failure.
    pub kind: BackendErrorKind,
    /// Original diagnostic text of the backend.
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        operation: &'static str,
        kind: BackendErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            operation,
            identity: None,
            kind,
            message: message.into(),
        }
    }

    /// Attach identity of the entity to the error.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// True if the backend asked to retry later.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.kind == BackendErrorKind::Busy
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} at {}: {}", self.kind, self.endpoint, self.operation)?;
        if let Some(identity) = &self.identity {
            write!(f, " ({identity})")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for BackendError {}

/// Emulator error.
#[derive(Debug)]
pub enum Error {
    NotFound {
        kind: EntityKind,
        identity: String,
    },
    BadRequest(String),
    NotSupported {
        driver: &'static str,
        operation: &'static str,
    },
    Conflict(String),
    Backend(BackendError),
    Storage(Box<dyn StdError + Send + Sync>),
}

impl Error {
    #[must_use]
    pub fn not_found(kind: EntityKind, identity: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            identity: identity.into(),
        }
    }

    #[must_use]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest(reason.into())
    }

    #[must_use]
    pub const fn not_supported(driver: &'static str, operation: &'static str) -> Self {
        Self::NotSupported { driver, operation }
    }

    pub fn storage<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Storage(Box::new(err))
    }

    pub fn mutex_lock<T>(err: PoisonError<T>) -> Self {
        Self::Storage(err.to_string().into())
    }

    /// True for [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status the endpoint layer responds with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Backend(err) if err.is_busy() => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotSupported { .. } | Self::Backend(_) | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotFound { kind, identity } => write!(f, "{kind} not found: {identity}"),
            Self::BadRequest(reason) => write!(f, "bad request: {reason}"),
            Self::NotSupported { driver, operation } => {
                write!(f, "{operation} is not supported by {driver} driver")
            }
            Self::Conflict(reason) => write!(f, "conflict: {reason}"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
            Self::Storage(err) => write!(f, "state storage error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Storage(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}
