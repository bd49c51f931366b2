// ABOUTME: Tests for the unified error type, its codes, and the serialized error response
// ABOUTME: Validates status mapping, context builders, source chaining, and config error conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use archery_analysis::config::ConfigError;
use archery_analysis::errors::{AppError, ErrorCode, ErrorResponse};
use std::error::Error;
use std::io;
use uuid::Uuid;

#[test]
fn test_error_code_http_status() {
    assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
    assert_eq!(ErrorCode::MissingRequiredField.http_status(), 400);
    assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
    assert_eq!(ErrorCode::Cancelled.http_status(), 499);
    assert_eq!(ErrorCode::ExternalServiceError.http_status(), 502);
    assert_eq!(ErrorCode::InternalError.http_status(), 500);

    assert!(ErrorCode::ValueOutOfRange.is_client_error());
    assert!(!ErrorCode::Cancelled.is_client_error());
}

#[test]
fn test_app_error_creation() {
    let subject = Uuid::new_v4();
    let error = AppError::not_found("Target session 42")
        .with_request_id("req-123")
        .with_subject_id(subject)
        .with_resource_id("42");

    assert_eq!(error.code, ErrorCode::ResourceNotFound);
    assert_eq!(error.http_status(), 404);
    assert_eq!(error.context.request_id.as_deref(), Some("req-123"));
    assert_eq!(error.context.subject_id, Some(subject));
    assert_eq!(error.context.resource_id.as_deref(), Some("42"));
    assert!(error.to_string().contains("Target session 42 not found"));
}

#[test]
fn test_cancelled_error() {
    let error = AppError::cancelled("Phase segmentation");
    assert!(error.is_cancelled());
    assert_eq!(error.message, "Phase segmentation cancelled");
    assert!(!AppError::internal("boom").is_cancelled());
}

#[test]
fn test_source_is_chained() {
    let error = AppError::external_service("pose source", "stream closed")
        .with_source(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));

    assert_eq!(error.code, ErrorCode::ExternalServiceError);
    assert!(error.source().is_some());
}

#[test]
fn test_missing_field_carries_details() {
    let error = AppError::missing_field("rings");
    assert_eq!(error.code, ErrorCode::MissingRequiredField);
    assert_eq!(error.context.details["field"], "rings");
}

#[test]
fn test_error_response_serialization() {
    let error = AppError::invalid_input("Arrow coordinate is not finite").with_request_id("r-1");
    let response = ErrorResponse::from(error);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["error"]["code"], "INVALID_INPUT");
    assert_eq!(json["error"]["request_id"], "r-1");
    assert_eq!(json["error"]["message"], "Arrow coordinate is not finite");
}

#[test]
fn test_config_error_converts_to_app_error() {
    let error: AppError = ConfigError::ValueOutOfRange("tight_spread_ratio must be in (0, 1)").into();
    assert_eq!(error.code, ErrorCode::ConfigError);
    assert!(error.message.contains("tight_spread_ratio"));
}

#[test]
fn test_json_errors_become_serialization_errors() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
    let error: AppError = parse.unwrap_err().into();
    assert_eq!(error.code, ErrorCode::SerializationError);
    assert!(error.source().is_some());
}
