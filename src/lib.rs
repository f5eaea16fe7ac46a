// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - ReconHub Library
 * Scan registry, config gate, dispatcher and scanner backends
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod errors;
pub mod http_client;
pub mod types;

// Scanner backends and their registry
pub mod registry;
pub mod scanners;

// Dispatch and record keeping
pub mod dispatcher;
pub mod persistence;

pub use config::{AppConfig, ScanGate};
pub use dispatcher::ScanDispatcher;
pub use errors::{DispatchError, RegistryError, ScanFailure};
pub use persistence::{ScanRecord, ScanService, ScanSink};
pub use registry::ScannerRegistry;
pub use types::{ScanRequest, ScanResult, ScanType};
