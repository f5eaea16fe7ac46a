// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Registry Module
 * Scan type to scanner mapping and metadata
 * © 2026 Bountyy Oy
 */

pub mod scanner_registry;

pub use scanner_registry::{ExecutionStrategy, ScannerMetadata, ScannerRegistry, TargetKind};
