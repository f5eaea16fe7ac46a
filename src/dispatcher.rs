// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Scan Dispatcher
 * Request validation, config gate check and fault-isolated execution
 * © 2026 Bountyy Oy
 */

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::config::ScanGate;
use crate::errors::{DispatchError, ScanFailure};
use crate::registry::ScannerRegistry;
use crate::types::{ScanRequest, ScanResult};

/// Routes scan requests to their scanner.
///
/// Rejections (bad request, unknown type, disabled type, unreadable gate)
/// are returned as `Err` before any scanner runs. Everything that happens
/// inside a scanner, panics included, comes back as a [`ScanResult`].
pub struct ScanDispatcher {
    registry: Arc<ScannerRegistry>,
    gate: ScanGate,
}

impl ScanDispatcher {
    pub fn new(registry: Arc<ScannerRegistry>, gate: ScanGate) -> Self {
        Self { registry, gate }
    }

    pub fn registry(&self) -> &Arc<ScannerRegistry> {
        &self.registry
    }

    pub fn gate(&self) -> &ScanGate {
        &self.gate
    }

    pub async fn dispatch_scan(
        &self,
        scan_type: &str,
        target: &str,
    ) -> Result<ScanResult, DispatchError> {
        self.dispatch(&ScanRequest::new(scan_type, target)).await
    }

    #[instrument(skip(self, request), fields(scan_type = %request.scan_type, target = %request.target))]
    pub async fn dispatch(&self, request: &ScanRequest) -> Result<ScanResult, DispatchError> {
        if request.target.trim().is_empty() {
            warn!("Rejected scan without target");
            return Err(DispatchError::InvalidRequest("Target required".to_string()));
        }
        if request.scan_type.is_empty() {
            warn!("Rejected scan without scan type");
            return Err(DispatchError::InvalidRequest("Scan type required".to_string()));
        }

        let (scan_type, scanner) = self.registry.get(&request.scan_type).ok_or_else(|| {
            warn!("Rejected unsupported scan type");
            DispatchError::UnsupportedScanType(request.scan_type.clone())
        })?;

        let enabled = self.gate.is_enabled(scan_type).await.map_err(|e| {
            error!("Config gate unreadable: {:#}", e);
            DispatchError::GateUnavailable(format!("{:#}", e))
        })?;
        if !enabled {
            warn!("Rejected disabled scan type");
            return Err(DispatchError::ScanDisabled(scan_type.to_string()));
        }

        info!("Dispatching scan");
        let target = request.target.clone();
        let task = tokio::spawn(async move { scanner.execute(&target).await });

        let result = match task.await {
            Ok(outcome) => {
                if let Err(failure) = &outcome {
                    info!("Scan finished with failure: {}", failure);
                }
                ScanResult::from(outcome)
            }
            Err(join_error) => {
                error!("Scanner task aborted: {}", join_error);
                ScanResult::failure(ScanFailure::Crashed.to_string())
            }
        };

        Ok(result)
    }
}
