// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod gate;
pub mod loader;
pub mod validation;

pub use core::{AppConfig, ObservabilityConfig, ScannerSettings, StorageSettings};

pub use gate::{
    resolve, InMemoryConfigStore, JsonFileConfigStore, ScanConfigStore, ScanGate,
    DISABLED_VALUE, ENABLED_VALUE,
};

pub use loader::{load_config_with_overrides, ConfigFormat, ConfigLoader};

pub use validation::ConfigValidator;
