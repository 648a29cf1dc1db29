use std::sync::Arc;

use crate::shared::EquipmentGateway;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn EquipmentGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn EquipmentGateway>) -> Self {
        Self { gateway }
    }
}
