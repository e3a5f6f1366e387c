use crate::frameworks::config::Config;
use crate::interface_adapters::broadcast::Broadcaster;
use crate::use_cases::{ClientRegistry, OptionsStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub options: Arc<OptionsStore>,
    pub registry: Arc<ClientRegistry>,
    pub broadcaster: Arc<Broadcaster>,
}
