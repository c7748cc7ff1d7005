pub mod dashboard;
pub mod login;
pub mod notification;
pub mod sidebar;
pub mod team_detail;
pub mod team_form;

use std::sync::Arc;

use crate::models::{FieldTypeMap, SelectOption};
use crate::services::api::CompetitionApi;
use crate::services::storage::DocumentStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    TeamDetail { team_id: String },
}

pub enum ScreenAction {
    Stay,
    Navigate(Route),
    Unauthorized,
}

/// Clients and static form settings shared by every screen.
pub struct AppServices {
    pub api: Arc<CompetitionApi>,
    pub storage: Arc<DocumentStorage>,
    pub field_types: FieldTypeMap,
    pub select_options: Vec<SelectOption>,
}
