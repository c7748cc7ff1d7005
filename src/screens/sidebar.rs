use eframe::egui;

use super::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarItem {
    Dashboard,
    Team,
}

pub enum SidebarAction {
    Open(Route),
    Logout,
}

pub fn ui(ui: &mut egui::Ui, active: SidebarItem, last_team_id: Option<&str>) -> Option<SidebarAction> {
    let mut action = None;

    ui.add_space(12.0);
    ui.heading("Regdesk");
    ui.add_space(16.0);

    if ui
        .selectable_label(active == SidebarItem::Dashboard, "Dashboard")
        .clicked()
    {
        action = Some(SidebarAction::Open(Route::Dashboard));
    }

    let team_button = ui.add_enabled_ui(last_team_id.is_some(), |ui| {
        ui.selectable_label(active == SidebarItem::Team, "Team")
    });
    if team_button.inner.clicked()
        && let Some(team_id) = last_team_id
    {
        action = Some(SidebarAction::Open(Route::TeamDetail {
            team_id: team_id.to_string(),
        }));
    }

    ui.add_space(24.0);
    ui.separator();
    if ui.button("Logout").clicked() {
        action = Some(SidebarAction::Logout);
    }

    action
}
