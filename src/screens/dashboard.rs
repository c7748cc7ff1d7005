use std::sync::Arc;

use eframe::egui;
use tracing::{info, warn};

use super::{AppServices, Route, ScreenAction};
use crate::error::ApiError;
use crate::models::TeamSummary;
use crate::services::session::AccessToken;
use crate::services::tasks::{PendingTask, TaskPoll, spawn_task};

pub struct DashboardScreen {
    pending: Option<PendingTask<Vec<TeamSummary>>>,
    teams: Option<Vec<TeamSummary>>,
    error: Option<String>,
}

impl DashboardScreen {
    pub fn new(services: &AppServices, token: &AccessToken) -> Self {
        let mut screen = Self {
            pending: None,
            teams: None,
            error: None,
        };
        screen.refresh(services, token);
        screen
    }

    fn refresh(&mut self, services: &AppServices, token: &AccessToken) {
        let api = Arc::clone(&services.api);
        let token = token.clone();
        self.error = None;
        self.pending = Some(spawn_task("list teams", move || async move {
            api.list_user_teams(&token).await
        }));
    }

    fn poll(&mut self) -> Result<(), ApiError> {
        let Some(task) = &self.pending else {
            return Ok(());
        };
        match task.poll() {
            TaskPoll::Pending => {}
            TaskPoll::Ready(Ok(teams)) => {
                info!("Dashboard loaded {} team(s)", teams.len());
                self.teams = Some(teams);
                self.pending = None;
            }
            TaskPoll::Ready(Err(err)) => {
                self.pending = None;
                if err.is_unauthorized() {
                    return Err(err);
                }
                warn!("Failed to load teams: {}", err);
                self.error = Some(err.user_message());
            }
        }
        Ok(())
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, services: &AppServices, token: &AccessToken) -> ScreenAction {
        if self.poll().is_err() {
            return ScreenAction::Unauthorized;
        }

        ui.heading("My Teams");
        ui.add_space(12.0);

        if self.pending.is_some() {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new());
                ui.label("Loading teams...");
            });
            ui.ctx().request_repaint();
            return ScreenAction::Stay;
        }

        if let Some(message) = &self.error {
            ui.colored_label(egui::Color32::LIGHT_RED, message);
            ui.add_space(8.0);
            if ui.button("Retry").clicked() {
                self.refresh(services, token);
            }
            return ScreenAction::Stay;
        }

        let mut action = ScreenAction::Stay;
        match &self.teams {
            Some(teams) if teams.is_empty() => {
                ui.label("You are not registered in any team yet.");
            }
            Some(teams) => {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for team in teams {
                        egui::Frame::group(ui.style()).show(ui, |ui| {
                            ui.set_min_width(480.0);
                            ui.label(egui::RichText::new(&team.team_name).strong());
                            match &team.competition_name {
                                Some(competition) => ui.label(competition),
                                None => ui.label(format!("Competition #{}", team.competition_id)),
                            };
                            if let Some(created_at) = team.created_at {
                                ui.weak(format!("Registered {}", created_at.format("%Y-%m-%d")));
                            }
                            if ui.button("Open").clicked() {
                                action = ScreenAction::Navigate(Route::TeamDetail {
                                    team_id: team.id.clone(),
                                });
                            }
                        });
                        ui.add_space(6.0);
                    }
                });
            }
            None => {
                ui.label("loading...");
            }
        }

        action
    }
}
