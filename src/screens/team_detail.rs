use std::sync::Arc;

use eframe::egui;
use tracing::{error, info};

use super::notification::NotificationCenter;
use super::team_form::{TeamFormEvent, TeamFormView};
use super::{AppServices, ScreenAction};
use crate::error::Result;
use crate::models::{FieldTypeMap, Team, TeamDetail};
use crate::services::session::AccessToken;
use crate::services::tasks::{PendingTask, TaskPoll, spawn_task};
use crate::services::team_form::TeamForm;

pub struct TeamDetailScreen {
    team_id: String,
    pending: Option<PendingTask<TeamDetail>>,
    view: Option<TeamFormView>,
}

impl TeamDetailScreen {
    pub fn new(team_id: &str, services: &AppServices, token: &AccessToken) -> Self {
        let mut screen = Self {
            team_id: team_id.to_string(),
            pending: None,
            view: None,
        };
        screen.fetch(services, token);
        screen
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    fn fetch(&mut self, services: &AppServices, token: &AccessToken) {
        let api = Arc::clone(&services.api);
        let token = token.clone();
        let team_id = self.team_id.clone();
        self.pending = Some(spawn_task("fetch team", move || async move {
            api.fetch_team_detail(&team_id, &token).await
        }));
    }

    /// Returns false when the session is no longer valid.
    fn poll(&mut self, field_types: &FieldTypeMap) -> bool {
        let Some(task) = &self.pending else {
            return true;
        };
        match task.poll() {
            TaskPoll::Pending => true,
            TaskPoll::Ready(result) => {
                self.pending = None;
                self.apply_fetch(result, field_types)
            }
        }
    }

    fn apply_fetch(&mut self, result: Result<TeamDetail>, field_types: &FieldTypeMap) -> bool {
        match result {
            Ok(detail) => {
                let form = TeamForm::new(detail.team, &detail.additional_fields, field_types);
                self.view = Some(TeamFormView::new(form));
                info!("Team {} ready", self.team_id);
                true
            }
            Err(err) if err.is_unauthorized() => false,
            Err(err) => {
                // no retry and no user-facing message, the screen stays on its placeholder
                error!("Failed to fetch team {}: {}", self.team_id, err);
                true
            }
        }
    }

    fn on_form_event(&mut self, event: TeamFormEvent, services: &AppServices, token: &AccessToken) {
        if let TeamFormEvent::Reload = event {
            info!("Reloading team {} after save", self.team_id);
            self.fetch(services, token);
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        services: &AppServices,
        token: &AccessToken,
        notifications: &mut NotificationCenter,
    ) -> ScreenAction {
        if !self.poll(&services.field_types) {
            return ScreenAction::Unauthorized;
        }
        if self.pending.is_some() {
            ui.ctx().request_repaint();
        }

        let Some(view) = self.view.as_mut() else {
            ui.label("loading...");
            return ScreenAction::Stay;
        };

        ui.heading("Team");
        ui.add_space(12.0);
        team_card(ui, view.form().team());
        ui.add_space(12.0);

        let event = view.ui(ui, services, token, notifications);
        self.on_form_event(event, services, token);

        ScreenAction::Stay
    }
}

fn team_card(ui: &mut egui::Ui, team: &Team) {
    egui::Frame::group(ui.style())
        .fill(egui::Color32::from_rgb(41, 104, 117))
        .show(ui, |ui| {
            ui.set_max_width(420.0);
            ui.label(egui::RichText::new(&team.team_name).strong().size(26.0));
            ui.label(format!("Citizenship: {}", team.citizenship.label()));
            ui.label(format!("Competition #{}", team.competition_id));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::error::ApiError;
    use crate::models::{AdditionalField, Citizenship};
    use crate::services::api::CompetitionApi;
    use crate::services::config_loader::StorageConfig;
    use crate::services::http::{HttpResponse, MockHttpClient};
    use crate::services::storage::DocumentStorage;

    fn screen() -> TeamDetailScreen {
        TeamDetailScreen {
            team_id: "1".to_string(),
            pending: None,
            view: None,
        }
    }

    fn detail() -> TeamDetail {
        TeamDetail {
            team: Team {
                id: "1".to_string(),
                competition_id: "7".to_string(),
                team_name: "Alpha".to_string(),
                citizenship: Citizenship::Domestic,
                team_additional: Default::default(),
            },
            additional_fields: vec![AdditionalField {
                name: "Essay".to_string(),
                normalized_name: "essay".to_string(),
                field_type: "text".to_string(),
            }],
        }
    }

    fn services(api_http: MockHttpClient) -> AppServices {
        AppServices {
            api: Arc::new(CompetitionApi::new("http://api", Arc::new(api_http))),
            storage: Arc::new(DocumentStorage::new(
                &StorageConfig::default(),
                &["pdf".to_string()],
                Arc::new(MockHttpClient::new()),
            )),
            field_types: FieldTypeMap::default(),
            select_options: Vec::new(),
        }
    }

    #[test]
    fn fetched_team_builds_the_form() {
        let mut screen = screen();
        assert!(screen.apply_fetch(Ok(detail()), &FieldTypeMap::default()));
        let view = screen.view.as_ref().unwrap();
        assert_eq!(view.form().team().team_name, "Alpha");
        assert_eq!(view.form().fields().len(), 1);
    }

    #[test]
    fn unauthorized_fetch_ends_the_session() {
        let mut screen = screen();
        assert!(!screen.apply_fetch(Err(ApiError::Unauthorized), &FieldTypeMap::default()));
        assert!(screen.view.is_none());
    }

    #[test]
    fn other_fetch_errors_keep_the_placeholder() {
        let mut screen = screen();
        let err = ApiError::Unknown {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(screen.apply_fetch(Err(err), &FieldTypeMap::default()));
        assert!(screen.view.is_none());
        assert!(screen.pending.is_none());
    }

    #[test]
    fn reload_event_fetches_the_team_again() {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url, bearer| url == "http://api/api/teams/1" && bearer == "tok")
            .times(1)
            .returning(|_, _| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: r#"{"team":{"id":1,"competitionId":7,"teamName":"Alpha v2","citizenship":2,"teamAdditional":{}},"additionalField":[]}"#
                            .to_string(),
                    })
                })
            });
        let services = services(http);
        let token = AccessToken::new("tok").unwrap();
        let mut screen = screen();

        screen.on_form_event(TeamFormEvent::None, &services, &token);
        assert!(screen.pending.is_none());

        screen.on_form_event(TeamFormEvent::Reload, &services, &token);
        assert!(screen.pending.is_some());

        let deadline = Instant::now() + Duration::from_secs(5);
        while screen.pending.is_some() {
            assert!(screen.poll(&services.field_types));
            assert!(Instant::now() < deadline, "team fetch timed out");
            thread::sleep(Duration::from_millis(5));
        }
        let team = screen.view.as_ref().unwrap().form().team();
        assert_eq!(team.team_name, "Alpha v2");
        assert_eq!(team.citizenship, Citizenship::Overseas);
    }
}
