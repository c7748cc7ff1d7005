use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;
use rfd::FileDialog;
use tracing::{debug, info, warn};

use super::AppServices;
use super::notification::NotificationCenter;
use crate::error::ApiError;
use crate::models::{Citizenship, FieldKind, Notification, SelectOption};
use crate::services::session::AccessToken;
use crate::services::tasks::{PendingTask, TaskPoll, spawn_task};
use crate::services::team_form::{FormError, FormField, FormPhase, TeamForm};

pub enum TeamFormEvent {
    None,
    Reload,
}

pub struct TeamFormView {
    form: TeamForm,
    pending_upload: Option<(String, PendingTask<String>)>,
    pending_submit: Option<PendingTask<String>>,
}

impl TeamFormView {
    pub fn new(form: TeamForm) -> Self {
        Self {
            form,
            pending_upload: None,
            pending_submit: None,
        }
    }

    pub fn form(&self) -> &TeamForm {
        &self.form
    }

    fn poll(&mut self, notifications: &mut NotificationCenter) -> TeamFormEvent {
        if let Some((key, task)) = &self.pending_upload
            && let TaskPoll::Ready(result) = task.poll()
        {
            let key = key.clone();
            self.pending_upload = None;
            notifications.push(self.form.finish_upload(&key, result));
        }

        if let Some(task) = &self.pending_submit
            && let TaskPoll::Ready(result) = task.poll()
        {
            self.pending_submit = None;
            let outcome = self.form.finish_submit(result);
            notifications.push(outcome.notification);
            if outcome.reload {
                return TeamFormEvent::Reload;
            }
            warn!(
                "Keeping {} draft value(s) after failed save",
                self.form.draft().len()
            );
        }

        TeamFormEvent::None
    }

    fn start_upload(
        &mut self,
        key: &str,
        path: PathBuf,
        services: &AppServices,
        notifications: &mut NotificationCenter,
    ) {
        if let Err(err) = services.storage.check_document(&path) {
            warn!("Rejected {} for '{}': {}", path.display(), key, err);
            notifications.push(Notification::error(err.user_message()));
            return;
        }
        if let Err(err) = self.form.begin_upload(key) {
            warn!("Cannot upload for '{}': {}", key, err);
            return;
        }

        let storage = Arc::clone(&services.storage);
        let task = spawn_task("upload document", move || async move {
            let stored = storage.upload(&path).await?;
            Ok::<_, ApiError>(storage.preview_url(&stored.id))
        });
        self.pending_upload = Some((key.to_string(), task));
    }

    fn start_submit(
        &mut self,
        services: &AppServices,
        token: &AccessToken,
        notifications: &mut NotificationCenter,
    ) {
        let update = match self.form.begin_submit() {
            Ok(update) => update,
            Err(err @ FormError::MissingRequired(_)) => {
                notifications.push(Notification::error(err.to_string()));
                return;
            }
            Err(err) => {
                warn!("Submit ignored: {}", err);
                return;
            }
        };

        let api = Arc::clone(&services.api);
        let token = token.clone();
        let competition_id = self.form.team().competition_id.clone();
        let team_id = self.form.team().id.clone();
        info!("Saving team {} of competition {}", team_id, competition_id);
        self.pending_submit = Some(spawn_task("update team", move || async move {
            api.update_team(&competition_id, &team_id, &update, &token).await
        }));
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        services: &AppServices,
        token: &AccessToken,
        notifications: &mut NotificationCenter,
    ) -> TeamFormEvent {
        let event = self.poll(notifications);
        if self.form.is_loading() {
            ui.ctx().request_repaint();
        }

        let editing = self.form.is_editing();
        let busy = self.form.is_loading();

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_max_width(420.0);

            ui.label(egui::RichText::new("Team Name").strong());
            let mut team_name = self.form.display_team_name().to_string();
            let response = ui.add(
                egui::TextEdit::singleline(&mut team_name)
                    .interactive(editing && !busy)
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                if let Err(err) = self.form.set_team_name(&team_name) {
                    debug!("Team name edit ignored: {}", err);
                }
            }
            ui.add_space(6.0);

            ui.label(egui::RichText::new("Citizenship").strong());
            ui.add_enabled_ui(editing && !busy, |ui| {
                ui.horizontal(|ui| {
                    let mut citizenship = self.form.display_citizenship();
                    for option in Citizenship::ALL {
                        if ui
                            .radio_value(&mut citizenship, option, option.label())
                            .changed()
                        {
                            if let Err(err) = self.form.set_citizenship(citizenship) {
                                debug!("Citizenship edit ignored: {}", err);
                            }
                        }
                    }
                });
            });
            ui.add_space(6.0);

            let fields: Vec<FormField> = self.form.fields().to_vec();
            for field in &fields {
                self.field_ui(ui, field, services, notifications, editing, busy);
                ui.add_space(6.0);
            }

            ui.add_space(8.0);
            if !editing {
                if ui
                    .add_enabled(!busy, egui::Button::new("Edit Team Information"))
                    .clicked()
                {
                    self.form.begin_edit();
                }
            } else {
                ui.horizontal(|ui| {
                    if ui.add_enabled(!busy, egui::Button::new("Cancel")).clicked() {
                        self.form.cancel();
                    }
                    let save_label = if self.form.phase() == FormPhase::Submitting {
                        "Saving..."
                    } else {
                        "Save Edit"
                    };
                    if ui.add_enabled(!busy, egui::Button::new(save_label)).clicked() {
                        self.start_submit(services, token, notifications);
                    }
                });
            }
        });

        event
    }

    fn field_ui(
        &mut self,
        ui: &mut egui::Ui,
        field: &FormField,
        services: &AppServices,
        notifications: &mut NotificationCenter,
        editing: bool,
        busy: bool,
    ) {
        let label = if self.form.is_required(field) {
            format!("{} *", field.label)
        } else {
            field.label.clone()
        };
        ui.label(egui::RichText::new(label).strong());

        match field.kind {
            FieldKind::Text => {
                let mut value = self.form.display_text(&field.key).to_string();
                let response = ui.add(
                    egui::TextEdit::singleline(&mut value)
                        .interactive(editing && !busy)
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    if let Err(err) = self.form.set_text(&field.key, &value) {
                        debug!("Edit of '{}' ignored: {}", field.key, err);
                    }
                }
            }
            FieldKind::Select => {
                self.select_ui(ui, field, &services.select_options, editing && !busy);
            }
            FieldKind::File => {
                match self.form.preview_link(&field.key) {
                    Some(link) => {
                        ui.hyperlink_to("Preview Uploaded Document", link);
                    }
                    None => {
                        ui.weak("No document uploaded");
                    }
                }
                if editing {
                    let uploading = self
                        .pending_upload
                        .as_ref()
                        .is_some_and(|(key, _)| *key == field.key);
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!busy, egui::Button::new("Choose file..."))
                            .clicked()
                        {
                            let extensions = services.storage.allowed_extensions().to_vec();
                            if let Some(path) = FileDialog::new()
                                .add_filter("Document", &extensions)
                                .pick_file()
                            {
                                self.start_upload(&field.key, path, services, notifications);
                            }
                        }
                        if uploading {
                            ui.add(egui::Spinner::new());
                            ui.label("Uploading...");
                        }
                    });
                }
            }
        }
    }

    fn select_ui(&mut self, ui: &mut egui::Ui, field: &FormField, options: &[SelectOption], enabled: bool) {
        let mut selected = self.form.selected_values(&field.key);
        let mut changed = false;

        ui.add_enabled_ui(enabled, |ui| {
            ui.horizontal_wrapped(|ui| {
                for option in options {
                    let mut checked = selected.contains(&option.value);
                    if ui.checkbox(&mut checked, &option.label).changed() {
                        if checked {
                            selected.push(option.value.clone());
                        } else {
                            selected.retain(|value| *value != option.value);
                        }
                        changed = true;
                    }
                }
            });
        });

        if changed {
            if let Err(err) = self.form.set_select(&field.key, selected.as_slice()) {
                debug!("Selection for '{}' ignored: {}", field.key, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::models::{AdditionalField, FieldTypeMap, NotificationLevel, Team};

    fn view() -> TeamFormView {
        let team = Team {
            id: "1".to_string(),
            competition_id: "7".to_string(),
            team_name: "Alpha".to_string(),
            citizenship: Citizenship::Domestic,
            team_additional: Default::default(),
        };
        let fields = [AdditionalField {
            name: "Essay".to_string(),
            normalized_name: "essay".to_string(),
            field_type: "text".to_string(),
        }];
        TeamFormView::new(TeamForm::new(team, &fields, &FieldTypeMap::default()))
    }

    fn poll_until_done(view: &mut TeamFormView, notifications: &mut NotificationCenter) -> TeamFormEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let event = view.poll(notifications);
            if view.pending_submit.is_none() {
                return event;
            }
            assert!(Instant::now() < deadline, "submit timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn saved_team_requests_reload() {
        let mut view = view();
        let mut notifications = NotificationCenter::default();
        view.form.begin_edit();
        view.form.set_text("essay", "draft").unwrap();
        view.form.begin_submit().unwrap();
        view.pending_submit = Some(spawn_task("update team", || async { Ok("Team updated".to_string()) }));

        let event = poll_until_done(&mut view, &mut notifications);
        assert!(matches!(event, TeamFormEvent::Reload));
        assert_eq!(
            notifications.current(),
            Some(&Notification::success("Success!", "Team updated"))
        );
        assert!(!view.form.is_editing());
    }

    #[test]
    fn failed_save_stays_without_reload() {
        let mut view = view();
        let mut notifications = NotificationCenter::default();
        view.form.begin_edit();
        view.form.begin_submit().unwrap();
        view.pending_submit = Some(spawn_task("update team", || async {
            Err::<String, _>(ApiError::Network("connection refused".to_string()))
        }));

        let event = poll_until_done(&mut view, &mut notifications);
        assert!(matches!(event, TeamFormEvent::None));
        assert_eq!(
            notifications.current().map(|n| n.level),
            Some(NotificationLevel::Error)
        );
        assert!(!view.form.is_loading());
    }
}
