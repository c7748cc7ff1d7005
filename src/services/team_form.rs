//! Edit state for a single team: server values, the local draft, and the
//! viewing / editing / submitting transitions between them.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::{
    AdditionalField, Citizenship, FieldKind, FieldTypeMap, Notification, Team, TeamUpdate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Viewing,
    Editing,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("The form is not in edit mode")]
    NotEditing,
    #[error("Another request is still running")]
    Busy,
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("Field '{0}' does not accept this kind of value")]
    WrongKind(String),
    #[error("Please fill in: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: String,
    pub key: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub notification: Notification,
    /// The owning screen should fetch the team again.
    pub reload: bool,
}

#[derive(Debug, Clone)]
pub struct TeamForm {
    team: Team,
    fields: Vec<FormField>,
    team_name: String,
    citizenship: Citizenship,
    additional: BTreeMap<String, String>,
    edit_mode: bool,
    is_loading: bool,
    submitting: bool,
}

impl TeamForm {
    pub fn new(team: Team, additional_fields: &[AdditionalField], types: &FieldTypeMap) -> Self {
        let fields: Vec<FormField> = additional_fields
            .iter()
            .map(|field| FormField {
                label: field.name.clone(),
                key: field.normalized_name.clone(),
                kind: types.resolve(&field.field_type),
            })
            .collect();

        let mut additional = BTreeMap::new();
        for (key, value) in &team.team_additional {
            if fields.iter().any(|field| field.key == *key) {
                additional.insert(key.clone(), value.clone());
            } else {
                warn!(
                    "Team {} has value for undeclared field '{}', leaving it out of the draft",
                    team.id, key
                );
            }
        }

        Self {
            team_name: team.team_name.clone(),
            citizenship: team.citizenship,
            additional,
            fields,
            team,
            edit_mode: false,
            is_loading: false,
            submitting: false,
        }
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn draft(&self) -> &BTreeMap<String, String> {
        &self.additional
    }

    pub fn is_editing(&self) -> bool {
        self.edit_mode
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn phase(&self) -> FormPhase {
        if self.submitting {
            FormPhase::Submitting
        } else if self.edit_mode {
            FormPhase::Editing
        } else {
            FormPhase::Viewing
        }
    }

    fn field(&self, key: &str) -> Result<&FormField, FormError> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))
    }

    fn ensure_editable(&self) -> Result<(), FormError> {
        if !self.edit_mode {
            return Err(FormError::NotEditing);
        }
        if self.is_loading {
            return Err(FormError::Busy);
        }
        Ok(())
    }

    pub fn begin_edit(&mut self) {
        if self.is_loading {
            return;
        }
        self.edit_mode = true;
        info!("Team {}: viewing -> editing", self.team.id);
    }

    /// Leaves edit mode. The draft is kept as-is; only the displayed values
    /// fall back to the server team.
    pub fn cancel(&mut self) {
        self.edit_mode = false;
        info!("Team {}: editing -> viewing (cancelled)", self.team.id);
    }

    pub fn set_team_name(&mut self, value: &str) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.team_name = value.to_string();
        Ok(())
    }

    pub fn set_citizenship(&mut self, value: Citizenship) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.citizenship = value;
        Ok(())
    }

    pub fn set_text(&mut self, key: &str, value: &str) -> Result<(), FormError> {
        self.ensure_editable()?;
        if self.field(key)?.kind != FieldKind::Text {
            return Err(FormError::WrongKind(key.to_string()));
        }
        self.additional.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Stores the selected option values, in selection order, joined by commas.
    pub fn set_select<S: AsRef<str>>(&mut self, key: &str, selected: &[S]) -> Result<(), FormError> {
        self.ensure_editable()?;
        if self.field(key)?.kind != FieldKind::Select {
            return Err(FormError::WrongKind(key.to_string()));
        }
        let joined = selected
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(",");
        self.additional.insert(key.to_string(), joined);
        Ok(())
    }

    pub fn display_team_name(&self) -> &str {
        if self.edit_mode {
            &self.team_name
        } else {
            &self.team.team_name
        }
    }

    pub fn display_citizenship(&self) -> Citizenship {
        if self.edit_mode {
            self.citizenship
        } else {
            self.team.citizenship
        }
    }

    /// Draft value while editing, server value otherwise.
    fn shown_value(&self, key: &str) -> Option<&str> {
        let draft = if self.edit_mode {
            self.additional.get(key)
        } else {
            None
        };
        draft
            .or_else(|| self.team.team_additional.get(key))
            .map(String::as_str)
    }

    pub fn display_text(&self, key: &str) -> &str {
        self.shown_value(key).unwrap_or_default()
    }

    pub fn preview_link(&self, key: &str) -> Option<&str> {
        self.shown_value(key).filter(|link| !link.trim().is_empty())
    }

    pub fn selected_values(&self, key: &str) -> Vec<String> {
        self.shown_value(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Select and file fields stay required until the draft holds a non-blank value.
    pub fn is_required(&self, field: &FormField) -> bool {
        match field.kind {
            FieldKind::Text => false,
            FieldKind::Select | FieldKind::File => self
                .additional
                .get(&field.key)
                .is_none_or(|value| value.trim().is_empty()),
        }
    }

    fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.team_name.trim().is_empty() {
            missing.push("Team Name".to_string());
        }
        for field in &self.fields {
            if self.is_required(field) {
                missing.push(field.label.clone());
            }
        }
        missing
    }

    pub fn begin_upload(&mut self, key: &str) -> Result<(), FormError> {
        self.ensure_editable()?;
        if self.field(key)?.kind != FieldKind::File {
            return Err(FormError::WrongKind(key.to_string()));
        }
        self.is_loading = true;
        info!("Team {}: uploading document for '{}'", self.team.id, key);
        Ok(())
    }

    /// Applies the upload result. On success `result` holds the preview URL.
    pub fn finish_upload(&mut self, key: &str, result: Result<String, ApiError>) -> Notification {
        self.is_loading = false;
        match result {
            Ok(preview_url) => {
                self.additional.insert(key.to_string(), preview_url);
                Notification::success("File Uploaded!", "File uploaded successfully!")
            }
            Err(err) => {
                warn!("Team {}: upload for '{}' failed: {}", self.team.id, key, err);
                Notification::error(err.user_message())
            }
        }
    }

    pub fn begin_submit(&mut self) -> Result<TeamUpdate, FormError> {
        self.ensure_editable()?;
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(FormError::MissingRequired(missing));
        }

        self.is_loading = true;
        self.submitting = true;
        info!("Team {}: editing -> submitting", self.team.id);
        Ok(TeamUpdate {
            team_name: self.team_name.clone(),
            citizenship: self.citizenship,
            team_additional: self.additional.clone(),
        })
    }

    /// Applies the submit result. On success `result` holds the server message.
    /// Edit mode and the loading flag end up cleared either way; the draft is kept.
    pub fn finish_submit(&mut self, result: Result<String, ApiError>) -> SubmitOutcome {
        self.edit_mode = false;
        self.is_loading = false;
        self.submitting = false;
        match result {
            Ok(message) => {
                info!("Team {}: submitted", self.team.id);
                SubmitOutcome {
                    notification: Notification::success("Success!", message),
                    reload: true,
                }
            }
            Err(err) => {
                warn!("Team {}: submit failed: {}", self.team.id, err);
                SubmitOutcome {
                    notification: Notification::error(err.user_message()),
                    reload: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationLevel;
    use serde_json::json;

    fn team(additional: &[(&str, &str)]) -> Team {
        Team {
            id: "1".to_string(),
            competition_id: "7".to_string(),
            team_name: "Alpha".to_string(),
            citizenship: Citizenship::Domestic,
            team_additional: additional
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn field(name: &str, key: &str, field_type: &str) -> AdditionalField {
        AdditionalField {
            name: name.to_string(),
            normalized_name: key.to_string(),
            field_type: field_type.to_string(),
        }
    }

    fn full_form() -> TeamForm {
        TeamForm::new(
            team(&[("essay", "server essay"), ("proposal", "https://files/old"), ("theme", "health")]),
            &[
                field("Essay", "essay", "text"),
                field("Proposal", "proposal", "file"),
                field("Sub Theme", "theme", "select"),
            ],
            &FieldTypeMap::default(),
        )
    }

    #[test]
    fn essay_scenario_submits_expected_body() {
        let mut form = TeamForm::new(
            team(&[]),
            &[field("Essay", "essay", "text")],
            &FieldTypeMap::default(),
        );
        assert_eq!(form.phase(), FormPhase::Viewing);

        form.begin_edit();
        form.set_text("essay", "my essay").unwrap();
        let update = form.begin_submit().unwrap();
        assert_eq!(form.phase(), FormPhase::Submitting);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"teamName": "Alpha", "citizenship": 1, "teamAdditional": {"essay": "my essay"}})
        );

        let outcome = form.finish_submit(Ok("ok".to_string()));
        assert_eq!(outcome.notification, Notification::success("Success!", "ok"));
        assert!(outcome.reload);
        assert!(!form.is_editing());
        assert!(!form.is_loading());
    }

    #[test]
    fn cancel_restores_displayed_server_values() {
        let mut form = full_form();
        form.begin_edit();
        form.set_team_name("Beta").unwrap();
        form.set_citizenship(Citizenship::Overseas).unwrap();
        form.set_text("essay", "edited").unwrap();
        form.set_select("theme", &["finance"]).unwrap();
        form.begin_upload("proposal").unwrap();
        form.finish_upload("proposal", Ok("https://files/new".to_string()));
        assert_eq!(form.display_team_name(), "Beta");
        assert_eq!(form.display_text("essay"), "edited");
        assert_eq!(form.selected_values("theme"), vec!["finance"]);
        assert_eq!(form.preview_link("proposal"), Some("https://files/new"));

        form.cancel();
        assert_eq!(form.phase(), FormPhase::Viewing);
        assert_eq!(form.display_team_name(), "Alpha");
        assert_eq!(form.display_citizenship(), Citizenship::Domestic);
        assert_eq!(form.display_text("essay"), "server essay");
        assert_eq!(form.selected_values("theme"), vec!["health"]);
        assert_eq!(form.preview_link("proposal"), Some("https://files/old"));
        // the draft survives the cancel and reappears in the next edit session
        assert_eq!(form.draft().get("essay").map(String::as_str), Some("edited"));
        form.begin_edit();
        assert_eq!(form.display_team_name(), "Beta");
    }

    #[test]
    fn select_joins_values_in_selection_order() {
        let mut form = full_form();
        form.begin_edit();
        form.set_select("theme", &["finance", "health", "education"]).unwrap();
        assert_eq!(
            form.draft().get("theme").map(String::as_str),
            Some("finance,health,education")
        );
        assert_eq!(form.selected_values("theme"), vec!["finance", "health", "education"]);

        form.set_select::<&str>("theme", &[]).unwrap();
        assert_eq!(form.draft().get("theme").map(String::as_str), Some(""));
    }

    #[test]
    fn cleared_selection_counts_as_missing() {
        let mut form = full_form();
        form.begin_edit();
        let theme = form.fields()[2].clone();
        assert!(!form.is_required(&theme));

        form.set_select::<&str>("theme", &[]).unwrap();
        assert!(form.is_required(&theme));
        assert_eq!(
            form.begin_submit().unwrap_err(),
            FormError::MissingRequired(vec!["Sub Theme".to_string()])
        );
        assert!(!form.is_loading());
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn successful_upload_only_touches_its_key() {
        let mut form = full_form();
        form.begin_edit();
        let before = form.draft().clone();

        form.begin_upload("proposal").unwrap();
        assert!(form.is_loading());
        assert_eq!(form.phase(), FormPhase::Editing);
        let notification = form.finish_upload("proposal", Ok("https://files/new".to_string()));

        assert_eq!(notification.title, "File Uploaded!");
        assert_eq!(notification.level, NotificationLevel::Success);
        assert!(!form.is_loading());
        assert_eq!(form.preview_link("proposal"), Some("https://files/new"));
        for (key, value) in &before {
            if key != "proposal" {
                assert_eq!(form.draft().get(key), Some(value));
            }
        }
        assert_eq!(form.draft().len(), before.len());
    }

    #[test]
    fn failed_upload_leaves_draft_and_clears_loading() {
        let mut form = full_form();
        form.begin_edit();
        let before = form.draft().clone();

        form.begin_upload("proposal").unwrap();
        let notification = form.finish_upload(
            "proposal",
            Err(ApiError::Network("POST upload failed".to_string())),
        );

        assert_eq!(notification, Notification::error("POST upload failed"));
        assert!(!form.is_loading());
        assert_eq!(form.draft(), &before);
    }

    #[test]
    fn submit_sends_full_draft_regardless_of_touched_keys() {
        let mut form = full_form();
        form.begin_edit();
        form.set_text("essay", "changed").unwrap();
        let update = form.begin_submit().unwrap();
        assert_eq!(&update.team_additional, form.draft());
        assert_eq!(update.team_additional.len(), 3);
    }

    #[test]
    fn failed_submit_keeps_draft_and_returns_to_viewing() {
        let mut form = full_form();
        form.begin_edit();
        form.set_text("essay", "changed").unwrap();
        form.begin_submit().unwrap();

        let outcome = form.finish_submit(Err(ApiError::Validation {
            status: 422,
            message: "Essay too long".to_string(),
        }));
        assert_eq!(outcome.notification, Notification::error("Essay too long"));
        assert!(!outcome.reload);
        assert_eq!(form.phase(), FormPhase::Viewing);
        assert_eq!(form.draft().get("essay").map(String::as_str), Some("changed"));
    }

    #[test]
    fn required_fields_follow_draft_values() {
        let mut form = TeamForm::new(
            team(&[]),
            &[
                field("Essay", "essay", "text"),
                field("Proposal", "proposal", "file"),
                field("Sub Theme", "theme", "select"),
            ],
            &FieldTypeMap::default(),
        );
        let required: Vec<bool> = form.fields().iter().map(|f| form.is_required(f)).collect();
        assert_eq!(required, vec![false, true, true]);

        form.begin_edit();
        assert_eq!(
            form.begin_submit().unwrap_err(),
            FormError::MissingRequired(vec!["Proposal".to_string(), "Sub Theme".to_string()])
        );
        assert!(!form.is_loading());

        form.set_select("theme", &["health"]).unwrap();
        form.begin_upload("proposal").unwrap();
        form.finish_upload("proposal", Ok("https://files/p".to_string()));
        assert!(form.begin_submit().is_ok());
    }

    #[test]
    fn edits_are_rejected_outside_edit_mode_or_while_busy() {
        let mut form = full_form();
        assert_eq!(form.set_text("essay", "x"), Err(FormError::NotEditing));

        form.begin_edit();
        assert_eq!(
            form.set_text("missing", "x"),
            Err(FormError::UnknownField("missing".to_string()))
        );
        assert_eq!(
            form.set_text("proposal", "x"),
            Err(FormError::WrongKind("proposal".to_string()))
        );

        form.begin_upload("proposal").unwrap();
        assert_eq!(form.set_team_name("x"), Err(FormError::Busy));
        assert_eq!(form.begin_submit().unwrap_err(), FormError::Busy);
    }

    #[test]
    fn undeclared_server_keys_stay_out_of_the_draft() {
        let form = TeamForm::new(
            team(&[("essay", "a"), ("legacy", "b")]),
            &[field("Essay", "essay", "text")],
            &FieldTypeMap::default(),
        );
        assert_eq!(form.draft().len(), 1);
        assert!(form.draft().contains_key("essay"));
    }
}
