use eframe::egui;
use tracing::{error, info};

use crate::services::session::{AccessToken, SessionStore};

pub enum LoginAction {
    Stay,
    LoggedIn(AccessToken),
}

#[derive(Default)]
pub struct LoginScreen {
    token_input: String,
    message: Option<String>,
}

impl LoginScreen {
    pub fn expired() -> Self {
        Self {
            token_input: String::new(),
            message: Some("Your session has expired, please log in again".to_string()),
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, session: &SessionStore) -> LoginAction {
        ui.heading("Login");
        ui.add_space(8.0);
        ui.label("Paste the access token issued by the registration site.");
        ui.add_space(12.0);

        ui.add_sized(
            [600.0, 28.0],
            egui::TextEdit::singleline(&mut self.token_input)
                .password(true)
                .hint_text("accessToken"),
        );
        ui.add_space(8.0);

        let can_submit = !self.token_input.trim().is_empty();
        if ui
            .add_enabled(can_submit, egui::Button::new("Continue"))
            .clicked()
            && let Some(token) = AccessToken::new(&self.token_input)
        {
            if let Err(err) = session.save(&token) {
                error!("Failed to persist session: {err:#}");
                self.message = Some("Token accepted but could not be saved for next time".to_string());
            }
            info!("Access token accepted");
            self.token_input.clear();
            return LoginAction::LoggedIn(token);
        }

        if let Some(message) = &self.message {
            ui.add_space(8.0);
            ui.colored_label(egui::Color32::LIGHT_RED, message);
        }

        LoginAction::Stay
    }
}
