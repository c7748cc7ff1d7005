mod error;
mod models;
mod screens;
mod services;

use std::fs;
use std::sync::Arc;

use anyhow::Context;
use eframe::egui;
use screens::dashboard::DashboardScreen;
use screens::login::{LoginAction, LoginScreen};
use screens::notification::NotificationCenter;
use screens::sidebar::{self, SidebarAction, SidebarItem};
use screens::team_detail::TeamDetailScreen;
use screens::{AppServices, Route, ScreenAction};
use services::api::CompetitionApi;
use services::config_loader::{self, RegdeskConfig};
use services::http::{HttpClient, ReqwestHttpClient};
use services::session::{AccessToken, SessionStore};
use services::storage::DocumentStorage;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

struct RegdeskApp {
    route: Route,
    services: AppServices,
    session: SessionStore,
    token: Option<AccessToken>,
    last_team_id: Option<String>,
    login: LoginScreen,
    dashboard: Option<DashboardScreen>,
    team_detail: Option<TeamDetailScreen>,
    notifications: NotificationCenter,
}

impl RegdeskApp {
    fn new(services: AppServices, session: SessionStore) -> Self {
        let token = match session.load() {
            Ok(token) => token,
            Err(err) => {
                warn!("Ignoring unreadable session: {err:#}");
                None
            }
        };

        let mut app = Self {
            route: Route::Login,
            services,
            session,
            token: None,
            last_team_id: None,
            login: LoginScreen::default(),
            dashboard: None,
            team_detail: None,
            notifications: NotificationCenter::default(),
        };
        if let Some(token) = token {
            app.token = Some(token);
            app.navigate(Route::Dashboard);
        }
        app
    }

    fn navigate(&mut self, route: Route) {
        let Some(token) = self.token.clone() else {
            self.route = Route::Login;
            return;
        };

        info!("Transition: {:?} -> {:?}", self.route, route);
        match &route {
            Route::Login => {}
            Route::Dashboard => {
                self.dashboard = Some(DashboardScreen::new(&self.services, &token));
            }
            Route::TeamDetail { team_id } => {
                let reuse = self
                    .team_detail
                    .as_ref()
                    .is_some_and(|screen| screen.team_id() == team_id);
                if !reuse {
                    self.team_detail = Some(TeamDetailScreen::new(team_id, &self.services, &token));
                }
                self.last_team_id = Some(team_id.clone());
            }
        }
        self.route = route;
    }

    fn unauthorized(&mut self) {
        warn!("Session rejected by the API, redirecting to login");
        if let Err(err) = self.session.clear() {
            error!("Failed to clear rejected session: {err:#}");
        }
        self.token = None;
        self.dashboard = None;
        self.team_detail = None;
        self.login = LoginScreen::expired();
        self.route = Route::Login;
    }

    fn logout(&mut self) {
        if let Err(err) = self.session.clear() {
            error!("Failed to clear session: {err:#}");
        }
        self.token = None;
        self.last_team_id = None;
        self.dashboard = None;
        self.team_detail = None;
        self.login = LoginScreen::default();
        info!("Transition: {:?} -> Login (logout)", self.route);
        self.route = Route::Login;
    }

    /// A rejected session wins over any click made in the same frame.
    fn apply_actions(&mut self, action: ScreenAction, sidebar_action: Option<SidebarAction>) {
        match (action, sidebar_action) {
            (ScreenAction::Unauthorized, _) => self.unauthorized(),
            (_, Some(SidebarAction::Open(route))) => self.navigate(route),
            (_, Some(SidebarAction::Logout)) => self.logout(),
            (ScreenAction::Navigate(route), None) => self.navigate(route),
            (ScreenAction::Stay, None) => {}
        }
    }

    fn screen_ui(&mut self, ui: &mut egui::Ui) -> ScreenAction {
        let Some(token) = self.token.clone() else {
            return ScreenAction::Navigate(Route::Login);
        };

        match &self.route {
            Route::Login => ScreenAction::Stay,
            Route::Dashboard => match self.dashboard.as_mut() {
                Some(screen) => screen.ui(ui, &self.services, &token),
                None => ScreenAction::Navigate(Route::Dashboard),
            },
            Route::TeamDetail { team_id } => match self.team_detail.as_mut() {
                Some(screen) => screen.ui(ui, &self.services, &token, &mut self.notifications),
                None => ScreenAction::Navigate(Route::TeamDetail {
                    team_id: team_id.clone(),
                }),
            },
        }
    }
}

impl eframe::App for RegdeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.route == Route::Login {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if let LoginAction::LoggedIn(token) = self.login.ui(ui, &self.session) {
                        self.token = Some(token);
                        self.navigate(Route::Dashboard);
                    }
                });
            });
            self.notifications.show(ctx);
            return;
        }

        let active = match self.route {
            Route::TeamDetail { .. } => SidebarItem::Team,
            _ => SidebarItem::Dashboard,
        };
        let sidebar_action = egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(200.0)
            .show(ctx, |ui| sidebar::ui(ui, active, self.last_team_id.as_deref()))
            .inner;

        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                ui.add_space(8.0);
                self.screen_ui(ui)
            })
            .inner;

        self.apply_actions(action, sidebar_action);

        self.notifications.show(ctx);
    }
}

fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    let _ = fs::create_dir_all("logs");
    let file_appender = tracing_appender::rolling::daily("logs", "regdesk.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = init_result {
        eprintln!("tracing init failed: {err}");
        return None;
    }

    Some(file_guard)
}

fn load_config() -> RegdeskConfig {
    let path = config_loader::default_config_path();
    let mut config = match config_loader::load_regdesk_config(&path) {
        Ok(config) => config,
        Err(err) => {
            warn!("Falling back to default configuration: {err:#}");
            RegdeskConfig::default()
        }
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());
    info!("API base URL: {}", config.api.base_url);
    config
}

fn build_services(config: &RegdeskConfig) -> anyhow::Result<AppServices> {
    let http: Arc<dyn HttpClient> = Arc::new(
        ReqwestHttpClient::new(config.api.timeout()).context("Failed to create HTTP client")?,
    );
    Ok(AppServices {
        api: Arc::new(CompetitionApi::new(&config.api.base_url, Arc::clone(&http))),
        storage: Arc::new(DocumentStorage::new(
            &config.storage,
            &config.form.document_extensions,
            Arc::clone(&http),
        )),
        field_types: config.form.field_type_map(),
        select_options: config.form.select_options.clone(),
    })
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();
    info!("Starting Regdesk");

    let config = load_config();
    let services = build_services(&config)?;
    let session = SessionStore::from_env(config.session_path());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Regdesk",
        options,
        Box::new(move |cc| {
            let mut style = (*cc.egui_ctx.style()).clone();
            style
                .text_styles
                .insert(egui::TextStyle::Heading, egui::FontId::proportional(28.0));
            style
                .text_styles
                .insert(egui::TextStyle::Body, egui::FontId::proportional(18.0));
            style
                .text_styles
                .insert(egui::TextStyle::Button, egui::FontId::proportional(18.0));
            style.spacing.button_padding = egui::vec2(12.0, 7.0);
            cc.egui_ctx.set_style(style);

            Ok(Box::new(RegdeskApp::new(services, session)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("eframe failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldTypeMap;
    use crate::services::config_loader::StorageConfig;
    use crate::services::http::{HttpResponse, MockHttpClient};

    fn services() -> AppServices {
        let mut http = MockHttpClient::new();
        http.expect_get().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: "[]".to_string(),
                })
            })
        });
        AppServices {
            api: Arc::new(CompetitionApi::new("http://api", Arc::new(http))),
            storage: Arc::new(DocumentStorage::new(
                &StorageConfig::default(),
                &["pdf".to_string()],
                Arc::new(MockHttpClient::new()),
            )),
            field_types: FieldTypeMap::default(),
            select_options: Vec::new(),
        }
    }

    fn signed_in_app(dir: &tempfile::TempDir) -> RegdeskApp {
        let session = SessionStore::new(dir.path().join("session"));
        session.save(&AccessToken::new("stale").unwrap()).unwrap();
        let app = RegdeskApp::new(services(), session);
        assert_eq!(app.route, Route::Dashboard);
        app
    }

    #[test]
    fn rejected_session_is_removed_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = signed_in_app(&dir);

        app.apply_actions(ScreenAction::Unauthorized, None);
        assert_eq!(app.route, Route::Login);
        assert!(app.token.is_none());
        assert_eq!(app.session.load().unwrap(), None);
    }

    #[test]
    fn unauthorized_wins_over_sidebar_click() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = signed_in_app(&dir);

        app.apply_actions(
            ScreenAction::Unauthorized,
            Some(SidebarAction::Open(Route::TeamDetail {
                team_id: "1".to_string(),
            })),
        );
        assert_eq!(app.route, Route::Login);
        assert!(app.team_detail.is_none());
    }

    #[test]
    fn sidebar_click_beats_screen_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = signed_in_app(&dir);

        app.apply_actions(
            ScreenAction::Navigate(Route::TeamDetail {
                team_id: "1".to_string(),
            }),
            Some(SidebarAction::Open(Route::Dashboard)),
        );
        assert_eq!(app.route, Route::Dashboard);
    }
}
