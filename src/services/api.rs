//! Typed calls against the competition REST API

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{ApiError, Result, body_message};
use crate::models::{TeamDetail, TeamSummary, TeamUpdate};
use crate::services::http::{HttpClient, HttpResponse};
use crate::services::session::AccessToken;

/// Payloads may come bare or wrapped in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

pub struct CompetitionApi {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl CompetitionApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn team_url(&self, team_id: &str) -> String {
        format!("{}/api/teams/{}", self.base_url, team_id)
    }

    pub fn user_teams_url(&self) -> String {
        format!("{}/api/user/teams", self.base_url)
    }

    pub fn team_update_url(&self, competition_id: &str, team_id: &str) -> String {
        format!(
            "{}/api/competition/{}/teams/{}",
            self.base_url, competition_id, team_id
        )
    }

    pub async fn fetch_team_detail(&self, team_id: &str, token: &AccessToken) -> Result<TeamDetail> {
        let response = self.http.get(&self.team_url(team_id), token.as_str()).await?;
        let detail: TeamDetail = decode_success(response)?;
        info!(
            "Fetched team {} with {} additional field(s)",
            detail.team.id,
            detail.additional_fields.len()
        );
        Ok(detail)
    }

    pub async fn list_user_teams(&self, token: &AccessToken) -> Result<Vec<TeamSummary>> {
        let response = self.http.get(&self.user_teams_url(), token.as_str()).await?;
        let teams: Vec<TeamSummary> = decode_success(response)?;
        info!("Fetched {} team(s) for current user", teams.len());
        Ok(teams)
    }

    /// Sends the partial update and returns the server's confirmation message.
    pub async fn update_team(
        &self,
        competition_id: &str,
        team_id: &str,
        update: &TeamUpdate,
        token: &AccessToken,
    ) -> Result<String> {
        let body = serde_json::to_value(update).map_err(ApiError::decode)?;
        let url = self.team_update_url(competition_id, team_id);
        let response = self.http.put_json(&url, token.as_str(), &body).await?;
        let response = check_status(response)?;
        Ok(body_message(&response.body).unwrap_or_else(|| "Team updated".to_string()))
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let err = ApiError::from_status(response.status, &response.body);
    warn!("API call failed: {}", err);
    Err(err)
}

fn decode_success<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let response = check_status(response)?;
    serde_json::from_str::<Envelope<T>>(&response.body)
        .map(Envelope::into_inner)
        .map_err(ApiError::decode)
}
