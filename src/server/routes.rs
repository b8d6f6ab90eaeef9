//! HTTP handlers

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Json, Redirect},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SharedState;
use crate::error::Result;
use crate::profile::Profile;

/// Landing page listing the profiles
pub async fn index(State(state): State<SharedState>) -> Html<String> {
    let profiles = Profile::ALL
        .iter()
        .map(|p| {
            format!(
                "    <li><strong>{}</strong> - {}</li>",
                p.as_str(),
                p.description()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Html(
        include_str!("../../templates/home.html")
            .replace("{{location}}", &escape_html(&state.location))
            .replace("{{profiles}}", &profiles),
    )
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub location: String,
    pub mapbox_configured: bool,
    pub profiles: Vec<&'static str>,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        location: state.location.clone(),
        mapbox_configured: state.mapbox_api_key.is_some(),
        profiles: Profile::ALL.iter().map(Profile::as_str).collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    #[serde(default, alias = "uuid")]
    pub participant_id: Option<String>,
}

/// GET /join/:profile - resolve or allocate a set, then send the participant
/// to their viewer
pub async fn join(
    State(state): State<SharedState>,
    Path(profile): Path<String>,
    Query(query): Query<JoinQuery>,
) -> Result<Redirect> {
    let profile: Profile = profile.parse()?;
    let available = state.catalog.available(profile)?;

    let participant_id = query
        .participant_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let assignment = state.store.join(profile, participant_id, &available)?;
    debug!(
        profile = %profile,
        participant_id = %assignment.participant_id,
        created = assignment.created,
        "Join resolved"
    );

    Ok(Redirect::temporary(&viewer_url(profile, &assignment.participant_id)))
}

pub fn viewer_url(profile: Profile, participant_id: &str) -> String {
    format!(
        "/viewer/{}/{}",
        profile.as_str(),
        urlencoding::encode(participant_id)
    )
}

/// GET /viewer/:profile/:participant_id - never allocates
pub async fn viewer(
    State(state): State<SharedState>,
    Path((profile, participant_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let profile: Profile = profile.parse()?;

    let Some(set_path) = state.store.get(profile, &participant_id)? else {
        return Ok(Html(
            "<h3>Participant not registered or no set assigned.</h3>".to_string(),
        ));
    };

    let page = include_str!("../../templates/viewer.html")
        .replace("{{profile}}", profile.as_str())
        .replace(
            "{{mapbox_api_key}}",
            &script_string(state.mapbox_api_key.as_deref().unwrap_or_default()),
        )
        .replace("{{set_url}}", &script_string(&format!("/static/{}", set_path)))
        // Last, so participant text is never re-substituted
        .replace("{{participant_id}}", &escape_html(&participant_id));
    Ok(Html(page))
}

/// A JavaScript string literal safe to embed in a `<script>` element.
fn script_string(text: &str) -> String {
    serde_json::Value::from(text).to_string().replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b a="x">Tom & 'Jerry'</b>"#),
            "&lt;b a=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_script_string() {
        assert_eq!(script_string("/static/a.geojson"), r#""/static/a.geojson""#);
        assert_eq!(script_string("x</script>"), r#""x<\/script>""#);
    }

    #[test]
    fn test_viewer_url_encodes_id() {
        assert_eq!(viewer_url(Profile::Tourist, "7"), "/viewer/tourist/7");
        assert_eq!(viewer_url(Profile::Tourist, "a b/c"), "/viewer/tourist/a%20b%2Fc");
    }
}
