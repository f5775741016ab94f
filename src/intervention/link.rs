//! `dopaminedetox://intervention?app=<name>&redirect=<uri>` deep links.
//!
//! Automations in other apps open this link to put the calm wall in front of
//! the app the user was about to open. Anything that is not such a link is
//! ignored rather than reported.

use serde::Serialize;
use url::Url;
use uuid::Uuid;

pub const SCHEME: &str = "dopaminedetox";
pub const HOST: &str = "intervention";
pub const APP_PARAM: &str = "app";
pub const REDIRECT_PARAM: &str = "redirect";

const FALLBACK_DISPLAY_NAME: &str = "the app";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetoxIntervention {
    pub id: Uuid,
    pub app_name: String,
    pub redirect_url: Option<Url>,
}

impl PartialEq for DetoxIntervention {
    // Two requests for the same target are the same wall, whatever their id.
    fn eq(&self, other: &Self) -> bool {
        self.app_name == other.app_name && self.redirect_url == other.redirect_url
    }
}

impl DetoxIntervention {
    pub fn new(app_name: impl Into<String>, redirect_url: Option<Url>) -> Self {
        Self {
            id: Uuid::new_v4(),
            app_name: app_name.into(),
            redirect_url,
        }
    }

    pub fn display_name(&self) -> &str {
        let trimmed = self.app_name.trim();
        if trimmed.is_empty() {
            FALLBACK_DISPLAY_NAME
        } else {
            trimmed
        }
    }
}

/// Parse an inbound link. `None` when scheme or host do not match.
pub fn resolve_intervention(uri: &str) -> Option<DetoxIntervention> {
    let url = Url::parse(uri.trim()).ok()?;
    if !url.scheme().eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    if !url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(HOST))
    {
        return None;
    }

    let mut app_name = String::new();
    let mut redirect_url = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            APP_PARAM => app_name = value.into_owned(),
            REDIRECT_PARAM => redirect_url = parse_redirect(&value),
            _ => {}
        }
    }

    Some(DetoxIntervention::new(app_name, redirect_url))
}

fn parse_redirect(value: &str) -> Option<Url> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Url::parse(trimmed).ok()
}

/// Build a link the resolver accepts. Blank fields are left out.
pub fn build_intervention_url(app_name: &str, redirect: Option<&str>) -> Option<Url> {
    let mut url = Url::parse(&format!("{SCHEME}://{HOST}")).ok()?;

    let app_name = app_name.trim();
    let redirect = redirect.map(str::trim).filter(|r| !r.is_empty());
    if app_name.is_empty() && redirect.is_none() {
        return Some(url);
    }

    {
        let mut query = url.query_pairs_mut();
        if !app_name.is_empty() {
            query.append_pair(APP_PARAM, app_name);
        }
        if let Some(redirect) = redirect {
            query.append_pair(REDIRECT_PARAM, redirect);
        }
    }
    Some(url)
}
