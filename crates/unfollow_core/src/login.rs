use url::Url;

/// OAuth failure reported back through the landing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginError {
    pub code: String,
    pub description: Option<String>,
}

impl LoginError {
    pub fn title(&self) -> String {
        match self.code.as_str() {
            "callback_failed" => "OAuth callback failed".to_string(),
            "no_code" => "No authorization code received".to_string(),
            "unauthorized_client" => "Client authorization failed".to_string(),
            "invalid_client" => "Invalid client credentials".to_string(),
            "access_denied" => "User denied access".to_string(),
            other => other.to_string(),
        }
    }

    pub fn detail(&self) -> &str {
        self.description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or("Check your X Developer Portal configuration")
    }
}

/// Landing address split into the login error (if any) and the address to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub error: Option<LoginError>,
    pub address: String,
}

/// Reads `error` / `error_description` and strips the query when an error is present.
pub fn parse_login_redirect(address: &str) -> Result<LoginRedirect, url::ParseError> {
    let mut url = Url::parse(address)?;
    let mut code = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "error" if !value.is_empty() => code = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    let Some(code) = code else {
        return Ok(LoginRedirect {
            error: None,
            address: url.to_string(),
        });
    };

    url.set_query(None);
    Ok(LoginRedirect {
        error: Some(LoginError { code, description }),
        address: url.to_string(),
    })
}
