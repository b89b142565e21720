use reqwest::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status_code} status code")]
pub struct ServerError {
    pub status_code: u16,
    /// Response body, kept for diagnostics.
    pub body: String,
}

pub fn check_status(status: StatusCode, body: &str) -> Result<(), ServerError> {
    if !status.is_success() {
        return Err(ServerError {
            status_code: status.as_u16(),
            body: body.to_owned(),
        });
    }
    Ok(())
}

/// Drain a response into its status and body text.
pub async fn read_body(res: reqwest::Response) -> Result<(StatusCode, String), reqwest::Error> {
    let status = res.status();
    let body = res.text().await?;
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes() {
        assert!(check_status(StatusCode::OK, "").is_ok());
        assert!(check_status(StatusCode::NO_CONTENT, "").is_ok());
    }

    #[test]
    fn failure_keeps_status_and_body() {
        let err = check_status(StatusCode::UNAUTHORIZED, "denied").unwrap_err();
        assert_eq!(
            err,
            ServerError {
                status_code: 401,
                body: "denied".into(),
            }
        );
    }
}
