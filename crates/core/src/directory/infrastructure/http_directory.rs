use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::directory::domain::attendance_entry::AttendanceEntry;
use crate::directory::domain::directory::Directory;
use crate::directory::domain::directory_error::DirectoryError;
use crate::directory::domain::identity::Identity;
use crate::shared::constants::{ATTENDANCE_LOGS_PATH, USERS_PATH};
use crate::shared::http::{build_client, endpoint_url};

/// Reads `GET /api/users` and `GET /api/attendance/logs`.
pub struct HttpDirectory {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = build_client(timeout).map_err(|source| DirectoryError::Unreachable {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DirectoryError> {
        let url = endpoint_url(&self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| DirectoryError::Unreachable {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response.text().map_err(|source| DirectoryError::Unreachable {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|source| DirectoryError::Malformed { url, source })
    }
}

impl Directory for HttpDirectory {
    fn identities(&self) -> Result<Vec<Identity>, DirectoryError> {
        let identities: Vec<Identity> = self.get_json(USERS_PATH)?;
        log::debug!("Fetched {} identities", identities.len());
        Ok(identities)
    }

    fn attendance_logs(&self) -> Result<Vec<AttendanceEntry>, DirectoryError> {
        let entries: Vec<AttendanceEntry> = self.get_json(ATTENDANCE_LOGS_PATH)?;
        log::debug!("Fetched {} attendance entries", entries.len());
        Ok(entries)
    }
}
