use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::pipeline::analyze_media_use_case::{InspectionOutcome, MediaInspector};
use crate::session::file_store::FileStore;
use crate::shared::constants::UPLOAD_EXTENSIONS;
use crate::shared::inspection_error::InspectionError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("unsupported file type: {0} (expected one of jpg, jpeg, png, mp4, avi, mov)")]
    UnsupportedFileType(String),
    #[error("failed to store {name}: {source}")]
    Storage {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("inspection of {name} failed: {source}")]
    Inspection {
        name: String,
        #[source]
        source: InspectionError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub file_name: String,
    pub inspected_at: String,
    pub thumbnail: Option<PathBuf>,
    pub outcome: InspectionOutcome,
}

/// One user's login state, uploads and reports.
///
/// Reports are kept in upload order. A file name is inspected at most once
/// per login; `logout` forgets everything.
pub struct InspectionSession {
    credentials: Credentials,
    logged_in: bool,
    uploaded: Vec<String>,
    reports: Vec<SessionReport>,
}

impl InspectionSession {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            logged_in: false,
            uploaded: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        if username != self.credentials.username || password != self.credentials.password {
            log::warn!("Rejected login for {username:?}");
            return Err(SessionError::InvalidCredentials);
        }
        self.logged_in = true;
        log::info!("Logged in as {username}");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Stores and inspects one uploaded file.
    ///
    /// Returns `Ok(None)` when a file with the same name was already
    /// uploaded in this session.
    pub fn upload(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        store: &FileStore,
        inspector: &dyn MediaInspector,
    ) -> Result<Option<&SessionReport>, SessionError> {
        if !self.logged_in {
            return Err(SessionError::NotLoggedIn);
        }
        if !is_upload_type(file_name) {
            return Err(SessionError::UnsupportedFileType(file_name.to_string()));
        }
        if self.uploaded.iter().any(|f| f == file_name) {
            log::info!("{file_name} already inspected; skipping");
            return Ok(None);
        }

        let storage_error = |source| SessionError::Storage {
            name: file_name.to_string(),
            source,
        };
        let path = store.save(file_name, bytes).map_err(storage_error)?;
        let thumbnail = match store.thumbnail(&path) {
            Ok(thumb) => thumb,
            Err(e) => {
                log::warn!("No thumbnail for {file_name}: {e}");
                None
            }
        };

        log::info!("Processing {file_name}...");
        let result = inspector.inspect(&path);
        if let Err(e) = store.remove(&path) {
            log::warn!("Failed to remove {}: {e}", path.display());
        }
        let outcome = result.map_err(|source| SessionError::Inspection {
            name: file_name.to_string(),
            source,
        })?;

        self.uploaded.push(file_name.to_string());
        self.reports.push(SessionReport {
            file_name: file_name.to_string(),
            inspected_at: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            thumbnail,
            outcome,
        });
        Ok(self.reports.last())
    }

    pub fn reports(&self) -> &[SessionReport] {
        &self.reports
    }

    pub fn report(&self, file_name: &str) -> Option<&SessionReport> {
        self.reports.iter().find(|r| r.file_name == file_name)
    }

    pub fn uploaded_files(&self) -> &[String] {
        &self.uploaded
    }

    pub fn logout(&mut self) {
        self.logged_in = false;
        self.uploaded.clear();
        self.reports.clear();
        log::info!("Logged out");
    }
}

fn is_upload_type(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| UPLOAD_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::domain::combined_report::CombinedReport;
    use crate::shared::inspection_error::SourceFailure;
    use std::cell::RefCell;

    /// Records inspected paths and whether the file existed at the time.
    struct StubInspector {
        seen: RefCell<Vec<(PathBuf, bool)>>,
        fail: bool,
    }

    impl StubInspector {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                fail: false,
            }
        }
    }

    impl MediaInspector for StubInspector {
        fn inspect(&self, path: &Path) -> Result<InspectionOutcome, InspectionError> {
            self.seen
                .borrow_mut()
                .push((path.to_path_buf(), path.exists()));
            if self.fail {
                return Err(InspectionError::unavailable(
                    path,
                    SourceFailure::Open("corrupt".into()),
                ));
            }
            Ok(InspectionOutcome {
                source: path.to_path_buf(),
                report: CombinedReport::new(),
                composites: 1,
                ..Default::default()
            })
        }
    }

    fn session() -> InspectionSession {
        InspectionSession::new(Credentials {
            username: "admin".into(),
            password: "admin123".into(),
        })
    }

    fn logged_in() -> InspectionSession {
        let mut s = session();
        s.login("admin", "admin123").unwrap();
        s
    }

    #[test]
    fn test_login_with_matching_credentials() {
        let mut s = session();
        assert!(!s.is_logged_in());
        s.login("admin", "admin123").unwrap();
        assert!(s.is_logged_in());
    }

    #[test]
    fn test_wrong_password_leaves_state_unchanged() {
        let mut s = session();
        assert!(matches!(
            s.login("admin", "wrong"),
            Err(SessionError::InvalidCredentials)
        ));
        assert!(!s.is_logged_in());
    }

    #[test]
    fn test_upload_requires_login() {
        let mut s = session();
        let store = FileStore::new().unwrap();
        let result = s.upload("ride.mp4", b"x", &store, &StubInspector::new());
        assert!(matches!(result, Err(SessionError::NotLoggedIn)));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let mut s = logged_in();
        let store = FileStore::new().unwrap();
        let inspector = StubInspector::new();
        let result = s.upload("notes.txt", b"x", &store, &inspector);
        assert!(matches!(result, Err(SessionError::UnsupportedFileType(_))));
        assert!(inspector.seen.borrow().is_empty());
    }

    #[test]
    fn test_upload_inspects_stored_file_then_removes_it() {
        let mut s = logged_in();
        let store = FileStore::new().unwrap();
        let inspector = StubInspector::new();

        let report = s
            .upload("ride.MOV", b"video", &store, &inspector)
            .unwrap()
            .unwrap();
        assert_eq!(report.file_name, "ride.MOV");
        assert_eq!(report.inspected_at.len(), "2024-01-01 12:00:00".len());
        assert!(report.thumbnail.is_none());

        let seen = inspector.seen.borrow();
        assert_eq!(seen.len(), 1);
        let (path, existed) = &seen[0];
        assert!(existed);
        assert!(path.starts_with(store.root()));
        assert!(!path.exists());
    }

    #[test]
    fn test_duplicate_file_name_is_ignored() {
        let mut s = logged_in();
        let store = FileStore::new().unwrap();
        let inspector = StubInspector::new();

        assert!(s.upload("ride.mp4", b"1", &store, &inspector).unwrap().is_some());
        assert!(s.upload("ride.mp4", b"2", &store, &inspector).unwrap().is_none());

        assert_eq!(inspector.seen.borrow().len(), 1);
        assert_eq!(s.reports().len(), 1);
    }

    #[test]
    fn test_reports_in_upload_order() {
        let mut s = logged_in();
        let store = FileStore::new().unwrap();
        let inspector = StubInspector::new();
        for name in ["b.mp4", "a.avi", "c.mp4"] {
            s.upload(name, b"x", &store, &inspector).unwrap();
        }

        let names: Vec<_> = s.reports().iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.mp4", "a.avi", "c.mp4"]);
        assert_eq!(s.uploaded_files(), &["b.mp4", "a.avi", "c.mp4"]);
        assert!(s.report("a.avi").is_some());
        assert!(s.report("d.mp4").is_none());
    }

    #[test]
    fn test_failed_inspection_is_not_recorded() {
        let mut s = logged_in();
        let store = FileStore::new().unwrap();
        let mut inspector = StubInspector::new();
        inspector.fail = true;

        let result = s.upload("ride.mp4", b"x", &store, &inspector);
        assert!(matches!(result, Err(SessionError::Inspection { .. })));
        assert!(s.reports().is_empty());
        assert!(s.uploaded_files().is_empty());
        assert!(!store.root().join("ride.mp4").exists());
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut s = logged_in();
        let store = FileStore::new().unwrap();
        s.upload("ride.mp4", b"x", &store, &StubInspector::new())
            .unwrap();

        s.logout();

        assert!(!s.is_logged_in());
        assert!(s.reports().is_empty());
        assert!(s.uploaded_files().is_empty());
    }
}
