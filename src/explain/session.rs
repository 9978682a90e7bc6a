//! Session collaborator
//!
//! The explainer depends on exactly two capabilities of a database client:
//! running an arbitrary command and reporting the server build version.
//! Connection management, timeouts and retries belong to the implementor.

use std::sync::Arc;

use crate::classifier::Document;

use super::errors::SessionError;

/// An established session to a database server
pub trait Session {
    /// Run `command` against `database` and return the server reply.
    ///
    /// An empty `database` means the session's default database.
    fn run_command(&self, database: &str, command: Document) -> Result<Document, SessionError>;

    /// The server build version string, e.g. `"3.4.7"`
    fn build_version(&self) -> Result<String, SessionError>;
}

impl<S: Session + ?Sized> Session for &S {
    fn run_command(&self, database: &str, command: Document) -> Result<Document, SessionError> {
        (**self).run_command(database, command)
    }

    fn build_version(&self) -> Result<String, SessionError> {
        (**self).build_version()
    }
}

impl<S: Session + ?Sized> Session for Arc<S> {
    fn run_command(&self, database: &str, command: Document) -> Result<Document, SessionError> {
        (**self).run_command(database, command)
    }

    fn build_version(&self) -> Result<String, SessionError> {
        (**self).build_version()
    }
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn run_command(&self, database: &str, command: Document) -> Result<Document, SessionError> {
        (**self).run_command(database, command)
    }

    fn build_version(&self) -> Result<String, SessionError> {
        (**self).build_version()
    }
}
