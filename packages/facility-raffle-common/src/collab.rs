//! Seams between the draw engine and the application around it.
//!
//! The engine itself performs no I/O. Callers read a snapshot through an
//! [`EligibilityProvider`], then hand each produced [`DrawResult`] to a
//! [`DrawRecordStore`] and a [`NotificationGateway`]. Both sinks are driven
//! one winner at a time and their failures are collected per winner.

use std::fmt::Display;

use thiserror::Error;

use crate::types::{Contact, DrawResult, Entry};

pub trait EligibilityProvider {
    type Error: Display;

    /// Approved entries with positive weight, read as one consistent snapshot.
    fn list_eligible(&self) -> Result<Vec<Entry>, Self::Error>;
}

pub trait DrawRecordStore {
    type Error: Display;

    /// Append one winner. Called once per result, in selection order.
    fn append(&mut self, result: &DrawResult) -> Result<(), Self::Error>;
}

pub trait NotificationGateway {
    type Error: Display;

    /// Deliver the winner notice. `email` has already been checked.
    fn notify(
        &mut self,
        result: &DrawResult,
        contact: &Contact,
        email: &str,
    ) -> Result<(), Self::Error>;
}

#[derive(Error, Debug, PartialEq)]
pub enum NotificationError {
    #[error("no email address on record for entry {entry_id}")]
    MissingEmail { entry_id: u64 },

    #[error("invalid email format for entry {entry_id}: {email}")]
    InvalidEmail { entry_id: u64, email: String },

    #[error("delivery to entry {entry_id} failed: {reason}")]
    Delivery { entry_id: u64, reason: String },
}

impl NotificationError {
    pub fn entry_id(&self) -> u64 {
        match self {
            NotificationError::MissingEmail { entry_id }
            | NotificationError::InvalidEmail { entry_id, .. }
            | NotificationError::Delivery { entry_id, .. } => *entry_id,
        }
    }
}

/// Loose address check: `local@domain.tld`, no whitespace, a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// The address a winner can be reached at.
pub fn contact_email(entry_id: u64, contact: &Contact) -> Result<&str, NotificationError> {
    let email = contact
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(NotificationError::MissingEmail { entry_id })?;
    if !is_valid_email(email) {
        return Err(NotificationError::InvalidEmail {
            entry_id,
            email: email.to_string(),
        });
    }
    Ok(email)
}

/// Check the contact and deliver a single notification.
pub fn notify_winner<G: NotificationGateway + ?Sized>(
    gateway: &mut G,
    result: &DrawResult,
    contact: &Contact,
) -> Result<(), NotificationError> {
    let email = contact_email(result.entry_id, contact)?;
    gateway
        .notify(result, contact, email)
        .map_err(|e| NotificationError::Delivery {
            entry_id: result.entry_id,
            reason: e.to_string(),
        })
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersistReport {
    pub persisted: Vec<u64>,
    pub failed: Vec<(u64, String)>,
}

#[derive(Debug, Default, PartialEq)]
pub struct NotificationReport {
    pub notified: Vec<u64>,
    pub failed: Vec<NotificationError>,
}

impl NotificationReport {
    pub fn attempted(&self) -> usize {
        self.notified.len() + self.failed.len()
    }

    /// e.g. "18 of 20 winners notified"
    pub fn summary(&self) -> String {
        format!("{} of {} winners notified", self.notified.len(), self.attempted())
    }
}

/// Write every result to the store. A failure is recorded against its
/// winner and does not stop the remaining writes.
pub fn persist_results<S: DrawRecordStore + ?Sized>(
    store: &mut S,
    results: &[DrawResult],
) -> PersistReport {
    let mut report = PersistReport::default();
    for result in results {
        match store.append(result) {
            Ok(()) => report.persisted.push(result.entry_id),
            Err(e) => report.failed.push((result.entry_id, e.to_string())),
        }
    }
    report
}

/// Notify each winner independently.
pub fn notify_winners<'a, G, I>(gateway: &mut G, winners: I) -> NotificationReport
where
    G: NotificationGateway + ?Sized,
    I: IntoIterator<Item = (&'a DrawResult, &'a Contact)>,
{
    let mut report = NotificationReport::default();
    for (result, contact) in winners {
        match notify_winner(gateway, result, contact) {
            Ok(()) => report.notified.push(result.entry_id),
            Err(e) => report.failed.push(e),
        }
    }
    report
}
