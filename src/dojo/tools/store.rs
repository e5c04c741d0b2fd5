//! In-memory roster and its workbook persistence.
//!
//! Every mutation follows the same cycle: read the full state, validate and
//! append in memory, then rewrite the whole workbook. There is no locking;
//! two processes writing the same workbook race and the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::dojo::tools::error::{Result, ToolError};
use crate::dojo::tools::io::{excel_read, excel_write};
use crate::dojo::tools::model::{
    NewPayment, NewStudent, Payment, PaymentStatus, Student, StudentSelector,
};
use crate::dojo::tools::status::StatusEngine;

/// The two record sets held by the workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub students: Vec<Student>,
    /// Append-only payment log in registration order.
    pub payments: Vec<Payment>,
}

impl Roster {
    /// Loads the roster from `path`. A workbook that does not exist yet is an
    /// empty roster.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("workbook not found, starting with an empty roster");
            return Ok(Self::default());
        }
        let (students, payments) = excel_read::read_roster(path)?;
        Ok(Self { students, payments })
    }

    /// Recomputes every student's status against `reference`.
    pub fn refresh_statuses(&mut self, engine: &StatusEngine, reference: NaiveDate) {
        engine.annotate(&mut self.students, &self.payments, reference);
    }

    /// Selectors are trimmed the same way registration trims the stored
    /// identity key and name.
    pub fn find_student(&self, selector: &StudentSelector) -> Option<&Student> {
        match selector {
            StudentSelector::Id(id) => {
                let id = id.trim();
                self.students.iter().find(|s| s.id == id)
            }
            StudentSelector::Name(name) => {
                let name = name.trim();
                self.students.iter().find(|s| s.name == name)
            }
        }
    }

    /// Validates and appends a student. The new student is `New` until the
    /// next status refresh.
    pub fn register_student(&mut self, new: NewStudent) -> Result<&Student> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ToolError::Validation("student name is required".into()));
        }
        ensure_not_negative("monthly tuition", new.monthly_tuition)?;
        let id = new.id.trim();
        if self.students.iter().any(|s| s.id == id) {
            return Err(ToolError::Validation(format!(
                "a student with id '{id}' is already registered"
            )));
        }

        self.students.push(Student {
            id: id.to_string(),
            name: name.to_string(),
            phone: new.phone.trim().to_string(),
            enrolled_on: new.enrolled_on,
            monthly_tuition: new.monthly_tuition,
            status: PaymentStatus::New,
        });
        let index = self.students.len() - 1;
        Ok(&self.students[index])
    }

    /// Validates and appends a payment for the selected student.
    pub fn register_payment(&mut self, new: NewPayment) -> Result<&Payment> {
        ensure_not_negative("payment amount", new.amount)?;
        let student_id = match self.find_student(&new.student) {
            Some(student) => student.id.clone(),
            None => return Err(ToolError::UnknownStudent(new.student.to_string())),
        };

        self.payments.push(Payment::new(student_id, new.paid_on, new.amount));
        let index = self.payments.len() - 1;
        Ok(&self.payments[index])
    }

    /// Rewrites the whole workbook from memory.
    ///
    /// The data is first written to a sibling file which then replaces the
    /// target, so a failed write leaves the previous workbook intact.
    #[instrument(
        level = "info",
        skip_all,
        fields(path = %path.display(), students = self.students.len(), payments = self.payments.len())
    )]
    pub fn flush(&self, path: &Path) -> Result<()> {
        let staging = staging_path(path);
        if let Err(error) = excel_write::write_roster(&staging, &self.students, &self.payments) {
            discard(&staging);
            return Err(error);
        }
        if let Err(error) = fs::rename(&staging, path) {
            discard(&staging);
            return Err(error.into());
        }
        debug!("workbook replaced");
        Ok(())
    }
}

fn ensure_not_negative(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ToolError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roster.xlsx".to_string());
    path.with_file_name(format!(".{file_name}.partial"))
}

fn discard(staging: &Path) {
    if staging.exists() {
        if let Err(error) = fs::remove_file(staging) {
            warn!(path = %staging.display(), %error, "could not remove staging workbook");
        }
    }
}

/// Whether a [`RecordStore`] re-reads the workbook for every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Read the workbook on every snapshot.
    #[default]
    Fresh,
    /// Keep the first load for the life of the store. Successful flushes
    /// through the store replace the cached copy.
    Cached,
}

/// Access point to one workbook.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    policy: CachePolicy,
    cached: Option<Roster>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, policy: CachePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current roster, honouring the cache policy.
    pub fn snapshot(&mut self) -> Result<Roster> {
        if self.policy == CachePolicy::Fresh {
            return Roster::load(&self.path);
        }
        if let Some(roster) = &self.cached {
            debug!(path = %self.path.display(), "serving cached roster");
            return Ok(roster.clone());
        }
        let roster = Roster::load(&self.path)?;
        self.cached = Some(roster.clone());
        Ok(roster)
    }

    /// Drops any cached roster so the next snapshot reads the workbook.
    pub fn reload(&mut self) {
        self.cached = None;
    }

    /// Persists `roster` and, when caching, adopts it as the cached copy.
    /// On failure the cache is left untouched.
    pub fn commit(&mut self, roster: Roster) -> Result<()> {
        roster.flush(&self.path)?;
        if self.policy == CachePolicy::Cached {
            self.cached = Some(roster);
        }
        Ok(())
    }
}
