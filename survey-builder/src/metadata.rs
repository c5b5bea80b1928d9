//! Hidden build metadata: when fields were added and how many.
//!
//! Nothing here is shown while building a survey. It is logged on
//! completion and written alongside the document on export.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use survey_builder_types::Answers;

/// Version string embedded in completion records and exports.
pub const FORMAT_VERSION: &str = "1.0";

/// Source of wall-clock time for metadata timestamps.
pub trait Clock: std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock, at millisecond precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// One bundle addition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    /// Names of the fields this addition appended.
    pub questions_added: Vec<String>,
    pub question_count: usize,
    pub total_questions_in_survey: usize,
}

/// One appended field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_name: String,
    pub added_at: DateTime<Utc>,
    /// 1-based number of the addition that brought this field in.
    pub bundle_number: u32,
}

/// Append-only log of additions for the current build session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    pub created_at: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
    pub total_bundles_added: u32,
    pub bundle_history: Vec<BundleRecord>,
    pub question_addition_log: Vec<QuestionRecord>,
    /// Milliseconds between `start_build_time` and completion; 0 until then.
    pub survey_build_duration: i64,
    /// Milliseconds since the Unix epoch.
    pub start_build_time: i64,
}

impl BuildMetadata {
    /// Fresh metadata for a new build session.
    pub fn new(clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            created_at: now,
            last_modified: None,
            total_bundles_added: 0,
            bundle_history: Vec::new(),
            question_addition_log: Vec::new(),
            survey_build_duration: 0,
            start_build_time: now.timestamp_millis(),
        }
    }

    /// Latest timestamp recorded so far.
    pub fn latest(&self) -> DateTime<Utc> {
        self.last_modified.unwrap_or(self.created_at)
    }

    /// Current time, never earlier than anything already recorded.
    pub fn stamp(&self, clock: &dyn Clock) -> DateTime<Utc> {
        clock.now().max(self.latest())
    }

    /// Record an addition that appended `added` fields, leaving
    /// `total_in_survey` fields in the document.
    pub fn record_addition(
        &mut self,
        clock: &dyn Clock,
        bundle_id: Option<&str>,
        added: &[String],
        total_in_survey: usize,
    ) {
        let now = self.stamp(clock);
        self.total_bundles_added += 1;
        let bundle_number = self.total_bundles_added;

        self.last_modified = Some(now);
        self.bundle_history.push(BundleRecord {
            timestamp: now,
            bundle_id: bundle_id.map(str::to_string),
            questions_added: added.to_vec(),
            question_count: added.len(),
            total_questions_in_survey: total_in_survey,
        });
        self.question_addition_log
            .extend(added.iter().map(|name| QuestionRecord {
                question_name: name.clone(),
                added_at: now,
                bundle_number,
            }));
    }

    /// Close the session: metadata plus the submitted answers.
    pub fn complete(
        &self,
        clock: &dyn Clock,
        answers: &Answers,
        final_question_count: usize,
    ) -> CompletedMetadata {
        let now = self.stamp(clock);
        let mut build = self.clone();
        build.survey_build_duration = (now.timestamp_millis() - self.start_build_time).max(0);

        CompletedMetadata {
            build,
            completed_at: now,
            final_question_count,
            response_count: answers.len(),
            completion_data: CompletionData {
                user_responses: answers.clone(),
                submission_timestamp: now,
                survey_version: FORMAT_VERSION.to_string(),
                response_id: response_id(now),
            },
        }
    }
}

/// Metadata snapshot taken when a survey is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedMetadata {
    #[serde(flatten)]
    pub build: BuildMetadata,
    pub completed_at: DateTime<Utc>,
    pub final_question_count: usize,
    pub response_count: usize,
    pub completion_data: CompletionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionData {
    pub user_responses: Answers,
    pub submission_timestamp: DateTime<Utc>,
    pub survey_version: String,
    pub response_id: String,
}

/// `resp_<millis>_<9 random characters>`.
fn response_id(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("resp_{}_{}", now.timestamp_millis(), &random[..9])
}
