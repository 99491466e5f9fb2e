//! Submissions of the breed filter form.

use derive_more::Display;
use url::form_urlencoded;

use crate::models::query::{INTENT_FIELD, encode_for_submission};

/// Path of the search page, target of every submission redirect.
pub const SEARCH_PATH: &str = "/search";

/// What the user asked for when submitting the filter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Intent {
    /// Apply the checked breeds.
    #[display("submit")]
    Submit,
    /// Clear all filters.
    #[display("delete")]
    Delete,
}

impl Intent {
    /// Unknown values are treated as [Intent::Submit].
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("delete") => Intent::Delete,
            _ => Intent::Submit,
        }
    }
}

/// The submitted fields of the filter form.
///
/// Every checked breed is submitted as a field named by its field token,
/// e.g. `Cairn_Terrier=on`, next to the [INTENT_FIELD].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new(fields: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` form body.
    pub fn parse(body: &str) -> Self {
        Self::new(
            form_urlencoded::parse(body.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned())),
        )
    }

    /// The intent of the first [INTENT_FIELD], if any.
    pub fn intent(&self) -> Intent {
        Intent::from_value(
            self.fields
                .iter()
                .find(|(name, _)| name == INTENT_FIELD)
                .map(|(_, value)| value.as_str()),
        )
    }

    /// Where to send the user after this submission.
    ///
    /// Deleting skips the submitted breeds entirely.
    pub fn redirect(&self) -> String {
        if self.intent() == Intent::Delete {
            return SEARCH_PATH.to_string();
        }

        let query = encode_for_submission(self.fields.iter().map(|(name, _)| name.as_str()));
        if query.is_empty() {
            SEARCH_PATH.to_string()
        } else {
            format!("{SEARCH_PATH}?{query}")
        }
    }
}
