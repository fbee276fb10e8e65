//! Agency singleton schema.

use super::{check_optional_text, present, require_text};
use crate::primitives::DEFAULT_AGENCY_LANGUAGE;
use crate::{GtssError, RecordId};
use serde::{Deserialize, Serialize};

/// The agency that owns the signal inventory. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub id: RecordId,
    pub agency_id: String,
    pub agency_name: String,
    pub agency_url: Option<String>,
    pub agency_timezone: String,
    pub agency_language: String,
    pub agency_phone: Option<String>,
    pub agency_email: Option<String>,
    pub contact_name: Option<String>,
}

/// Agency save payload. Replaces every column of the singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAgency {
    pub agency_id: String,
    pub agency_name: String,
    pub agency_url: Option<String>,
    pub agency_timezone: String,
    pub agency_language: Option<String>,
    pub agency_phone: Option<String>,
    pub agency_email: Option<String>,
    pub contact_name: Option<String>,
}

impl InsertAgency {
    /// Check required columns and formats.
    pub fn validate(&self) -> Result<(), GtssError> {
        require_text("agencyId", &self.agency_id)?;
        require_text("agencyName", &self.agency_name)?;
        require_text("agencyTimezone", &self.agency_timezone)?;
        check_optional_text("agencyUrl", self.agency_url.as_deref())?;
        check_optional_text("agencyLanguage", self.agency_language.as_deref())?;
        check_optional_text("agencyPhone", self.agency_phone.as_deref())?;
        check_optional_text("agencyEmail", self.agency_email.as_deref())?;
        check_optional_text("contactName", self.contact_name.as_deref())?;

        let bad_url = self.agency_url.as_deref().is_some_and(|url| {
            !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://"))
        });
        if bad_url {
            return Err(GtssError::validation(
                "agencyUrl",
                "must start with http:// or https://",
            ));
        }

        let bad_email = self
            .agency_email
            .as_deref()
            .is_some_and(|email| !email.is_empty() && !email.contains('@'));
        if bad_email {
            return Err(GtssError::validation("agencyEmail", "must contain '@'"));
        }
        Ok(())
    }

    /// Build the stored record, filling defaults for absent columns.
    #[must_use]
    pub fn into_agency(self, id: RecordId) -> Agency {
        Agency {
            id,
            agency_id: self.agency_id,
            agency_name: self.agency_name,
            agency_url: present(self.agency_url),
            agency_timezone: self.agency_timezone,
            agency_language: self
                .agency_language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AGENCY_LANGUAGE.to_string()),
            agency_phone: present(self.agency_phone),
            agency_email: present(self.agency_email),
            contact_name: present(self.contact_name),
        }
    }
}
