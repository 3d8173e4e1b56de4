// src/types/submission.rs
use serde::{Deserialize, Serialize};

use super::cv_data::{FinalCoverLetter, FinalCurriculum, JobDescriptionInformation};

/// Generated documents for one job, editable until saved as a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub final_cv: FinalCurriculum,
    pub final_cover_letter: FinalCoverLetter,
    pub job_information: Option<JobDescriptionInformation>,
}

impl Draft {
    pub fn company(&self) -> Option<&str> {
        self.job_information
            .as_ref()
            .and_then(|info| info.company_name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn position(&self) -> Option<&str> {
        self.job_information
            .as_ref()
            .and_then(|info| info.job_title.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_company_is_missing() {
        let draft = Draft {
            job_information: Some(JobDescriptionInformation {
                job_title: Some(" Data Engineer ".to_string()),
                company_name: Some("   ".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(draft.company(), None);
        assert_eq!(draft.position(), Some("Data Engineer"));
    }
}
