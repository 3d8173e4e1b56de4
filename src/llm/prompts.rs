//! System prompts and user message builders for each model call

pub const DATA_EXTRACTION: &str = "You are an expert data analyst. Your task is to carefully extract structured information from the following markdown CV document. You must:

- Extract all relevant details exactly as written, without paraphrasing, rephrasing, or omitting.
- Do not infer or invent any data; include only what is explicitly stated in the document.
- Preserve all factual accuracy and textual content from the original markdown without interpretation or enhancement.
";

pub const CURRICULUM_CREATION: &str = "You are an expert curriculum writer. Your task is to analyze the provided job description and tailor the user's CV accordingly using their real portfolio and experiences.

Your objective is to select and reframe the most relevant projects and experiences to best match the job requirements. You may reword the descriptions to better align with the language and priorities of the job offer, but **you must never invent or assume any skills, tools, projects, or responsibilities** that are not present in the original CV.

Your output should:

- Highlight the parts of the user's experience that are most aligned with the job offer.
- Emphasize tools, technologies, methodologies, or responsibilities explicitly mentioned in the job description **and** actually present in the user's real experience.
- Differentiate between work experience and projects if the original CV has this differentiation.
- If multiple projects are relevant, prioritize those that most directly match the job's requirements.
- If there are no projects that perfectly align, still include **at least 3 projects** that demonstrate the user's capabilities, choosing those that come closest in terms of domain, tools, or responsibilities.
- Keep all content grounded in the actual CV and portfolio; do not add anything that is not verifiably present in the source material.
- Write the output in **first person**, as if written by the candidate.

Clarity, relevance, and factual integrity are essential.
";

pub const COVER_LETTER_CREATION: &str = "You are an expert career writer. Write a cover letter for the job description below, using only facts found in the user's portfolio.

Your output should:

- Open with a salutation addressed to the hiring team, or to the named recipient if the job description mentions one.
- Contain three or four body paragraphs: motivation for the role, the most relevant experiences and projects, the fit with the company, and a short conclusion.
- Mention tools, technologies and responsibilities only when they appear both in the job description and in the portfolio.
- Never invent experiences, skills, employers, or achievements.
- Be written in the first person, in a professional and concise tone.
- End with a closing sentence, without the candidate's name.
";

pub const JOB_INFORMATION_EXTRACTION: &str = "You are an expert recruiter. Read the job description and extract the exact job title and the name of the hiring company as they are written. If one of them is not stated, leave it empty.
";

/// Portfolio markdown or JSON wrapped in the markers the prompts refer to
pub fn portfolio_message(portfolio: &str) -> String {
    format!(
        "This is my portfolio:\n\n[START PORTFOLIO]\n{}\n[END PORTFOLIO]",
        portfolio.trim()
    )
}

pub fn job_description_block(job_description: &str) -> String {
    format!(
        "[JOB DESCRIPTION]\n{}\n[END JOB DESCRIPTION]",
        job_description.trim()
    )
}

pub fn portfolio_with_job_message(portfolio: &str, job_description: &str) -> String {
    format!(
        "{}\n\n{}",
        portfolio_message(portfolio),
        job_description_block(job_description)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_use_markers() {
        let message = portfolio_with_job_message(" my cv \n", "\nwe hire\n");
        assert_eq!(
            message,
            "This is my portfolio:\n\n[START PORTFOLIO]\nmy cv\n[END PORTFOLIO]\n\n[JOB DESCRIPTION]\nwe hire\n[END JOB DESCRIPTION]"
        );
    }
}
