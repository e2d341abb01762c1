/// System instruction sent with every analysis request.
pub const ATS_SYSTEM_INSTRUCTION: &str = "You are an expert ATS (Applicant Tracking System) and Career Coach. \
    Analyze the provided resume (PDF) against the job description (text). \
    Provide an extremely accurate and strict assessment. \
    Return the feedback strictly in the requested JSON format.";

/// User prompt template. `{job_description}` is replaced verbatim.
pub const ATS_USER_PROMPT_TEMPLATE: &str = "Analyze the resume against the following Job Description (JD) \
    and provide a structured ATS report. JD: {job_description}";
