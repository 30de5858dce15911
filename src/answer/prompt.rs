const ANSWER_INSTRUCTION: &str = "Using the following document parts, answer the question:";

/// Retrieved chunk texts joined by blank lines
#[inline]
pub fn render_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full answer prompt: instruction, context block, transcript so far, then the new question
#[inline]
pub fn build_prompt(context: &str, transcript: &str, query: &str) -> String {
    let history = if transcript.is_empty() {
        String::new()
    } else {
        format!("{transcript}\n")
    };

    format!("{ANSWER_INSTRUCTION}\n\n{context}\n\n{history}User: {query}\nBot:")
}

#[inline]
pub fn follow_up_prompt(answer: &str) -> String {
    format!(
        "Based on this answer, suggest 2-3 concise follow-up questions:\n\n{answer}\n\nList them as bullet points."
    )
}
